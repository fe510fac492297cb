/// Unaccented renderings that OCR engines commonly produce for Vietnamese
/// identity-document vocabulary, paired with the correctly accented form.
///
/// Matching is case-insensitive and literal. Entries are applied top to
/// bottom, so longer phrases that contain shorter ones must come first.
pub const PHRASE_CORRECTIONS: &[(&str, &str)] = &[
    // Government headers
    (
        "CONG HOA XA HOI CHU NGHIA VIET NAM",
        "CỘNG HÒA XÃ HỘI CHỦ NGHĨA VIỆT NAM",
    ),
    ("Doc lap - Tu do - Hanh phuc", "Độc lập - Tự do - Hạnh phúc"),
    ("Doc lap Tu do Hanh phuc", "Độc lập - Tự do - Hạnh phúc"),
    ("CAN CUOC CONG DAN", "CĂN CƯỚC CÔNG DÂN"),
    ("CHUNG MINH NHAN DAN", "CHỨNG MINH NHÂN DÂN"),
    // Form labels
    ("Ho va ten", "Họ và tên"),
    ("Ngay sinh", "Ngày sinh"),
    ("Gioi tinh", "Giới tính"),
    ("Quoc tich", "Quốc tịch"),
    ("Que quan", "Quê quán"),
    ("Noi thuong tru", "Nơi thường trú"),
    ("Noi cap", "Nơi cấp"),
    ("Ngay cap", "Ngày cấp"),
    ("Co giai han den", "Có giá trị đến"),
    ("Co gia tri den", "Có giá trị đến"),
    // Places
    ("Ha Noi", "Hà Nội"),
    ("Ho Chi Minh", "Hồ Chí Minh"),
    ("Da Nang", "Đà Nẵng"),
    ("Hai Phong", "Hải Phòng"),
    ("Can Tho", "Cần Thơ"),
    ("Nam Tu Liem", "Nam Từ Liêm"),
    ("Cau Giay", "Cầu Giấy"),
    ("Dong Da", "Đống Đa"),
    ("Ba Dinh", "Ba Đình"),
    ("Hoan Kiem", "Hoàn Kiếm"),
    ("Viet Nam", "Việt Nam"),
];
