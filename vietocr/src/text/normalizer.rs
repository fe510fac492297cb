use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::phrases::PHRASE_CORRECTIONS;
use crate::error::Result;

/// Characters kept by the noise filter: word characters, whitespace, a fixed
/// punctuation set and the Vietnamese vowel/đ repertoire in both cases.
const NOISE_PATTERN: &str = concat!(
    r#"[^\w\s\-.,;:!?()/"'°%&\[\]+"#,
    "áàảãạâấầẩẫậăắằẳẵặéèẻẽẹêếềểễệíìỉĩịóòỏõọôốồổỗộơớờởỡợúùủũụưứừửữựýỳỷỹỵđ",
    "ÁÀẢÃẠÂẤẦẨẪẬĂẮẰẲẴẶÉÈẺẼẸÊẾỀỂỄỆÍÌỈĨỊÓÒỎÕỌÔỐỒỔỖỘƠỚỜỞỠỢÚÙỦŨỤƯỨỪỬỮỰÝỲỶỸỴĐ",
    "]"
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleaningStats {
    pub original_length: usize,
    pub cleaned_length: usize,
    /// `cleaned_length - original_length`. Phrase corrections can lengthen text.
    pub length_delta: i64,
    pub word_count: usize,
    pub line_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleaningResult {
    pub original_text: String,
    pub cleaned_text: String,
    pub applied_steps: Vec<String>,
    pub stats: CleaningStats,
}

#[derive(Debug, Clone)]
struct PhraseRule {
    from: &'static str,
    to: &'static str,
    pattern: Regex,
}

/// Deterministic clean-up of raw OCR output for Vietnamese documents.
///
/// The pipeline never attempts real error correction; it canonicalizes
/// Unicode, strips noise, restores accents on a fixed vocabulary and
/// normalizes dates, ID numbers and phone numbers.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    horizontal_ws: Regex,
    blank_lines: Regex,
    noise: Regex,
    phrases: Vec<PhraseRule>,
    date: Regex,
    id_number: Regex,
    phone: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self> {
        let phrases = PHRASE_CORRECTIONS
            .iter()
            .map(|&(from, to)| {
                Ok(PhraseRule {
                    from,
                    to,
                    pattern: Regex::new(&format!("(?i){}", regex::escape(from)))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            horizontal_ws: Regex::new(r"[^\S\n]+")?,
            blank_lines: Regex::new(r"\n(?:[^\S\n]*\n)+")?,
            noise: Regex::new(NOISE_PATTERN)?,
            phrases,
            date: Regex::new(r"\b(\d{1,2})[./-](\d{1,2})[./-](\d{4})\b")?,
            id_number: Regex::new(
                r"\b(\d{3})[^\S\n]*(\d{3})[^\S\n]*(\d{3})[^\S\n]*(\d{3})\b",
            )?,
            // No look-behind in `regex`: the leading character is captured and
            // written back so a number never starts inside a longer digit run.
            phone: Regex::new(
                r"(^|[^\d+])(\+84|0)[ \t\-]*(\d{2,3})[ \t\-]*(\d{3})[ \t\-]*(\d{3,4})\b",
            )?,
        })
    }

    /// Run the full cleaning pipeline. Total: never fails for any input.
    pub fn clean(&self, text: &str) -> CleaningResult {
        let original_length = text.chars().count();
        let mut steps = Vec::new();

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return CleaningResult {
                original_text: text.to_string(),
                cleaned_text: String::new(),
                applied_steps: steps,
                stats: CleaningStats {
                    original_length,
                    cleaned_length: 0,
                    length_delta: -(original_length as i64),
                    word_count: 0,
                    line_count: 0,
                },
            };
        }
        steps.push("Trimmed surrounding whitespace".to_string());

        let mut cleaned: String = trimmed.nfc().collect();
        steps.push("Unicode NFC normalization applied".to_string());

        cleaned = self.collapse_whitespace(&cleaned);
        steps.push("Normalized whitespace and blank lines".to_string());

        cleaned = self.noise.replace_all(&cleaned, " ").into_owned();
        steps.push("Removed noise characters".to_string());

        for rule in &self.phrases {
            if rule.pattern.is_match(&cleaned) {
                cleaned = rule
                    .pattern
                    .replace_all(&cleaned, NoExpand(rule.to))
                    .into_owned();
                steps.push(format!("Fixed: '{}' → '{}'", rule.from, rule.to));
            }
        }

        cleaned = self.date.replace_all(&cleaned, "${1}/${2}/${3}").into_owned();
        steps.push("Date formats normalized".to_string());

        cleaned = self
            .id_number
            .replace_all(&cleaned, "${1}${2}${3}${4}")
            .into_owned();
        cleaned = self
            .phone
            .replace_all(&cleaned, "${1}${2}${3}${4}${5}")
            .into_owned();
        steps.push("ID and phone number formats normalized".to_string());

        cleaned = self.final_cleanup(&cleaned);
        steps.push("Final whitespace cleanup".to_string());

        let cleaned_length = cleaned.chars().count();
        let stats = CleaningStats {
            original_length,
            cleaned_length,
            length_delta: cleaned_length as i64 - original_length as i64,
            word_count: cleaned.split_whitespace().count(),
            line_count: cleaned.lines().count(),
        };

        CleaningResult {
            original_text: text.to_string(),
            cleaned_text: cleaned,
            applied_steps: steps,
            stats,
        }
    }

    fn collapse_whitespace(&self, text: &str) -> String {
        let spaced = self.horizontal_ws.replace_all(text, " ");
        self.blank_lines.replace_all(&spaced, "\n").into_owned()
    }

    fn final_cleanup(&self, text: &str) -> String {
        text.lines()
            .map(|line| self.horizontal_ws.replace_all(line, " ").trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
