//! Fixed per-language word lists and token helpers.

use rust_stemmers::{Algorithm, Stemmer};

use crate::analyzer::Language;

pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it", "its", "of",
    "on", "that", "the", "to", "was", "will", "with", "or", "but", "not", "this", "these", "they", "them",
    "their", "there", "then", "than", "so", "if", "when", "where", "why", "how", "what", "which", "who",
    "whom", "whose", "can", "could", "should", "would", "may", "might", "must", "shall", "do", "does", "did",
    "have", "had", "having", "i", "me", "my", "we", "our", "you", "your", "about", "into", "any", "all",
];

pub const CHINESE_STOP_WORDS: &[&str] = &[
    "的", "是", "在", "有", "和", "與", "或", "但", "如果", "因為", "与", "因为", "了", "吗", "嗎", "呢", "什么", "什麼",
];

pub const ORGANIZATION_SUFFIXES: &[&str] = &["公司", "集團", "集团", "銀行", "银行", "大學", "大学", "Corp", "Inc", "Ltd"];

pub const LOCATION_SUFFIXES: &[&str] = &["市", "省", "縣", "县", "國", "国", "區", "区"];

pub const HONORIFICS: &[&str] = &["mr", "mrs", "ms", "dr", "prof"];

pub fn is_stop_word(word: &str, language: Language) -> bool {
    let lower = word.to_lowercase();
    let english = || ENGLISH_STOP_WORDS.contains(&lower.as_str());
    let chinese = || CHINESE_STOP_WORDS.contains(&lower.as_str());
    match language {
        Language::English => english(),
        Language::Chinese => chinese() || english(),
        Language::Unknown => chinese() || english(),
    }
}

pub fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4e00}'..='\u{9fff}' | '\u{3400}'..='\u{4dbf}' | '\u{f900}'..='\u{faff}')
}

/// Strip leading and trailing punctuation from a whitespace-delimited token.
pub fn core(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Split a token into `(leading punctuation, core, trailing punctuation)`.
pub fn split_token(token: &str) -> (&str, &str, &str) {
    let start = token.find(|c: char| c.is_alphanumeric()).unwrap_or(token.len());
    let end = token
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(start);
    (&token[..start], &token[start..end], &token[end..])
}

/// Snowball English stem, lower-cased. Tokens that are not plain ASCII words
/// come back unchanged.
pub fn stem(word: &str) -> String {
    if word.is_empty() || !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return word.to_string();
    }
    let stemmer = Stemmer::create(Algorithm::English);
    stemmer.stem(&word.to_lowercase()).into_owned()
}
