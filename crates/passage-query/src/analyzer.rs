//! Query analysis: language, entities, keywords, complexity and intent.
//!
//! Each extraction step sits behind a small trait so a real language-ID or
//! NER model can replace the heuristics without touching callers.

use serde::{Deserialize, Serialize};

use passage_core::{Error, Result};

use crate::lexicon::{self, HONORIFICS, LOCATION_SUFFIXES, ORGANIZATION_SUFFIXES};

pub const ENTITY_CONFIDENCE: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Language {
    Chinese,
    English,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Person,
    Organization,
    Location,
    Number,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub entity_type: EntityType,
    /// In `[0, 1]`.
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub text: String,
    /// In `(0, 1]`; shorter tokens score higher.
    pub importance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Search,
    Question,
    Summary,
    Comparison,
    Explanation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub language: Language,
    pub entities: Vec<Entity>,
    pub keywords: Vec<Keyword>,
    pub complexity: Complexity,
    pub intent: Intent,
    pub has_stop_words: bool,
    pub needs_stemming: bool,
    pub can_expand_synonyms: bool,
    pub needs_rewriting: bool,
}

impl QueryAnalysis {
    pub fn has_keywords(&self) -> bool { !self.keywords.is_empty() }
}

pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Language;
}

pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str, language: Language) -> Vec<Entity>;
}

pub trait KeywordExtractor: Send + Sync {
    fn extract(&self, text: &str, language: Language) -> Vec<Keyword>;
}

/// Any CJK code point means Chinese, otherwise any other letter means English.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptLanguageDetector;

impl LanguageDetector for ScriptLanguageDetector {
    fn detect(&self, text: &str) -> Language {
        if text.chars().any(lexicon::is_cjk) {
            Language::Chinese
        } else if text.chars().any(|c| c.is_alphabetic() && !lexicon::is_cjk(c)) {
            Language::English
        } else {
            Language::Unknown
        }
    }
}

/// Capitalised Latin tokens longer than two characters, and CJK tokens with an
/// organisation or place suffix.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicEntityExtractor;

impl HeuristicEntityExtractor {
    fn is_entity(word: &str) -> bool {
        let len = word.chars().count();
        let capitalised = len > 2 && word.chars().next().is_some_and(char::is_uppercase);
        let cjk_suffixed = word.chars().any(lexicon::is_cjk)
            && ORGANIZATION_SUFFIXES.iter().chain(LOCATION_SUFFIXES).any(|s| word.ends_with(s) && len > s.chars().count());
        capitalised || cjk_suffixed
    }

    fn entity_type(word: &str, previous: Option<&str>) -> EntityType {
        if word.chars().any(|c| c.is_ascii_digit()) {
            EntityType::Number
        } else if ORGANIZATION_SUFFIXES.iter().any(|s| word.ends_with(s)) {
            EntityType::Organization
        } else if word.chars().any(lexicon::is_cjk) && LOCATION_SUFFIXES.iter().any(|s| word.ends_with(s)) {
            EntityType::Location
        } else if previous.is_some_and(|p| HONORIFICS.contains(&p.to_lowercase().as_str())) {
            EntityType::Person
        } else {
            EntityType::General
        }
    }
}

impl EntityExtractor for HeuristicEntityExtractor {
    fn extract(&self, text: &str, _language: Language) -> Vec<Entity> {
        let mut entities: Vec<Entity> = Vec::new();
        let mut previous: Option<&str> = None;
        for token in text.split_whitespace() {
            let word = lexicon::core(token);
            if Self::is_entity(word) && !entities.iter().any(|e| e.text == word) {
                entities.push(Entity {
                    text: word.to_string(),
                    entity_type: Self::entity_type(word, previous),
                    confidence: ENTITY_CONFIDENCE,
                });
            }
            previous = Some(word);
        }
        entities
    }
}

/// Tokens longer than two characters that are not stop words.
#[derive(Debug, Default, Clone, Copy)]
pub struct StopWordKeywordExtractor;

impl KeywordExtractor for StopWordKeywordExtractor {
    fn extract(&self, text: &str, language: Language) -> Vec<Keyword> {
        let mut keywords: Vec<Keyword> = Vec::new();
        for token in text.split_whitespace() {
            let word = lexicon::core(token);
            let len = word.chars().count();
            if len > 2 && !lexicon::is_stop_word(word, language) && !keywords.iter().any(|k| k.text == word) {
                keywords.push(Keyword { text: word.to_string(), importance: keyword_importance(len) });
            }
        }
        keywords
    }
}

pub fn keyword_importance(len: usize) -> f32 {
    1.0 / (1.0 + 0.1 * len as f32)
}

pub fn assess_complexity(text: &str, entities: &[Entity], keywords: &[Keyword]) -> Complexity {
    let score = text.chars().count() + 10 * entities.len() + 5 * keywords.len();
    if score > 100 {
        Complexity::High
    } else if score > 50 {
        Complexity::Medium
    } else {
        Complexity::Low
    }
}

pub fn classify_intent(text: &str) -> Intent {
    let lower = text.trim().to_lowercase();
    let first = lower.split_whitespace().next().map(lexicon::core).unwrap_or("");
    if contains_any(&lower, &["compare", " vs ", " vs. ", "versus", "difference between", "比較", "比较"]) {
        Intent::Comparison
    } else if contains_any(&lower, &["summarize", "summarise", "summary", "overview", "總結", "总结", "摘要"]) {
        Intent::Summary
    } else if contains_any(&lower, &["explain", "why ", "how does", "how do", "解釋", "解释", "為什麼", "为什么"]) {
        Intent::Explanation
    } else if lower.ends_with('?')
        || lower.ends_with('？')
        || matches!(first, "what" | "who" | "when" | "where" | "which" | "is" | "are" | "can" | "does" | "do" | "how")
        || contains_any(&lower, &["嗎", "吗", "什麼", "什么"])
    {
        Intent::Question
    } else {
        Intent::Search
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn needs_rewriting(text: &str) -> bool {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed != text || collapsed.ends_with(['?', '!', '.', '？', '！', '。'])
}

pub struct QueryAnalyzer {
    language: Box<dyn LanguageDetector>,
    entities: Box<dyn EntityExtractor>,
    keywords: Box<dyn KeywordExtractor>,
}

impl Default for QueryAnalyzer {
    fn default() -> Self {
        Self {
            language: Box::new(ScriptLanguageDetector),
            entities: Box::new(HeuristicEntityExtractor),
            keywords: Box::new(StopWordKeywordExtractor),
        }
    }
}

impl QueryAnalyzer {
    pub fn new() -> Self { Self::default() }

    pub fn with_language_detector(mut self, detector: impl LanguageDetector + 'static) -> Self {
        self.language = Box::new(detector);
        self
    }

    pub fn with_entity_extractor(mut self, extractor: impl EntityExtractor + 'static) -> Self {
        self.entities = Box::new(extractor);
        self
    }

    pub fn with_keyword_extractor(mut self, extractor: impl KeywordExtractor + 'static) -> Self {
        self.keywords = Box::new(extractor);
        self
    }

    pub fn detect_language(&self, text: &str) -> Language { self.language.detect(text) }

    pub fn extract_entities(&self, text: &str) -> Vec<Entity> {
        self.entities.extract(text, self.detect_language(text))
    }

    pub fn extract_keywords(&self, text: &str) -> Vec<Keyword> {
        self.keywords.extract(text, self.detect_language(text))
    }

    pub fn analyze(&self, text: &str) -> Result<QueryAnalysis> {
        if text.trim().is_empty() {
            return Err(Error::Input("query text is empty".to_string()));
        }
        let language = self.language.detect(text);
        let entities = self.entities.extract(text, language);
        let keywords = self.keywords.extract(text, language);
        let complexity = assess_complexity(text, &entities, &keywords);
        let has_stop_words = text.split_whitespace().any(|t| lexicon::is_stop_word(lexicon::core(t), language));
        let needs_stemming = language == Language::English
            && keywords.iter().any(|k| lexicon::stem(&k.text).to_lowercase() != k.text.to_lowercase());
        let analysis = QueryAnalysis {
            language,
            can_expand_synonyms: !keywords.is_empty(),
            entities,
            keywords,
            complexity,
            intent: classify_intent(text),
            has_stop_words,
            needs_stemming,
            needs_rewriting: needs_rewriting(text),
        };
        tracing::debug!(
            language = ?analysis.language,
            complexity = ?analysis.complexity,
            intent = ?analysis.intent,
            entities = analysis.entities.len(),
            keywords = analysis.keywords.len(),
            "analyzed query"
        );
        Ok(analysis)
    }
}
