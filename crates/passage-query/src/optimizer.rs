use std::collections::HashMap;

use passage_core::config::RetrievalSettings;
use passage_core::types::{Query, Strategy};
use passage_core::{OptimizedQuery, Result};

use crate::analyzer::{Complexity, Language, QueryAnalysis};
use crate::lexicon;

/// Turns an analysed query into an executable, strategy-tagged one.
#[derive(Debug, Clone, Default)]
pub struct QueryOptimizer {
    settings: RetrievalSettings,
    synonyms: HashMap<String, Vec<String>>,
}

impl QueryOptimizer {
    pub fn new(settings: RetrievalSettings) -> Self {
        Self { settings, synonyms: HashMap::new() }
    }

    /// Synonym table keyed by lower-case word.
    pub fn with_synonyms(mut self, synonyms: HashMap<String, Vec<String>>) -> Self {
        self.synonyms = synonyms.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect();
        self
    }

    pub fn optimize(&self, query: &Query, analysis: &QueryAnalysis) -> Result<OptimizedQuery> {
        let optimized_text = self.optimize_text(&query.text, analysis);
        let strategy = select_strategy(analysis);
        let threshold = query.similarity_threshold.unwrap_or(self.settings.similarity_threshold);
        let optimized = OptimizedQuery::new(query.text.clone(), optimized_text, strategy)?
            .with_filters(query.filters.clone())
            .with_result_limit(query.limit.unwrap_or(self.settings.default_limit))
            .with_similarity_threshold(threshold)?;
        tracing::debug!(
            query_id = query.label(),
            strategy = %optimized.strategy(),
            limit = optimized.result_limit(),
            text = optimized.optimized_text(),
            "optimized query"
        );
        Ok(optimized)
    }

    /// Stop-word removal, stemming, synonym expansion, rewriting, in that
    /// order; each step runs only when the analysis asks for it. A step that
    /// would leave nothing keeps its input.
    pub fn optimize_text(&self, text: &str, analysis: &QueryAnalysis) -> String {
        let mut optimized = text.to_string();
        if analysis.has_stop_words {
            optimized = non_empty_or(remove_stop_words(&optimized, analysis.language), optimized);
        }
        if analysis.needs_stemming {
            optimized = non_empty_or(apply_stemming(&optimized, analysis.language), optimized);
        }
        if analysis.can_expand_synonyms {
            optimized = self.expand_synonyms(&optimized);
        }
        if analysis.needs_rewriting {
            optimized = non_empty_or(rewrite(&optimized), optimized);
        }
        optimized
    }

    fn expand_synonyms(&self, text: &str) -> String {
        if self.synonyms.is_empty() {
            return text.to_string();
        }
        let mut present: Vec<String> = text.split_whitespace().map(|t| lexicon::core(t).to_lowercase()).collect();
        let mut additions = Vec::new();
        for word in present.clone() {
            for synonym in self.synonyms.get(&word).into_iter().flatten() {
                let lower = synonym.to_lowercase();
                if !present.contains(&lower) {
                    present.push(lower);
                    additions.push(synonym.clone());
                }
            }
        }
        if additions.is_empty() {
            text.to_string()
        } else {
            format!("{} {}", text.trim_end(), additions.join(" "))
        }
    }
}

/// HIGH complexity goes hybrid, keyword-bearing queries go lexical, the rest semantic.
pub fn select_strategy(analysis: &QueryAnalysis) -> Strategy {
    if analysis.complexity == Complexity::High {
        Strategy::Hybrid
    } else if analysis.has_keywords() {
        Strategy::Keyword
    } else {
        Strategy::Semantic
    }
}

fn non_empty_or(candidate: String, fallback: String) -> String {
    if candidate.trim().is_empty() { fallback } else { candidate }
}

fn remove_stop_words(text: &str, language: Language) -> String {
    text.split_whitespace()
        .filter(|t| !lexicon::is_stop_word(lexicon::core(t), language))
        .collect::<Vec<_>>()
        .join(" ")
}

fn apply_stemming(text: &str, language: Language) -> String {
    if language != Language::English {
        return text.to_string();
    }
    text.split_whitespace()
        .map(|t| {
            let (lead, core, trail) = lexicon::split_token(t);
            format!("{lead}{}{trail}", lexicon::stem(core))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn rewrite(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_end_matches(['?', '!', '.', '？', '！', '。']).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::QueryAnalyzer;
    use passage_core::types::Filters;

    fn run(optimizer: &QueryOptimizer, query: &Query) -> OptimizedQuery {
        let analysis = QueryAnalyzer::new().analyze(&query.text).expect("analysis");
        optimizer.optimize(query, &analysis).expect("optimized")
    }

    #[test]
    fn return_policy_question_goes_lexical() {
        let q = run(&QueryOptimizer::default(), &Query::new("What is the return policy?"));
        assert_eq!(q.optimized_text(), "return polici");
        assert_eq!(q.original_text(), "What is the return policy?");
        assert_eq!(q.strategy(), Strategy::Keyword);
        assert_eq!(q.result_limit(), 10);
        assert!((q.similarity_threshold() - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn limits_are_clamped() {
        let optimizer = QueryOptimizer::default();
        assert_eq!(run(&optimizer, &Query::new("refund policy").with_limit(500)).result_limit(), 100);
        assert_eq!(run(&optimizer, &Query::new("refund policy").with_limit(0)).result_limit(), 1);
    }

    #[test]
    fn threshold_override_is_validated() {
        let optimizer = QueryOptimizer::default();
        let q = run(&optimizer, &Query::new("refund").with_similarity_threshold(0.4));
        assert!((q.similarity_threshold() - 0.4).abs() < f32::EPSILON);
        let analysis = QueryAnalyzer::new().analyze("refund").expect("analysis");
        assert!(optimizer.optimize(&Query::new("refund").with_similarity_threshold(2.0), &analysis).is_err());
    }

    #[test]
    fn long_queries_go_hybrid_and_short_ones_semantic() {
        let long = "Compare the warranty coverage for Acme Corp laptops purchased in Berlin with the coverage offered for tablets";
        assert_eq!(run(&QueryOptimizer::default(), &Query::new(long)).strategy(), Strategy::Hybrid);
        assert_eq!(run(&QueryOptimizer::default(), &Query::new("is it ok")).strategy(), Strategy::Semantic);
    }

    #[test]
    fn stems_and_expands_synonyms() {
        let synonyms = HashMap::from([("refund".to_string(), vec!["reimbursement".to_string(), "Refund".to_string()])]);
        let optimizer = QueryOptimizer::default().with_synonyms(synonyms);
        let q = run(&optimizer, &Query::new("refunded orders"));
        assert_eq!(q.optimized_text(), "refund order reimbursement");
    }

    #[test]
    fn inflected_words_are_stemmed() {
        let q = run(&QueryOptimizer::default(), &Query::new("shipping times"));
        assert_eq!(q.optimized_text(), "ship time");
        assert_eq!(q.strategy(), Strategy::Keyword);
    }

    #[test]
    fn all_stop_words_keep_the_original_text() {
        let q = run(&QueryOptimizer::default(), &Query::new("what is it"));
        assert_eq!(q.optimized_text(), "what is it");
    }

    #[test]
    fn filters_pass_through() {
        let mut filters = Filters::new();
        filters.insert("type".into(), serde_json::json!("policy"));
        let q = run(&QueryOptimizer::default(), &Query::new("refund window").with_filters(filters.clone()));
        assert_eq!(q.filters(), &filters);
    }
}
