//! passage-query
//!
//! Query analysis (language, entities, keywords, complexity, intent) and the
//! optimizer that turns an analysis into an executable `OptimizedQuery`.

pub mod analyzer;
pub mod lexicon;
pub mod optimizer;

pub use analyzer::{Complexity, Entity, EntityType, Intent, Keyword, Language, QueryAnalysis, QueryAnalyzer};
pub use optimizer::{select_strategy, QueryOptimizer};
