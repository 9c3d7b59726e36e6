//! Linear rank-decay fusion of ranked result lists.
//!
//! contribution(doc, rank) = weight * (1 - rank / len(list)); contributions
//! for the same id are summed. Ties keep first-seen order.

use std::collections::HashMap;

use passage_core::config::FusionWeights;
use passage_core::Document;

/// One ranked input list and its weight.
pub struct RankedList<'a> {
    pub documents: &'a [Document],
    pub weight: f32,
}

pub fn rank_decay(rank: usize, len: usize, weight: f32) -> f32 {
    if len == 0 {
        return 0.0;
    }
    weight * (1.0 - rank as f32 / len as f32)
}

/// Merge `lists` into one, best first, truncated to `limit`. The fused score
/// replaces each document's own score. The first occurrence of an id is the
/// copy kept.
pub fn fuse(lists: &[RankedList<'_>], limit: usize) -> Vec<Document> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut fused: Vec<(Document, f32)> = Vec::new();

    for list in lists {
        let len = list.documents.len();
        for (rank, doc) in list.documents.iter().enumerate() {
            let contribution = rank_decay(rank, len, list.weight);
            match slots.get(doc.id.as_str()) {
                Some(&slot) => fused[slot].1 += contribution,
                None => {
                    slots.insert(doc.id.as_str(), fused.len());
                    fused.push((doc.clone(), contribution));
                }
            }
        }
    }

    // sort_by is stable, so equal scores stay in first-seen order.
    fused.sort_by(|a, b| b.1.total_cmp(&a.1));
    fused.truncate(limit);
    fused.into_iter().map(|(doc, score)| doc.with_score(score)).collect()
}

/// Semantic list first, keyword list second.
pub fn fuse_hybrid(semantic: &[Document], keyword: &[Document], weights: FusionWeights, limit: usize) -> Vec<Document> {
    fuse(
        &[
            RankedList { documents: semantic, weight: weights.semantic_weight },
            RankedList { documents: keyword, weight: weights.keyword_weight },
        ],
        limit,
    )
}
