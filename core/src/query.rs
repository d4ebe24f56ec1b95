use crate::index::{IndexSnapshot, Posting, RecordId};
use crate::tokenizer::tokenize_unique;
use serde::Serialize;
use std::collections::HashMap;

/// Weight applied to postings reached through prefix expansion instead of an exact term.
pub const PREFIX_MULTIPLIER: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredId {
    pub record_id: RecordId,
    pub score: f32,
}

fn contribution(p: &Posting, multiplier: f32) -> f32 {
    p.field_weight * (1.0 + p.term_frequency as f32).ln() * multiplier
}

/// Rank records in `snapshot` against `query_text`.
///
/// Each query term adds `field_weight * ln(1 + tf)` per matching posting. A term with no
/// exact postings is expanded to every indexed term it prefixes, at [`PREFIX_MULTIPLIER`].
/// Ties on score resolve by ascending record id.
pub fn query(snapshot: &IndexSnapshot, query_text: &str, limit: usize) -> Vec<ScoredId> {
    let terms = tokenize_unique(query_text);
    if terms.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut scores: HashMap<&RecordId, f32> = HashMap::new();
    for term in &terms {
        let exact = snapshot.postings(term);
        if !exact.is_empty() {
            for p in exact {
                *scores.entry(&p.record_id).or_insert(0.0) += contribution(p, 1.0);
            }
            continue;
        }
        for (_, postings) in snapshot.terms_with_prefix(term) {
            for p in postings {
                *scores.entry(&p.record_id).or_insert(0.0) += contribution(p, PREFIX_MULTIPLIER);
            }
        }
    }

    let mut scored: Vec<ScoredId> = scores
        .into_iter()
        .map(|(id, score)| ScoredId { record_id: id.clone(), score })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.record_id.cmp(&b.record_id)));
    scored.truncate(limit);
    tracing::debug!(terms = terms.len(), hits = scored.len(), "index query");
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::index::{Record, SourceType};

    fn ids(hits: &[ScoredId]) -> Vec<&str> {
        hits.iter().map(|h| h.record_id.as_str()).collect()
    }

    fn catalog() -> IndexSnapshot {
        build(vec![
            Record::new(1u64, "Dragon Sky", "An", &["fantasy"], SourceType::Primary),
            Record::new(2u64, "Dragon Moon", "Bao", &["fantasy", "romance"], SourceType::Primary),
            Record::new(3u64, "Quiet Harbor", "Dragon Lee", &["drama"], SourceType::Primary),
            Record::new(4u64, "Harbor Lights", "Chi", &["dragon"], SourceType::Primary),
        ])
    }

    #[test]
    fn field_weight_orders_title_author_genre() {
        let hits = query(&catalog(), "dragon", 10);
        assert_eq!(ids(&hits), vec!["1", "2", "3", "4"]);
        assert!(hits[1].score > hits[2].score);
        assert!(hits[2].score > hits[3].score);
    }

    #[test]
    fn more_matching_terms_rank_higher() {
        let hits = query(&catalog(), "dragon moon", 10);
        assert_eq!(hits[0].record_id.as_str(), "2");
    }

    #[test]
    fn prefix_fallback_is_discounted() {
        let snap = catalog();
        let exact = query(&snap, "harbor", 10);
        let partial = query(&snap, "harb", 10);
        assert_eq!(ids(&exact), ids(&partial));
        assert!((partial[0].score - exact[0].score * PREFIX_MULTIPLIER).abs() < 1e-6);
    }

    #[test]
    fn empty_and_punctuation_queries_return_nothing() {
        let snap = catalog();
        assert!(query(&snap, "", 10).is_empty());
        assert!(query(&snap, "  !!! ", 10).is_empty());
        assert!(query(&snap, "dragon", 0).is_empty());
    }

    #[test]
    fn respects_limit() {
        assert_eq!(query(&catalog(), "dragon", 2).len(), 2);
    }
}
