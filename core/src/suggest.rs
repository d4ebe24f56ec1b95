use crate::index::{IndexSnapshot, RecordId};
use crate::tokenizer::tokenize;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
struct Candidate<'a> {
    matched: HashSet<&'a str>,
    frequency: u32,
}

/// Title completions for a partially typed query.
///
/// The last term of `prefix_text` is treated as incomplete and matched by prefix; every
/// earlier term must match exactly. Titles rank by number of matched terms, then total
/// term frequency, then title text.
pub fn suggest(snapshot: &IndexSnapshot, prefix_text: &str, limit: usize) -> Vec<String> {
    let mut terms = tokenize(prefix_text);
    let active = match terms.pop() {
        Some(t) if limit > 0 => t,
        _ => return Vec::new(),
    };
    let mut seen = HashSet::new();
    terms.retain(|t| seen.insert(t.clone()));

    let mut candidates: HashMap<&RecordId, Candidate> = HashMap::new();
    for (term, postings) in snapshot.terms_with_prefix(&active) {
        for p in postings {
            let c = candidates.entry(&p.record_id).or_default();
            c.matched.insert(term.as_str());
            c.frequency += p.term_frequency;
        }
    }

    for filter in &terms {
        let mut holders: HashMap<&RecordId, u32> = HashMap::new();
        for p in snapshot.postings(filter) {
            *holders.entry(&p.record_id).or_insert(0) += p.term_frequency;
        }
        candidates.retain(|id, c| match holders.get(id) {
            Some(tf) => {
                c.matched.insert(filter.as_str());
                c.frequency += tf;
                true
            }
            None => false,
        });
        if candidates.is_empty() {
            return Vec::new();
        }
    }

    let mut ranked: Vec<(usize, u32, &str, &RecordId)> = candidates
        .iter()
        .filter_map(|(id, c)| snapshot.record(id).map(|r| (c.matched.len(), c.frequency, r.title.as_str(), *id)))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)).then(a.2.cmp(b.2)).then(a.3.cmp(b.3)));

    let mut titles = HashSet::new();
    ranked
        .into_iter()
        .filter(|(_, _, title, _)| titles.insert(*title))
        .take(limit)
        .map(|(_, _, title, _)| title.to_string())
        .collect()
}
