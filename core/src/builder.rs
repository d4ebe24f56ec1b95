use crate::index::{Field, IndexSnapshot, Posting, Record, RecordId};
use crate::tokenizer::tokenize;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use time::OffsetDateTime;

/// Build an immutable snapshot from a batch of records.
///
/// An empty batch yields [`IndexSnapshot::empty`]. A repeated record id keeps the first
/// record and ignores the rest.
pub fn build(records: Vec<Record>) -> IndexSnapshot {
    if records.is_empty() {
        return IndexSnapshot::empty();
    }
    let start = Instant::now();
    let source_record_count = records.len();

    let mut terms: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
    let mut by_id: HashMap<RecordId, Record> = HashMap::with_capacity(records.len());

    for record in records {
        if by_id.contains_key(&record.id) {
            tracing::warn!(id = %record.id, "duplicate record id, keeping first");
            continue;
        }
        let mut tf: HashMap<(String, Field), u32> = HashMap::new();
        for term in tokenize(&record.title) {
            *tf.entry((term, Field::Title)).or_insert(0) += 1;
        }
        for term in tokenize(&record.author) {
            *tf.entry((term, Field::Author)).or_insert(0) += 1;
        }
        // all genres of a record share one posting per term
        for genre in &record.genres {
            for term in tokenize(genre) {
                *tf.entry((term, Field::Genre)).or_insert(0) += 1;
            }
        }
        for ((term, field), term_frequency) in tf {
            terms.entry(term).or_default().push(Posting {
                record_id: record.id.clone(),
                field,
                field_weight: field.weight(),
                term_frequency,
            });
        }
        by_id.insert(record.id.clone(), record);
    }

    for postings in terms.values_mut() {
        postings.sort_by(|a, b| a.record_id.cmp(&b.record_id).then(a.field.cmp(&b.field)));
    }

    let build_duration = start.elapsed();
    tracing::debug!(records = by_id.len(), terms = terms.len(), ?build_duration, "snapshot built");
    IndexSnapshot {
        terms,
        records: by_id,
        source_record_count,
        built_at: Instant::now(),
        built_at_utc: OffsetDateTime::now_utc(),
        build_duration,
    }
}
