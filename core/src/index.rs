use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::{Duration, Instant};
use time::OffsetDateTime;

/// Record key, unique within its source type.
///
/// Accepts integer or string ids on input. Decimal ids compare numerically so that
/// `2 < 10`, and all of them sort before non-decimal ids, which compare as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "RawId")]
pub struct RecordId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(u64),
    Str(String),
}

impl From<RawId> for RecordId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Int(n) => RecordId(n.to_string()),
            RawId::Str(s) => RecordId(s),
        }
    }
}

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self { RecordId(id.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
    fn numeric(&self) -> Option<u64> {
        // u64::from_str also takes a leading '+'
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.0.parse().ok()
    }

    fn sort_key(&self) -> (bool, Option<u64>, &str) {
        let n = self.numeric();
        (n.is_none(), n, &self.0)
    }
}

impl From<u64> for RecordId {
    fn from(n: u64) -> Self { RecordId(n.to_string()) }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self { RecordId(s.to_string()) }
}

impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Catalog partition a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Primary,
    Licensed,
    Ebook,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceType::Primary => "primary",
            SourceType::Licensed => "licensed",
            SourceType::Ebook => "ebook",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub purchase_links: Vec<String>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, title: &str, author: &str, genres: &[&str], source_type: SourceType) -> Self {
        Record {
            id: id.into(),
            title: title.to_string(),
            author: author.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            source_type,
            purchase_links: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Author,
    Genre,
}

impl Field {
    /// Static field importance: title > author > genre.
    pub fn weight(self) -> f32 {
        match self {
            Field::Title => 3.0,
            Field::Author => 2.0,
            Field::Genre => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub record_id: RecordId,
    pub field: Field,
    pub field_weight: f32,
    pub term_frequency: u32,
}

/// Immutable inverted index over one batch of records.
///
/// Terms live in a `BTreeMap` so prefix lookups are a range scan.
#[derive(Debug)]
pub struct IndexSnapshot {
    pub(crate) terms: BTreeMap<String, Vec<Posting>>,
    pub(crate) records: HashMap<RecordId, Record>,
    pub(crate) source_record_count: usize,
    pub(crate) built_at: Instant,
    pub(crate) built_at_utc: OffsetDateTime,
    pub(crate) build_duration: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub records: usize,
    pub source_records: usize,
    pub terms: usize,
    pub postings: usize,
    pub built_at: String,
    pub build_millis: u128,
}

impl IndexSnapshot {
    /// The snapshot of an empty catalog: valid, zero terms.
    pub fn empty() -> Self {
        IndexSnapshot {
            terms: BTreeMap::new(),
            records: HashMap::new(),
            source_record_count: 0,
            built_at: Instant::now(),
            built_at_utc: OffsetDateTime::now_utc(),
            build_duration: Duration::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.terms.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Indexed terms starting with `prefix`, in term order.
    pub fn terms_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a String, &'a Vec<Posting>)> + 'a {
        self.terms
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(move |(term, _)| term.starts_with(prefix))
    }

    pub fn record(&self, id: &RecordId) -> Option<&Record> { self.records.get(id) }
    pub fn record_count(&self) -> usize { self.records.len() }
    pub fn term_count(&self) -> usize { self.terms.len() }
    pub fn source_record_count(&self) -> usize { self.source_record_count }
    pub fn built_at(&self) -> Instant { self.built_at }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            records: self.records.len(),
            source_records: self.source_record_count,
            terms: self.terms.len(),
            postings: self.terms.values().map(Vec::len).sum(),
            built_at: self
                .built_at_utc
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            build_millis: self.build_duration.as_millis(),
        }
    }
}
