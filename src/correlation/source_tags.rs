//! Correlation id to originating-system mapping
//!
//! The drone's completion report does not echo the source tag, so it is
//! remembered here when the command goes out.

use drone_bridge_shared::DEFAULT_SOURCE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTagRecord {
    pub corr_id: String,
    pub source: String,
}

/// Append-only list of source tags, consumed on completion
#[derive(Debug, Default)]
pub struct SourceTagStore {
    records: Vec<SourceTagRecord>,
}

impl SourceTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the source for a correlation. Duplicate ids are kept.
    pub fn record(&mut self, corr_id: impl Into<String>, source: impl Into<String>) {
        self.records.push(SourceTagRecord {
            corr_id: corr_id.into(),
            source: source.into(),
        });
    }

    /// Take the oldest source recorded for `corr_id`, or the default tag
    pub fn consume(&mut self, corr_id: &str) -> String {
        match self.records.iter().position(|r| r.corr_id == corr_id) {
            Some(pos) => self.records.remove(pos).source,
            None => DEFAULT_SOURCE.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
