//! `TermHits`: the growable per-term hit buffer materialized lazily by the
//! interpreter and the match collector.

use crate::segment::{DocId, Hit};

/// Buffer of `{position, payload}` records for one term, tagged with the
/// document those records currently describe. `doc_id == Some(d)` means the
/// buffer currently holds all positions of that term in doc `d`.
#[derive(Debug, Clone, Default)]
pub struct TermHits {
    pub all: Vec<Hit>,
    pub freq: u32,
    doc_id: Option<DocId>,
}

impl TermHits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this buffer already holds `doc_id`'s positions, so
    /// re-materialization can be skipped.
    pub fn holds(&self, doc_id: DocId) -> bool {
        self.doc_id == Some(doc_id)
    }

    /// Begin materializing a new document: clears prior contents and grows
    /// `all`'s capacity (with the configured slack) if `freq` won't fit in
    /// what's already allocated.
    pub fn begin_materialize(&mut self, doc_id: DocId, freq: u32, slack: u32) {
        self.all.clear();
        self.freq = freq;
        if self.all.capacity() < freq as usize {
            let target = freq as usize + slack as usize;
            self.all.reserve(target - self.all.capacity());
        }
        self.doc_id = Some(doc_id);
    }

    /// Marks the buffer as stale without deallocating; used when a decoder
    /// is recreated (capacity reused, identity forgotten).
    pub fn invalidate(&mut self) {
        self.doc_id = None;
    }
}
