//! Position bitmap (`DocWordsSpace`): tracks which `(TermId, position)`
//! pairs are set for whichever document is "current".
//!
//! Reset needs to be O(1) per document rather than zeroing a few kilobytes
//! of storage every time, so a cell holds the generation it was last `set`
//! in and `test` compares it against the space's current generation.
//! `reset` just bumps the generation, no cell is ever cleared.
//!
//! Rows are grown lazily per `TermId`, mirroring the slack-growth pattern
//! `TermRegistry` uses for its own arrays.

use crate::segment::Position;
use crate::term::TermId;

pub struct DocWordsSpace {
    /// `rows[term_id][position] == generation` means `(term_id, position)`
    /// is set for the current document.
    rows: Vec<Vec<u64>>,
    /// Width of each row: bounded by the segment's `max_indexed_position`.
    stride: usize,
    generation: u64,
}

impl DocWordsSpace {
    pub fn new(max_indexed_position: u32) -> Self {
        Self {
            rows: Vec::new(),
            stride: max_indexed_position as usize + 1,
            generation: 1,
        }
    }

    /// Logically clears the bitmap for a new document. O(1): no cell
    /// storage is touched, only the generation counter advances.
    pub fn reset(&mut self, _doc_id: crate::segment::DocId) {
        self.generation += 1;
    }

    pub fn set(&mut self, term_id: TermId, position: Position) {
        let pos = position as usize;
        if pos >= self.stride {
            return;
        }
        self.ensure_row(term_id);
        self.rows[term_id as usize][pos] = self.generation;
    }

    pub fn test(&self, term_id: TermId, position: Position) -> bool {
        let pos = position as usize;
        self.rows
            .get(term_id as usize)
            .and_then(|row| row.get(pos))
            .is_some_and(|&gen| gen == self.generation)
    }

    fn ensure_row(&mut self, term_id: TermId) {
        let idx = term_id as usize;
        if self.rows.len() <= idx {
            self.rows.resize_with(idx + 1, Vec::new);
        }
        if self.rows[idx].is_empty() {
            self.rows[idx] = vec![0u64; self.stride];
        }
    }
}
