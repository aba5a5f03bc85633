//! In-memory `Segment`/`Decoder` used only by this crate's own tests.
//!
//! Grounded on `motedb::index::text_types::PostingList`: document
//! membership lives in a `RoaringBitmap` (`doc_ids`), positions in a side
//! map keyed by document, same split the original keeps for the same
//! reason: the bitmap compresses the common "no positions needed" case
//! well, while positions stay a plain per-document vector.

use ahash::AHashMap;
use roaring::RoaringBitmap;

use crate::bitmap::DocWordsSpace;
use crate::error::Result;
use crate::segment::{DocId, Hit, Position, Segment, TermContext};
use crate::term::TermId;

struct PostingList {
    doc_ids: RoaringBitmap,
    positions: AHashMap<DocId, Vec<Position>>,
}

impl PostingList {
    fn new() -> Self {
        Self {
            doc_ids: RoaringBitmap::new(),
            positions: AHashMap::new(),
        }
    }

    fn add(&mut self, doc_id: DocId, position: Position) {
        self.doc_ids.insert(doc_id);
        self.positions.entry(doc_id).or_default().push(position);
    }

    fn total_term_freq(&self) -> u64 {
        self.positions.values().map(|p| p.len() as u64).sum()
    }

    /// Snapshot as an ascending `Vec`. `RoaringBitmap` already iterates in
    /// order, so this is just materializing a cursor-friendly copy.
    fn ordered_doc_ids(&self) -> Vec<DocId> {
        self.doc_ids.iter().collect()
    }
}

pub struct MemSegment {
    terms: AHashMap<String, u64>,
    // indexed by segment-native term id (1-based; index 0 unused).
    postings: Vec<PostingList>,
    max_position: u32,
}

impl MemSegment {
    /// Builds a segment from `(doc_id, whitespace-separated text)` pairs.
    /// Tokens are lowercased; positions are 1-based (0 is reserved to mean
    /// "no position").
    pub fn from_docs(docs: &[(u64, &str)]) -> Self {
        let mut terms: AHashMap<String, u64> = AHashMap::new();
        let mut next_id: u64 = 1;
        let mut postings: Vec<PostingList> = vec![PostingList::new()];
        let mut max_position = 0u32;

        for &(doc_id, text) in docs {
            let doc_id = doc_id as DocId;
            for (i, tok) in text.split_whitespace().enumerate() {
                let pos = (i + 1) as Position;
                max_position = max_position.max(pos);
                let tok_lower = tok.to_lowercase();
                let tid = *terms.entry(tok_lower).or_insert_with(|| {
                    let id = next_id;
                    next_id += 1;
                    postings.push(PostingList::new());
                    id
                });
                postings[tid as usize].add(doc_id, pos);
            }
        }

        Self {
            terms,
            postings,
            max_position,
        }
    }
}

impl Segment for MemSegment {
    type Decoder = MemDecoder;

    fn resolve_term(&self, text: &str) -> Option<u64> {
        self.terms.get(&text.to_lowercase()).copied()
    }

    fn term_ctx(&self, segment_term_id: u64) -> TermContext {
        let Some(list) = self.postings.get(segment_term_id as usize) else {
            return TermContext::EMPTY;
        };
        TermContext {
            documents: list.doc_ids.len() as u32,
            total_term_freq: list.total_term_freq(),
        }
    }

    fn new_postings_decoder(&self, segment_term_id: u64) -> Result<MemDecoder> {
        let Some(list) = self.postings.get(segment_term_id as usize) else {
            return Ok(MemDecoder::new(Vec::new(), AHashMap::new()));
        };
        Ok(MemDecoder::new(list.ordered_doc_ids(), list.positions.clone()))
    }

    fn max_indexed_position(&self) -> u32 {
        self.max_position
    }
}

pub struct MemDecoder {
    doc_ids: Vec<DocId>,
    positions: AHashMap<DocId, Vec<Position>>,
    cursor: usize,
    started: bool,
}

impl MemDecoder {
    fn new(doc_ids: Vec<DocId>, positions: AHashMap<DocId, Vec<Position>>) -> Self {
        Self {
            doc_ids,
            positions,
            cursor: 0,
            started: false,
        }
    }
}

impl crate::segment::Decoder for MemDecoder {
    fn begin(&mut self) {
        self.cursor = 0;
        self.started = true;
    }

    fn cur_doc_id(&self) -> DocId {
        self.doc_ids.get(self.cursor).copied().unwrap_or(DocId::MAX)
    }

    fn seek(&mut self, target: DocId) -> bool {
        if !self.started {
            self.begin();
        }
        while self.cursor < self.doc_ids.len() && self.doc_ids[self.cursor] < target {
            self.cursor += 1;
        }
        self.cursor < self.doc_ids.len() && self.doc_ids[self.cursor] == target
    }

    fn next(&mut self) -> bool {
        if !self.started {
            self.begin();
        }
        if self.cursor < self.doc_ids.len() {
            self.cursor += 1;
        }
        self.cursor < self.doc_ids.len()
    }

    fn freq(&self) -> u32 {
        self.doc_ids
            .get(self.cursor)
            .and_then(|d| self.positions.get(d))
            .map(|p| p.len() as u32)
            .unwrap_or(0)
    }

    fn materialize_hits(&mut self, term_id: TermId, bitmap: &mut DocWordsSpace, out: &mut Vec<Hit>) {
        let Some(doc_id) = self.doc_ids.get(self.cursor).copied() else {
            return;
        };
        if let Some(positions) = self.positions.get(&doc_id) {
            for &p in positions {
                out.push(Hit {
                    position: p,
                    payload: 0,
                });
                bitmap.set(term_id, p);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Decoder;

    #[test]
    fn decoder_walks_docs_in_order() {
        let seg = MemSegment::from_docs(&[(5, "a"), (1, "a"), (3, "a")]);
        let tid = seg.resolve_term("a").unwrap();
        let mut decoder = seg.new_postings_decoder(tid).unwrap();
        decoder.begin();
        assert_eq!(decoder.cur_doc_id(), 1);
        assert!(decoder.next());
        assert_eq!(decoder.cur_doc_id(), 3);
        assert!(decoder.next());
        assert_eq!(decoder.cur_doc_id(), 5);
        assert!(!decoder.next());
    }

    #[test]
    fn seek_advances_to_target_or_reports_miss() {
        let seg = MemSegment::from_docs(&[(1, "a"), (5, "a"), (9, "a")]);
        let tid = seg.resolve_term("a").unwrap();
        let mut decoder = seg.new_postings_decoder(tid).unwrap();
        decoder.begin();
        assert!(!decoder.seek(3));
        assert_eq!(decoder.cur_doc_id(), 5);
        assert!(decoder.seek(9));
    }
}
