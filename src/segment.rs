//! External collaborators: the segment/postings codec and the
//! masked-documents registry. Both are out of scope for this crate; what's
//! defined here is the boundary the execution core is written against, plus
//! the small data records (`TermContext`, `Hit`) that cross that boundary.

use crate::error::Result;

/// A document identifier as assigned by the segment. The execution core
/// treats this as an opaque, totally-ordered key.
pub type DocId = u32;

/// A position within a document, 1-based. Position 0 is reserved to mean
/// "no position".
pub type Position = u32;

/// Immutable per-term facts the segment supplies. Opaque beyond
/// `documents`, which the cost estimator reads directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermContext {
    /// Document frequency: number of documents containing the term.
    pub documents: u32,
    /// Sum of term frequencies across all documents.
    pub total_term_freq: u64,
}

impl TermContext {
    pub const EMPTY: TermContext = TermContext {
        documents: 0,
        total_term_freq: 0,
    };
}

/// One `{position, payload}` record as written by `materialize_hits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub position: Position,
    pub payload: u32,
}

/// A stateful forward cursor over one term's postings list.
///
/// Implementations are free to back this however the segment likes
/// (mmap'd, in-memory, whatever). The execution core only ever calls the
/// methods below, always in increasing-`docID` order.
pub trait Decoder {
    /// Position at the first document. Called once, before the leader-merge
    /// loop starts consuming this decoder.
    fn begin(&mut self);

    /// The document the cursor currently sits on. Undefined before `begin`.
    fn cur_doc_id(&self) -> DocId;

    /// Advance the cursor to `target` if it isn't already there or past it.
    /// Returns whether the cursor now sits exactly on `target`.
    fn seek(&mut self, target: DocId) -> bool;

    /// Advance to the next document. Returns `false` if the postings list
    /// is exhausted (the cursor's position is then undefined).
    fn next(&mut self) -> bool;

    /// Hit count for the current document.
    fn freq(&self) -> u32;

    /// Write every `{position, payload}` record for the current document
    /// into `out`, and flip the corresponding bits in `bitmap`. `term_id`
    /// identifies this decoder's term for bitmap keys.
    fn materialize_hits(&mut self, term_id: crate::term::TermId, bitmap: &mut crate::bitmap::DocWordsSpace, out: &mut Vec<Hit>);
}

/// The segment/postings codec.
pub trait Segment {
    type Decoder: Decoder;

    /// Resolve query text to the segment's own term-ID space. `None` if the
    /// term is entirely absent from the segment's dictionary.
    fn resolve_term(&self, text: &str) -> Option<u64>;

    /// Look up the facts needed for cost estimation and decoder
    /// construction.
    fn term_ctx(&self, segment_term_id: u64) -> TermContext;

    /// Build a fresh decoder for a term. Never called for a term whose
    /// `TermContext.documents == 0`.
    fn new_postings_decoder(&self, segment_term_id: u64) -> Result<Self::Decoder>;

    /// Upper bound on position values this segment ever indexes, used to
    /// size the position bitmap.
    fn max_indexed_position(&self) -> u32;
}

/// Read-only predicate over masked (e.g. soft-deleted, ACL-excluded)
/// documents.
pub trait MaskedDocuments {
    fn contains(&self, doc_id: DocId) -> bool;
}

/// A registry that masks nothing, the default when the caller has no
/// masked-document set to apply.
pub struct NoMaskedDocuments;

impl MaskedDocuments for NoMaskedDocuments {
    fn contains(&self, _doc_id: DocId) -> bool {
        false
    }
}
