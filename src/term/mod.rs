mod hits;
mod registry;

pub use hits::TermHits;
pub use registry::TermRegistry;

/// Dense, query-local term identifier. `0` means "term absent from
/// segment", never a valid index into the decoder/hits arrays.
pub type TermId = u16;

pub const UNRESOLVED: TermId = 0;
