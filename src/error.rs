//! Error types for the query execution core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryExecError>;

#[derive(Error, Debug)]
pub enum QueryExecError {
    /// The parsed AST contained a `Dummy` node or `Operator::None` reaching
    /// the compiler. Programming error, not a runtime condition.
    #[error("malformed query AST: {0}")]
    MalformedAst(String),

    /// A growable buffer (hit buffer, decoder/term-hits arrays) failed to
    /// grow. No recovery path; the query is abandoned.
    #[error("buffer allocation failed: {0}")]
    BufferAllocation(String),

    /// The segment collaborator (decoder construction, term lookup, ...)
    /// reported a failure. Opaque to this crate beyond the message.
    #[error("segment error: {0}")]
    Segment(String),
}
