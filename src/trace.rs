//! Compile-time trace flags: `false` by default, flip to `true` locally
//! while debugging. Call sites additionally go through `tracing` so a
//! consumer can get the same visibility at runtime via a subscriber filter
//! without a rebuild.

pub(crate) const TRACE_DOCUMENT_BY_ID: bool = false;
pub(crate) const TRACE_DOCREFS: bool = false;
pub(crate) const TRACE_BANK_ACCESS: bool = false;

macro_rules! trace_document_by_id {
    ($($arg:tt)*) => {
        if $crate::trace::TRACE_DOCUMENT_BY_ID {
            tracing::trace!($($arg)*);
        }
    };
}

macro_rules! trace_docrefs {
    ($($arg:tt)*) => {
        if $crate::trace::TRACE_DOCREFS {
            tracing::trace!($($arg)*);
        }
    };
}

macro_rules! trace_bank_access {
    ($($arg:tt)*) => {
        if $crate::trace::TRACE_BANK_ACCESS {
            tracing::trace!($($arg)*);
        }
    };
}

pub(crate) use trace_bank_access;
pub(crate) use trace_docrefs;
pub(crate) use trace_document_by_id;
