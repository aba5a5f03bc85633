//! Execution-context tunables: bank size, hit-buffer slack, decoder-array
//! slack, and GC cadence.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecConfig {
    /// Size of a candidate-document bank slab. Must be a power of two.
    pub bank_size: u32,

    /// Extra capacity (beyond what's requested) a `TermHits` buffer grows
    /// by when it needs more room.
    pub hit_buffer_slack: u32,

    /// Extra capacity the decoder/term-hits arrays grow by beyond the
    /// requested TermID when `prepare_decoder` resizes them.
    pub decoder_array_slack: u32,

    /// Bound on the reusable-bank free list before overflow deallocates.
    pub reusable_bank_pool_cap: u32,

    /// Bound on the reusable candidate-document pool before overflow
    /// deallocates.
    pub reusable_cds_pool_cap: u32,

    /// Invoke `gc_retained_docs` after this many matches. This is the only
    /// GC trigger the driver implements; a bank-base-crossing trigger was
    /// considered and dropped, see DESIGN.md.
    pub gc_interval_matches: u32,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            bank_size: 1024,
            hit_buffer_slack: 32,
            decoder_array_slack: 8,
            reusable_bank_pool_cap: 64,
            reusable_cds_pool_cap: 256,
            gc_interval_matches: 256,
        }
    }
}

impl ExecConfig {
    /// Low bit-mask derived from `bank_size`, used to compute a bank's base
    /// (`id & !mask`) and an id's slot within it (`id & mask`).
    pub fn bank_mask(&self) -> u32 {
        debug_assert!(self.bank_size.is_power_of_two());
        self.bank_size - 1
    }
}
