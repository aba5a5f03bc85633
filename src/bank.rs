//! Candidate-document banks: per-document scratch (currently just the
//! match-collector's capture dedup state) indexed by a power-of-two slab of
//! the document's low ID bits, with pooled banks and candidate documents so
//! a long-running query doesn't allocate on every match.
//!
//! Grounded on `queryexec_ctx.cpp`'s `docstracker_bank` / `candidate_document`
//! / `tracked_docrefs` trio: `bank_for(id)` by `base = id & !mask`, a
//! `reusableBanks` free list, and a `gc_retained_docs` trim that walks
//! `tracked_docrefs` from the back then the front since entries near either
//! end are the ones most likely to have fallen behind the advancing base.
//!
//! `document_by_id` and `track_docref` are two separate calls upstream
//! because an iterator tree can look up the same document from several
//! PostingsListIterator call sites before anything commits to tracking it.
//! This crate's per-term dedup state lives in `TermRegistry`/`TermHits`
//! instead of on the candidate document, so there's exactly one call site
//! that needs a `CandidateDocument` at all, the driver, once per matched
//! document, right before running the match collector, so `touch` folds
//! both operations into one.

use ahash::AHashMap;

use crate::config::ExecConfig;
use crate::segment::DocId;
use crate::term::TermId;
use crate::trace::{trace_bank_access, trace_docrefs, trace_document_by_id};

/// Per-document scratch for the match collector: which term IDs have
/// already been recorded as contributing to this document's matches.
///
/// `captured[term_id] == cur_doc_seq` means "already recorded this round".
/// Bumping `cur_doc_seq` instead of clearing `captured` makes starting a new
/// round O(1); only a `u16` wraparound forces an actual clear.
pub struct CandidateDocument {
    pub id: DocId,
    cur_doc_seq: u16,
    captured: Vec<u16>,
}

impl CandidateDocument {
    fn new(id: DocId) -> Self {
        Self {
            id,
            cur_doc_seq: 0,
            captured: Vec::new(),
        }
    }

    fn reset_for(&mut self, id: DocId) {
        self.id = id;
        if self.cur_doc_seq == u16::MAX {
            self.captured.iter_mut().for_each(|c| *c = 0);
            self.cur_doc_seq = 1;
        } else {
            self.cur_doc_seq += 1;
        }
    }

    pub fn is_captured(&self, term_id: TermId) -> bool {
        self.captured.get(term_id as usize).copied() == Some(self.cur_doc_seq)
    }

    pub fn mark_captured(&mut self, term_id: TermId) {
        let idx = term_id as usize;
        if self.captured.len() <= idx {
            self.captured.resize(idx + 1, 0);
        }
        self.captured[idx] = self.cur_doc_seq;
    }
}

struct Bank {
    base: DocId,
    slots: Vec<Option<CandidateDocument>>,
    set_count: u32,
}

impl Bank {
    fn new(base: DocId, size: usize) -> Self {
        let mut slots = Vec::with_capacity(size);
        slots.resize_with(size, || None);
        Self {
            base,
            slots,
            set_count: 0,
        }
    }

    fn clear_for(&mut self, base: DocId) {
        self.base = base;
        self.set_count = 0;
        for slot in &mut self.slots {
            *slot = None;
        }
    }
}

pub struct Banks {
    bank_size: u32,
    bank_mask: u32,
    banks: AHashMap<DocId, Bank>,
    reusable_banks: Vec<Bank>,
    reusable_cds: Vec<CandidateDocument>,
    tracked: Vec<DocId>,
    config: ExecConfig,
}

impl Banks {
    pub fn new(config: ExecConfig) -> Self {
        Self {
            bank_size: config.bank_size,
            bank_mask: config.bank_mask(),
            banks: AHashMap::new(),
            reusable_banks: Vec::new(),
            reusable_cds: Vec::new(),
            tracked: Vec::new(),
            config,
        }
    }

    fn base_of(&self, id: DocId) -> DocId {
        id & !self.bank_mask
    }

    fn ensure_bank(&mut self, base: DocId) {
        if self.banks.contains_key(&base) {
            return;
        }
        let bank = self
            .reusable_banks
            .pop()
            .map(|mut b| {
                b.clear_for(base);
                b
            })
            .unwrap_or_else(|| Bank::new(base, self.bank_size as usize));
        trace_bank_access!("allocated bank base={}", base);
        self.banks.insert(base, bank);
    }

    /// Returns the candidate document tracked for `id`, creating and
    /// registering it on first sight. Always bumps the document's
    /// generation stamp, so collector dedup state starts fresh for every
    /// call, so callers that want the same round's state across repeated
    /// calls shouldn't call `touch` twice for one document.
    pub fn touch(&mut self, id: DocId) -> &mut CandidateDocument {
        let base = self.base_of(id);
        self.ensure_bank(base);
        let idx = (id - base) as usize;
        let bank = self.banks.get_mut(&base).expect("ensure_bank just inserted it");
        trace_document_by_id!("document_by_id id={}", id);

        if bank.slots[idx].is_none() {
            let mut doc = self.reusable_cds.pop().unwrap_or_else(|| CandidateDocument::new(id));
            doc.reset_for(id);
            bank.slots[idx] = Some(doc);
            bank.set_count += 1;
            self.tracked.push(id);
            trace_docrefs!("tracked docref id={}, tracked_count={}", id, self.tracked.len());
        } else {
            bank.slots[idx].as_mut().unwrap().reset_for(id);
        }
        trace_bank_access!("touched document id={}", id);
        bank.slots[idx].as_mut().unwrap()
    }

    /// Releases every tracked document with `id < base`. Scans from the
    /// back of `tracked` then the front. The driver's access pattern is
    /// near-monotonic in `id`, so stale entries tend to cluster at both
    /// ends rather than the middle, and a full sort isn't worth the cost.
    pub fn gc_retained_docs(&mut self, base: DocId) {
        let mut cnt = self.tracked.len();
        let mut released = Vec::new();

        while cnt > 0 && base > self.tracked[cnt - 1] {
            released.push(self.tracked[cnt - 1]);
            cnt -= 1;
        }

        let mut n = 0;
        while n < cnt && base > self.tracked[n] {
            released.push(self.tracked[n]);
            n += 1;
        }

        self.tracked.truncate(cnt);
        if n > 0 {
            self.tracked.drain(0..n);
        }

        trace_docrefs!("releasing docrefs below base={}, count={}", base, released.len());
        for id in released {
            self.release(id);
        }
    }

    fn release(&mut self, id: DocId) {
        let base = self.base_of(id);
        let Some(bank) = self.banks.get_mut(&base) else {
            return;
        };
        let idx = (id - base) as usize;
        if let Some(doc) = bank.slots[idx].take() {
            bank.set_count -= 1;
            if (self.reusable_cds.len() as u32) < self.config.reusable_cds_pool_cap {
                self.reusable_cds.push(doc);
            }
        }
        if bank.set_count == 0 {
            if let Some(bank) = self.banks.remove(&base) {
                if (self.reusable_banks.len() as u32) < self.config.reusable_bank_pool_cap {
                    self.reusable_banks.push(bank);
                }
            }
        }
    }
}
