//! Term registry and decoder cache: interns query term text to dense
//! `TermId`s and caches the decoder/hit-buffer state built on top of them.
//!
//! Grounded on `motedb::index::text_dictionary::ChunkedDictionary`'s
//! `get_or_insert` interning pattern, simplified: this dictionary is
//! query-local and lives only for the duration of one compiled query, so
//! there's no chunking or persistence, just a dense `TermId -> ...` array
//! the way the original's `termsDict` side tables work.

use ahash::AHashMap;
use std::rc::Rc;

use crate::config::ExecConfig;
use crate::error::Result;
use crate::segment::{Segment, TermContext};
use crate::term::hits::TermHits;
use crate::term::TermId;

pub struct TermRegistry<'seg, S: Segment> {
    segment: &'seg S,
    config: ExecConfig,
    dict: AHashMap<Rc<str>, TermId>,
    /// Strings already known not to resolve, so repeated references in one
    /// query don't re-query the segment.
    unresolved: AHashMap<Rc<str>, ()>,
    segment_ids: Vec<Option<u64>>,
    contexts: Vec<Option<TermContext>>,
    decoders: Vec<Option<S::Decoder>>,
    hits: Vec<Option<TermHits>>,
}

impl<'seg, S: Segment> TermRegistry<'seg, S> {
    pub fn new(segment: &'seg S, config: ExecConfig) -> Self {
        Self {
            segment,
            config,
            dict: AHashMap::new(),
            unresolved: AHashMap::new(),
            // index 0 reserved for TermId 0 (unresolvable sentinel).
            segment_ids: vec![None],
            contexts: vec![None],
            decoders: Vec::new(),
            hits: Vec::new(),
        }
    }

    /// Interns `text`, assigning a fresh `TermId` on first sight. Returns
    /// `0` if the term is absent from the segment's dictionary.
    pub fn resolve_term(&mut self, text: &str) -> TermId {
        if let Some(&id) = self.dict.get(text) {
            return id;
        }
        if self.unresolved.contains_key(text) {
            return 0;
        }

        let Some(seg_id) = self.segment.resolve_term(text) else {
            self.unresolved.insert(Rc::from(text), ());
            return 0;
        };
        let ctx = self.segment.term_ctx(seg_id);
        if ctx.documents == 0 {
            self.unresolved.insert(Rc::from(text), ());
            return 0;
        }

        let id = (self.dict.len() + 1) as TermId;
        let key: Rc<str> = Rc::from(text);
        self.dict.insert(key, id);
        self.ensure_capacity(id as usize);
        self.segment_ids[id as usize] = Some(seg_id);
        self.contexts[id as usize] = Some(ctx);
        id
    }

    /// The term's document frequency, or `u32::MAX` for the unresolvable
    /// sentinel.
    pub fn cost(&self, term_id: TermId) -> u32 {
        if term_id == 0 {
            return u32::MAX;
        }
        self.contexts
            .get(term_id as usize)
            .and_then(|c| *c)
            .map(|c| c.documents)
            .unwrap_or(u32::MAX)
    }

    /// Grows the decoder/hit-buffer arrays if needed and lazily builds a
    /// decoder + empty `TermHits` for `term_id`. No-op for the unresolvable
    /// sentinel.
    pub fn prepare_decoder(&mut self, term_id: TermId) -> Result<()> {
        if term_id == 0 {
            return Ok(());
        }
        self.ensure_capacity(term_id as usize);
        let idx = term_id as usize;
        if self.decoders[idx].is_none() {
            let seg_id = self.segment_ids[idx].expect("resolved term must carry a segment id");
            let mut decoder = self.segment.new_postings_decoder(seg_id)?;
            decoder.begin();
            self.decoders[idx] = Some(decoder);
            self.hits[idx] = Some(TermHits::new());
        }
        Ok(())
    }

    pub fn decoder_mut(&mut self, term_id: TermId) -> Option<&mut S::Decoder> {
        self.decoders.get_mut(term_id as usize)?.as_mut()
    }

    pub fn hits(&self, term_id: TermId) -> &TermHits {
        self.hits[term_id as usize]
            .as_ref()
            .expect("prepare_decoder must run before hits() is read")
    }

    pub fn hits_mut(&mut self, term_id: TermId) -> &mut TermHits {
        self.hits[term_id as usize]
            .as_mut()
            .expect("prepare_decoder must run before hits_mut() is read")
    }

    /// Splits the decoder and hit-buffer borrows so the interpreter can
    /// seek one term's decoder while writing into a *different* term's hit
    /// buffer (phrase matching needs exactly this).
    pub fn decoder_and_hits_mut(
        &mut self,
        term_id: TermId,
    ) -> (Option<&mut S::Decoder>, &mut TermHits) {
        let idx = term_id as usize;
        let decoder = self.decoders[idx].as_mut();
        let hits = self.hits[idx]
            .as_mut()
            .expect("prepare_decoder must run before decoder_and_hits_mut() is read");
        (decoder, hits)
    }

    fn ensure_capacity(&mut self, min_len: usize) {
        if self.segment_ids.len() <= min_len {
            let new_len = min_len + self.config.decoder_array_slack as usize + 1;
            self.segment_ids.resize(new_len, None);
            self.contexts.resize(new_len, None);
            self.decoders.resize_with(new_len, || None);
            self.hits.resize_with(new_len, || None);
        }
    }
}
