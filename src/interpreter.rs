//! Interpreter: the opcode dispatcher that evaluates one compiled query
//! against one candidate document.

use crate::bitmap::DocWordsSpace;
use crate::compiler::{CompiledQuery, ExecNode, Opcode, PhraseCtx};
use crate::config::ExecConfig;
use crate::segment::{DocId, Segment};
use crate::term::{TermId, TermRegistry};

/// Evaluates `node` against the document `doc_id` is currently positioned
/// on. Short-circuits left-to-right exactly like the source AST, which is
/// what lets the optimizer meaningfully place the cheaper child on the LHS.
pub fn eval<S: Segment>(
    node: ExecNode,
    doc_id: DocId,
    compiled: &CompiledQuery,
    registry: &mut TermRegistry<S>,
    bitmap: &mut DocWordsSpace,
    config: &ExecConfig,
) -> bool {
    match node.opcode {
        Opcode::MatchToken => {
            let token = &compiled.tokens[node.ctx_idx as usize];
            match_token(token.term_id, doc_id, registry)
        }
        Opcode::MatchPhrase => {
            let phrase = &compiled.phrases[node.ctx_idx as usize];
            match_phrase(phrase, doc_id, registry, bitmap, config)
        }
        Opcode::LogicalAnd => {
            let ctx = &compiled.binops[node.ctx_idx as usize];
            eval(ctx.lhs, doc_id, compiled, registry, bitmap, config)
                && eval(ctx.rhs, doc_id, compiled, registry, bitmap, config)
        }
        Opcode::LogicalOr => {
            let ctx = &compiled.binops[node.ctx_idx as usize];
            eval(ctx.lhs, doc_id, compiled, registry, bitmap, config)
                || eval(ctx.rhs, doc_id, compiled, registry, bitmap, config)
        }
        Opcode::LogicalNot => {
            let ctx = &compiled.binops[node.ctx_idx as usize];
            eval(ctx.lhs, doc_id, compiled, registry, bitmap, config)
                && !eval(ctx.rhs, doc_id, compiled, registry, bitmap, config)
        }
        // Rather than assert these are normalized away before execution,
        // they're wired to their semantically correct behavior so a
        // compiled query is still evaluable even if a future optimizer
        // pass stops stripping them.
        Opcode::UnaryAnd => {
            let ctx = &compiled.unaryops[node.ctx_idx as usize];
            eval(ctx.expr, doc_id, compiled, registry, bitmap, config)
        }
        Opcode::UnaryNot => {
            let ctx = &compiled.unaryops[node.ctx_idx as usize];
            !eval(ctx.expr, doc_id, compiled, registry, bitmap, config)
        }
        Opcode::ConstFalse => false,
    }
}

fn match_token<S: Segment>(term_id: TermId, doc_id: DocId, registry: &mut TermRegistry<S>) -> bool {
    if term_id == 0 {
        return false;
    }
    match registry.decoder_mut(term_id) {
        Some(decoder) => decoder.seek(doc_id),
        None => false,
    }
}

/// Phrase matching: all member terms must occur in the document, and some
/// position `p > 0` of the first term must be followed by each subsequent
/// term at `p + i`.
fn match_phrase<S: Segment>(
    phrase: &PhraseCtx,
    doc_id: DocId,
    registry: &mut TermRegistry<S>,
    bitmap: &mut DocWordsSpace,
    config: &ExecConfig,
) -> bool {
    for &term_id in &phrase.term_ids {
        if term_id == 0 {
            return false;
        }
        match registry.decoder_mut(term_id) {
            Some(decoder) if decoder.seek(doc_id) => {}
            _ => return false,
        }
    }

    for &term_id in &phrase.term_ids[1..] {
        materialize_term(term_id, doc_id, registry, bitmap, config);
    }
    let first = phrase.term_ids[0];
    materialize_term(first, doc_id, registry, bitmap, config);

    for hit in &registry.hits(first).all {
        let p = hit.position;
        if p == 0 {
            continue;
        }
        let all_follow = phrase.term_ids[1..]
            .iter()
            .enumerate()
            .all(|(i, &term_id)| bitmap.test(term_id, p + (i as u32 + 1)));
        if all_follow {
            return true;
        }
    }
    false
}

/// Materializes one term's positions for `doc_id` into the bitmap and its
/// `TermHits` buffer, unless they're already materialized for this document.
pub(crate) fn materialize_term<S: Segment>(
    term_id: TermId,
    doc_id: DocId,
    registry: &mut TermRegistry<S>,
    bitmap: &mut DocWordsSpace,
    config: &ExecConfig,
) {
    if registry.hits(term_id).holds(doc_id) {
        return;
    }
    let (decoder, hits) = registry.decoder_and_hits_mut(term_id);
    let freq = decoder.as_ref().map(|d| d.freq()).unwrap_or(0);
    hits.begin_materialize(doc_id, freq, config.hit_buffer_slack);
    if let Some(decoder) = decoder {
        decoder.materialize_hits(term_id, bitmap, &mut hits.all);
    }
}
