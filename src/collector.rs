//! Match collector: after the interpreter reports a document matches, walks
//! the compiled tree a second time to work out exactly which terms
//! contributed, since `eval`'s short-circuiting doesn't retain that on its
//! own.
//!
//! Traversal is type-directed over `ExecNode`'s opcode, mirroring the shape
//! of the original iterator-tree walk (Conjunction/Disjunction/Phrase/
//! Optional/Filter) but over this crate's flatter opcode set: `LogicalAnd`
//! and `UnaryAnd` descend unconditionally (both/the one operand must have
//! matched for the parent to be true), `LogicalOr` only descends into
//! children that independently evaluate true, `LogicalNot`/`UnaryNot` only
//! descend their positive side, and `MatchToken`/`MatchPhrase` are the
//! leaves that actually emit.

use std::rc::Rc;

use crate::bank::CandidateDocument;
use crate::bitmap::DocWordsSpace;
use crate::compiler::{CompiledQuery, ExecNode, Opcode};
use crate::config::ExecConfig;
use crate::interpreter::{eval, materialize_term};
use crate::segment::{DocId, Segment};
use crate::term::{TermId, TermRegistry};

/// One term's contribution to a match, ready for a scoring callback.
/// `term_id` indexes into the `TermRegistry` the driver hands to `on_match`
/// alongside this list, so a scorer calls `registry.hits(term_id)` to read
/// the matched positions without this struct carrying its own copy.
#[derive(Debug, Clone)]
pub struct MatchedTerm {
    pub rep: Rc<str>,
    pub index: u16,
    pub term_id: TermId,
}

/// Collects every term contributing to `doc_id`'s match into `out`, in
/// depth-first tree order. `doc` carries the current-round dedup state so a
/// term referenced from more than one branch (e.g. both sides of an `OR`,
/// or the same word appearing in two phrases) is only recorded once.
pub fn collect_matches<S: Segment>(
    node: ExecNode,
    doc_id: DocId,
    compiled: &CompiledQuery,
    registry: &mut TermRegistry<S>,
    bitmap: &mut DocWordsSpace,
    config: &ExecConfig,
    doc: &mut CandidateDocument,
    out: &mut Vec<MatchedTerm>,
) {
    match node.opcode {
        Opcode::MatchToken => {
            let token = &compiled.tokens[node.ctx_idx as usize];
            record_term(
                token.term_id,
                Rc::clone(&token.rep),
                token.index,
                compiled,
                doc_id,
                registry,
                bitmap,
                config,
                doc,
                out,
            );
        }
        Opcode::MatchPhrase => {
            let phrase = &compiled.phrases[node.ctx_idx as usize];
            for &term_id in &phrase.term_ids {
                record_term(
                    term_id,
                    Rc::clone(&phrase.rep),
                    phrase.index,
                    compiled,
                    doc_id,
                    registry,
                    bitmap,
                    config,
                    doc,
                    out,
                );
            }
        }
        Opcode::LogicalAnd | Opcode::LogicalNot => {
            let ctx = &compiled.binops[node.ctx_idx as usize];
            collect_matches(ctx.lhs, doc_id, compiled, registry, bitmap, config, doc, out);
            if node.opcode == Opcode::LogicalAnd {
                collect_matches(ctx.rhs, doc_id, compiled, registry, bitmap, config, doc, out);
            }
        }
        Opcode::LogicalOr => {
            let ctx = &compiled.binops[node.ctx_idx as usize];
            if eval(ctx.lhs, doc_id, compiled, registry, bitmap, config) {
                collect_matches(ctx.lhs, doc_id, compiled, registry, bitmap, config, doc, out);
            }
            if eval(ctx.rhs, doc_id, compiled, registry, bitmap, config) {
                collect_matches(ctx.rhs, doc_id, compiled, registry, bitmap, config, doc, out);
            }
        }
        Opcode::UnaryAnd => {
            let ctx = &compiled.unaryops[node.ctx_idx as usize];
            collect_matches(ctx.expr, doc_id, compiled, registry, bitmap, config, doc, out);
        }
        Opcode::UnaryNot | Opcode::ConstFalse => {}
    }
}

#[allow(clippy::too_many_arguments)]
fn record_term<S: Segment>(
    term_id: TermId,
    rep: Rc<str>,
    index: u16,
    compiled: &CompiledQuery,
    doc_id: DocId,
    registry: &mut TermRegistry<S>,
    bitmap: &mut DocWordsSpace,
    config: &ExecConfig,
    doc: &mut CandidateDocument,
    out: &mut Vec<MatchedTerm>,
) {
    if term_id == 0 || !compiled.positive_term_ids.contains(&term_id) {
        return;
    }
    if doc.is_captured(term_id) {
        return;
    }
    doc.mark_captured(term_id);
    materialize_term(term_id, doc_id, registry, bitmap, config);
    out.push(MatchedTerm { rep, index, term_id });
}
