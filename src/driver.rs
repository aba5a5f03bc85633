//! Leader-merge driver: the main loop that discovers candidate documents by
//! merge-walking the leader decoders' postings lists, evaluates the
//! compiled expression at each one, and runs the match collector on hits.
//!
//! Grounded on `exec.cpp`'s process loop: find the minimum current document
//! across the leader set in one pass, evaluate, advance every decoder tied
//! for the minimum, and drop any that exhausts. The leader array shrinks
//! monotonically until empty.

use crate::ast::AstNode;
use crate::bank::Banks;
use crate::bitmap::DocWordsSpace;
use crate::collector::{collect_matches, MatchedTerm};
use crate::compiler::CompiledQuery;
use crate::config::ExecConfig;
use crate::error::Result;
use crate::interpreter::eval;
use crate::segment::{DocId, MaskedDocuments, Segment};
use crate::term::{TermId, TermRegistry};

/// Resolves `root`'s leader token texts to deduplicated, decoder-primed
/// `TermId`s. Terms that fail to resolve are dropped silently. An
/// optimized AST shouldn't have any left (they'd have folded the enclosing
/// subtree to `ConstFalse`), but a leader list built from an unoptimized
/// tree could still hit one.
pub fn leader_term_ids<S: Segment>(root: &AstNode, registry: &mut TermRegistry<S>) -> Result<Vec<TermId>> {
    let mut ids: Vec<TermId> = crate::ast::leader_nodes(root)
        .iter()
        .map(|text| registry.resolve_term(text))
        .filter(|&id| id != 0)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    for &id in &ids {
        registry.prepare_decoder(id)?;
    }
    Ok(ids)
}

/// Runs the merge loop to completion, invoking `on_match(doc_id,
/// matched_terms, registry)` for every document the compiled expression
/// accepts, in strictly ascending `doc_id` order. `registry` is handed back
/// to the callback (read-only) so a scorer can read `registry.hits(term_id)`
/// for each matched term while the document is still current; the hit
/// buffers are reused for the next candidate document as soon as the
/// callback returns.
pub fn run<S: Segment, M: MaskedDocuments>(
    compiled: &CompiledQuery,
    mut leaders: Vec<TermId>,
    registry: &mut TermRegistry<S>,
    bitmap: &mut DocWordsSpace,
    banks: &mut Banks,
    masked: &M,
    config: &ExecConfig,
    mut on_match: impl FnMut(DocId, &[MatchedTerm], &TermRegistry<S>),
) {
    let mut matches_since_gc: u32 = 0;
    let mut matched_terms = Vec::new();

    while !leaders.is_empty() {
        let mut doc_id = DocId::MAX;
        for &term_id in &leaders {
            let cur = registry.decoder_mut(term_id).expect("leader term must have a decoder").cur_doc_id();
            if cur < doc_id {
                doc_id = cur;
            }
        }

        let mut to_advance = Vec::with_capacity(leaders.len());
        for (i, &term_id) in leaders.iter().enumerate() {
            if registry.decoder_mut(term_id).unwrap().cur_doc_id() == doc_id {
                to_advance.push(i);
            }
        }

        if !masked.contains(doc_id) {
            bitmap.reset(doc_id);
            if eval(compiled.root, doc_id, compiled, registry, bitmap, config) {
                matched_terms.clear();
                let doc = banks.touch(doc_id);
                collect_matches(
                    compiled.root,
                    doc_id,
                    compiled,
                    registry,
                    bitmap,
                    config,
                    doc,
                    &mut matched_terms,
                );
                on_match(doc_id, &matched_terms, registry);

                matches_since_gc += 1;
                if matches_since_gc >= config.gc_interval_matches {
                    banks.gc_retained_docs(doc_id);
                    matches_since_gc = 0;
                }
            }
        }

        for &i in to_advance.iter().rev() {
            let term_id = leaders[i];
            let exhausted = !registry.decoder_mut(term_id).unwrap().next();
            if exhausted {
                leaders.remove(i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstNode;
    use crate::compiler::compile;
    use crate::optimizer::optimize;
    use crate::segment::NoMaskedDocuments;
    use crate::testkit::MemSegment;

    fn setup(docs: &[(u64, &str)]) -> MemSegment {
        MemSegment::from_docs(docs)
    }

    #[test]
    fn visits_and_query_in_ascending_order() {
        let seg = setup(&[(1, "a"), (2, "b"), (3, "a b"), (4, "b"), (5, "a")]);
        let mut reg = TermRegistry::new(&seg, ExecConfig::default());
        let cfg = ExecConfig::default();
        let optimized = optimize(AstNode::and(AstNode::token("a"), AstNode::token("b")), &mut reg).unwrap();
        let leaders = leader_term_ids(&optimized, &mut reg).unwrap();
        let compiled = compile(&optimized, &mut reg).unwrap();
        let mut bitmap = DocWordsSpace::new(seg.max_indexed_position());
        let mut banks = Banks::new(cfg);
        let masked = NoMaskedDocuments;

        let mut hits = Vec::new();
        run(&compiled, leaders, &mut reg, &mut bitmap, &mut banks, &masked, &cfg, |doc_id, _, _| {
            hits.push(doc_id);
        });
        assert_eq!(hits, vec![3]);
    }

    #[test]
    fn visits_or_query_in_ascending_order() {
        let seg = setup(&[(1, "a"), (2, "b"), (3, "a b"), (4, "b"), (5, "a")]);
        let mut reg = TermRegistry::new(&seg, ExecConfig::default());
        let cfg = ExecConfig::default();
        let optimized = optimize(AstNode::or(AstNode::token("a"), AstNode::token("b")), &mut reg).unwrap();
        let leaders = leader_term_ids(&optimized, &mut reg).unwrap();
        let compiled = compile(&optimized, &mut reg).unwrap();
        let mut bitmap = DocWordsSpace::new(seg.max_indexed_position());
        let mut banks = Banks::new(cfg);
        let masked = NoMaskedDocuments;

        let mut hits = Vec::new();
        run(&compiled, leaders, &mut reg, &mut bitmap, &mut banks, &masked, &cfg, |doc_id, _, _| {
            hits.push(doc_id);
        });
        assert_eq!(hits, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn masked_documents_are_skipped() {
        struct MaskThree;
        impl MaskedDocuments for MaskThree {
            fn contains(&self, doc_id: DocId) -> bool {
                doc_id == 3
            }
        }

        let seg = setup(&[(1, "a"), (2, "b"), (3, "a b"), (4, "b"), (5, "a")]);
        let mut reg = TermRegistry::new(&seg, ExecConfig::default());
        let cfg = ExecConfig::default();
        let optimized = optimize(AstNode::or(AstNode::token("a"), AstNode::token("b")), &mut reg).unwrap();
        let leaders = leader_term_ids(&optimized, &mut reg).unwrap();
        let compiled = compile(&optimized, &mut reg).unwrap();
        let mut bitmap = DocWordsSpace::new(seg.max_indexed_position());
        let mut banks = Banks::new(cfg);
        let masked = MaskThree;

        let mut hits = Vec::new();
        run(&compiled, leaders, &mut reg, &mut bitmap, &mut banks, &masked, &cfg, |doc_id, _, _| {
            hits.push(doc_id);
        });
        assert_eq!(hits, vec![1, 2, 4, 5]);
    }

    #[test]
    fn leader_array_shrinks_as_decoders_exhaust() {
        let seg = setup(&[(1, "a"), (5, "a b"), (9, "a"), (3, "b"), (7, "b")]);
        let mut reg = TermRegistry::new(&seg, ExecConfig::default());
        let cfg = ExecConfig::default();
        let optimized = optimize(AstNode::or(AstNode::token("a"), AstNode::token("b")), &mut reg).unwrap();
        let leaders = leader_term_ids(&optimized, &mut reg).unwrap();
        let compiled = compile(&optimized, &mut reg).unwrap();
        let mut bitmap = DocWordsSpace::new(seg.max_indexed_position());
        let mut banks = Banks::new(cfg);
        let masked = NoMaskedDocuments;

        let mut hits = Vec::new();
        run(&compiled, leaders, &mut reg, &mut bitmap, &mut banks, &masked, &cfg, |doc_id, _, _| {
            hits.push(doc_id);
        });
        assert_eq!(hits, vec![1, 3, 5, 7, 9]);
    }
}
