//! Top-level entry point: owns everything a query needs (term registry,
//! position bitmap, candidate-document banks) and wires optimize → compile
//! → leader-merge driver into one call.

use crate::ast::AstNode;
use crate::bank::Banks;
use crate::bitmap::DocWordsSpace;
use crate::collector::MatchedTerm;
use crate::compiler::compile;
use crate::config::ExecConfig;
use crate::driver::{leader_term_ids, run};
use crate::error::Result;
use crate::optimizer::optimize;
use crate::segment::{DocId, MaskedDocuments, Segment};
use crate::term::TermRegistry;

/// All mutable state for one query against one segment. Not `Send`/`Sync`
/// by design. A query is evaluated by exactly one thread; querying
/// multiple segments concurrently means one `ExecutionContext` per segment.
pub struct ExecutionContext<'seg, S: Segment> {
    registry: TermRegistry<'seg, S>,
    bitmap: DocWordsSpace,
    banks: Banks,
    config: ExecConfig,
}

impl<'seg, S: Segment> ExecutionContext<'seg, S> {
    pub fn new(segment: &'seg S, config: ExecConfig) -> Self {
        Self {
            registry: TermRegistry::new(segment, config),
            bitmap: DocWordsSpace::new(segment.max_indexed_position()),
            banks: Banks::new(config),
            config,
        }
    }

    /// Runs `query` to completion, calling `on_match` once per matching
    /// document in ascending ID order with the terms that contributed.
    pub fn run_query<M: MaskedDocuments>(
        &mut self,
        query: AstNode,
        masked: &M,
        mut on_match: impl FnMut(DocId, &[MatchedTerm], &TermRegistry<S>),
    ) -> Result<()> {
        let optimized = optimize(query, &mut self.registry)?;
        let leaders = leader_term_ids(&optimized, &mut self.registry)?;
        let compiled = compile(&optimized, &mut self.registry)?;
        run(
            &compiled,
            leaders,
            &mut self.registry,
            &mut self.bitmap,
            &mut self.banks,
            masked,
            &self.config,
            &mut on_match,
        );
        Ok(())
    }
}
