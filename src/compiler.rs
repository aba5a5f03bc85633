//! Compiler: lowers the optimized AST into a packed `ExecNode` tree plus
//! append-only side tables, so evaluation is pure index arithmetic with no
//! further tree walking of `AstNode`.

use ahash::AHashSet;
use std::rc::Rc;

use crate::ast::{AstNode, Operator};
use crate::error::{QueryExecError, Result};
use crate::segment::Segment;
use crate::term::{TermId, TermRegistry};

/// Opcode tag for an `ExecNode`. Dispatch over it in `interpreter.rs` is a
/// flat jump table rather than a virtual-call hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    MatchToken,
    MatchPhrase,
    LogicalAnd,
    LogicalOr,
    LogicalNot,
    UnaryAnd,
    UnaryNot,
    ConstFalse,
}

/// One node of the compiled tree: an opcode, a flags byte reserved for
/// future opcode variants (e.g. case-insensitive matching), and an index
/// into whichever side table the opcode uses.
#[derive(Debug, Clone, Copy)]
pub struct ExecNode {
    pub opcode: Opcode,
    pub flags: u8,
    pub ctx_idx: u16,
}

impl ExecNode {
    fn new(opcode: Opcode, ctx_idx: u16) -> Self {
        Self {
            opcode,
            flags: 0,
            ctx_idx,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BinOpCtx {
    pub lhs: ExecNode,
    pub rhs: ExecNode,
}

#[derive(Debug, Clone, Copy)]
pub struct UnaryOpCtx {
    pub expr: ExecNode,
}

/// A compiled token leaf. `rep`/`index` are carried through to the scoring
/// callback for display and stable tie-breaking; `index` is this leaf's
/// ordinal among all leaves compiled, assigned in the traversal order the
/// compiler visits them.
#[derive(Debug, Clone)]
pub struct TokenCtx {
    pub rep: Rc<str>,
    pub index: u16,
    pub term_id: TermId,
}

/// A compiled phrase leaf (`size >= 2`; single-term phrases compile to
/// `MatchToken` instead).
#[derive(Debug, Clone)]
pub struct PhraseCtx {
    pub rep: Rc<str>,
    pub index: u16,
    pub size: u8,
    pub term_ids: Vec<TermId>,
}

/// The compiled form of one query: a root `ExecNode` plus the side tables
/// it indexes into, and the set of term IDs reachable outside any `NOT`
/// branch, used by the match collector to exclude terms that only occur
/// negated.
pub struct CompiledQuery {
    pub root: ExecNode,
    pub binops: Vec<BinOpCtx>,
    pub unaryops: Vec<UnaryOpCtx>,
    pub tokens: Vec<TokenCtx>,
    pub phrases: Vec<PhraseCtx>,
    pub positive_term_ids: AHashSet<TermId>,
}

struct Compiler {
    binops: Vec<BinOpCtx>,
    unaryops: Vec<UnaryOpCtx>,
    tokens: Vec<TokenCtx>,
    phrases: Vec<PhraseCtx>,
    positive_term_ids: AHashSet<TermId>,
    next_index: u16,
}

impl Compiler {
    fn new() -> Self {
        Self {
            binops: Vec::new(),
            unaryops: Vec::new(),
            tokens: Vec::new(),
            phrases: Vec::new(),
            positive_term_ids: AHashSet::new(),
            next_index: 0,
        }
    }

    fn alloc_index(&mut self) -> u16 {
        let i = self.next_index;
        self.next_index += 1;
        i
    }

    fn compile_token<S: Segment>(
        &mut self,
        text: &Rc<str>,
        registry: &mut TermRegistry<S>,
        positive: bool,
    ) -> Result<ExecNode> {
        let term_id = registry.resolve_term(text);
        registry.prepare_decoder(term_id)?;
        if positive && term_id != 0 {
            self.positive_term_ids.insert(term_id);
        }
        let index = self.alloc_index();
        let ctx_idx = self.tokens.len() as u16;
        self.tokens.push(TokenCtx {
            rep: Rc::clone(text),
            index,
            term_id,
        });
        Ok(ExecNode::new(Opcode::MatchToken, ctx_idx))
    }

    fn compile_node<S: Segment>(
        &mut self,
        node: &AstNode,
        registry: &mut TermRegistry<S>,
        positive: bool,
    ) -> Result<ExecNode> {
        match node {
            AstNode::Token { text } => self.compile_token(text, registry, positive),
            AstNode::Phrase { terms } if terms.len() == 1 => {
                self.compile_token(&terms[0], registry, positive)
            }
            AstNode::Phrase { terms } => {
                let mut term_ids = Vec::with_capacity(terms.len());
                for t in terms {
                    let term_id = registry.resolve_term(t);
                    registry.prepare_decoder(term_id)?;
                    if positive && term_id != 0 {
                        self.positive_term_ids.insert(term_id);
                    }
                    term_ids.push(term_id);
                }
                let rep: Rc<str> = Rc::from(
                    terms
                        .iter()
                        .map(|s| s.as_ref())
                        .collect::<Vec<_>>()
                        .join(" "),
                );
                let index = self.alloc_index();
                let ctx_idx = self.phrases.len() as u16;
                self.phrases.push(PhraseCtx {
                    rep,
                    index,
                    size: terms.len() as u8,
                    term_ids,
                });
                Ok(ExecNode::new(Opcode::MatchPhrase, ctx_idx))
            }
            AstNode::BinOp { op: Operator::None, .. } => Err(QueryExecError::MalformedAst(
                "BinOp with Operator::None reached the compiler".into(),
            )),
            AstNode::BinOp { op, lhs, rhs } => {
                let (opcode, rhs_positive) = match op {
                    Operator::And | Operator::StrictAnd => (Opcode::LogicalAnd, positive),
                    Operator::Or => (Opcode::LogicalOr, positive),
                    Operator::Not => (Opcode::LogicalNot, false),
                    Operator::None => unreachable!(),
                };
                let lhs = self.compile_node(lhs, registry, positive)?;
                let rhs = self.compile_node(rhs, registry, positive && rhs_positive)?;
                let ctx_idx = self.binops.len() as u16;
                self.binops.push(BinOpCtx { lhs, rhs });
                Ok(ExecNode::new(opcode, ctx_idx))
            }
            AstNode::UnaryOp { op: Operator::None, .. } => Err(QueryExecError::MalformedAst(
                "UnaryOp with Operator::None reached the compiler".into(),
            )),
            AstNode::UnaryOp { op, expr } => {
                let (opcode, expr_positive) = match op {
                    Operator::And | Operator::StrictAnd => (Opcode::UnaryAnd, positive),
                    Operator::Not => (Opcode::UnaryNot, false),
                    Operator::Or | Operator::None => {
                        return Err(QueryExecError::MalformedAst(format!(
                            "UnaryOp with unsupported operator {op:?}"
                        )))
                    }
                };
                let expr = self.compile_node(expr, registry, expr_positive)?;
                let ctx_idx = self.unaryops.len() as u16;
                self.unaryops.push(UnaryOpCtx { expr });
                Ok(ExecNode::new(opcode, ctx_idx))
            }
            AstNode::ConstFalse => Ok(ExecNode::new(Opcode::ConstFalse, 0)),
            AstNode::Dummy => Err(QueryExecError::MalformedAst(
                "Dummy node reached the compiler".into(),
            )),
        }
    }
}

/// Lowers an optimized AST to a `CompiledQuery`. Eagerly prepares a decoder
/// for every term referenced by a leaf, token or phrase alike, since both
/// opcodes need a live decoder before the interpreter ever runs against
/// them.
pub fn compile<S: Segment>(root: &AstNode, registry: &mut TermRegistry<S>) -> Result<CompiledQuery> {
    let mut compiler = Compiler::new();
    let root_node = compiler.compile_node(root, registry, true)?;
    Ok(CompiledQuery {
        root: root_node,
        binops: compiler.binops,
        unaryops: compiler.unaryops,
        tokens: compiler.tokens,
        phrases: compiler.phrases,
        positive_term_ids: compiler.positive_term_ids,
    })
}
