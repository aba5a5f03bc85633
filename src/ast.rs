//! The parsed query AST.
//!
//! Query parsing, normalization, and AST construction live upstream of this
//! crate; what's defined here is the boundary shape the optimizer and
//! compiler consume, plus the two helpers (`normalize_root`, `leader_nodes`)
//! the driver and optimizer call into.

use std::rc::Rc;

/// Binary/unary operator tag carried by `BinOp`/`UnaryOp` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    /// Strict AND: same truth table as `And`; kept distinct because some
    /// query surfaces want a separate op to rewrite against, not because
    /// the execution engine treats it differently.
    StrictAnd,
    Or,
    Not,
    /// Malformed, never valid once a node reaches the compiler.
    None,
}

impl Operator {
    pub fn is_and_like(self) -> bool {
        matches!(self, Operator::And | Operator::StrictAnd)
    }
}

/// A parsed boolean query tree node.
#[derive(Debug, Clone)]
pub enum AstNode {
    /// A single query term.
    Token { text: Rc<str> },
    /// An ordered sequence of terms required at consecutive positions.
    /// `terms.len() >= 1`; compiler treats `len() == 1` as a token match.
    Phrase { terms: Vec<Rc<str>> },
    BinOp {
        op: Operator,
        lhs: Box<AstNode>,
        rhs: Box<AstNode>,
    },
    UnaryOp {
        op: Operator,
        expr: Box<AstNode>,
    },
    /// A subtree folded to unsatisfiable by the optimizer.
    ConstFalse,
    /// Placeholder node that should never reach compilation; only
    /// produced by a malformed parse.
    Dummy,
}

impl AstNode {
    pub fn token(text: impl Into<Rc<str>>) -> Self {
        AstNode::Token { text: text.into() }
    }

    pub fn phrase(terms: Vec<impl Into<Rc<str>>>) -> Self {
        AstNode::Phrase {
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }

    pub fn and(lhs: AstNode, rhs: AstNode) -> Self {
        AstNode::BinOp {
            op: Operator::And,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn strict_and(lhs: AstNode, rhs: AstNode) -> Self {
        AstNode::BinOp {
            op: Operator::StrictAnd,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn or(lhs: AstNode, rhs: AstNode) -> Self {
        AstNode::BinOp {
            op: Operator::Or,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn not(lhs: AstNode, rhs: AstNode) -> Self {
        AstNode::BinOp {
            op: Operator::Not,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary_and(expr: AstNode) -> Self {
        AstNode::UnaryOp {
            op: Operator::And,
            expr: Box::new(expr),
        }
    }

    pub fn unary_not(expr: AstNode) -> Self {
        AstNode::UnaryOp {
            op: Operator::Not,
            expr: Box::new(expr),
        }
    }
}

/// Re-normalizes a tree after a mutating optimizer pass: collapses
/// `BinOp`/`UnaryOp` nodes whose children are now `ConstFalse` according to
/// the same short-circuit rules the optimizer itself applies. Redundant
/// unary wrappers (`UnaryAnd(x) -> x`) are expected to be normalized away
/// upstream; double negation is left to the caller.
///
/// Implemented here as a small, self-contained pass since the optimizer's
/// fixed-point loop depends on it and there's no other natural home for it.
pub fn normalize_root(node: AstNode) -> AstNode {
    match node {
        AstNode::BinOp { op, lhs, rhs } => {
            let lhs = normalize_root(*lhs);
            let rhs = normalize_root(*rhs);
            match (op, &lhs, &rhs) {
                (Operator::And | Operator::StrictAnd, AstNode::ConstFalse, _) => AstNode::ConstFalse,
                (Operator::And | Operator::StrictAnd, _, AstNode::ConstFalse) => AstNode::ConstFalse,
                (Operator::Or, AstNode::ConstFalse, AstNode::ConstFalse) => AstNode::ConstFalse,
                (Operator::Or, AstNode::ConstFalse, _) => rhs,
                (Operator::Or, _, AstNode::ConstFalse) => lhs,
                (Operator::Not, AstNode::ConstFalse, _) => AstNode::ConstFalse,
                (Operator::Not, _, AstNode::ConstFalse) => lhs,
                _ => AstNode::BinOp {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            }
        }
        AstNode::UnaryOp { op, expr } => {
            let expr = normalize_root(*expr);
            match (op, &expr) {
                (_, AstNode::ConstFalse) => AstNode::ConstFalse,
                _ => AstNode::UnaryOp {
                    op,
                    expr: Box::new(expr),
                },
            }
        }
        other => other,
    }
}

/// Collects the "leader" token texts, the AST leaves whose postings must
/// be enumerated to discover candidate documents.
///
/// Leaders are every `Token`/`Phrase` leaf reachable through the root
/// without crossing a negated branch: both sides of `Or` and `And`
/// contribute leaders (an `And` still needs *a* leader to discover
/// candidates even though both sides must match), but the negated side of
/// `Not` (binary or unary) never does, since it can't discover documents,
/// only rule them out. `UnaryOp{And}`'s operand is a leader for the
/// same reason `And`'s children are.
pub fn leader_nodes(root: &AstNode) -> Vec<Rc<str>> {
    let mut out = Vec::new();
    collect_leaders(root, &mut out);
    out
}

fn collect_leaders(node: &AstNode, out: &mut Vec<Rc<str>>) {
    match node {
        AstNode::Token { text } => out.push(Rc::clone(text)),
        AstNode::Phrase { terms } => {
            if let Some(first) = terms.first() {
                out.push(Rc::clone(first));
            }
        }
        AstNode::BinOp {
            op: Operator::Not,
            lhs,
            ..
        } => collect_leaders(lhs, out),
        AstNode::BinOp { lhs, rhs, .. } => {
            collect_leaders(lhs, out);
            collect_leaders(rhs, out);
        }
        AstNode::UnaryOp {
            op: Operator::Not, ..
        } => {}
        AstNode::UnaryOp { expr, .. } => collect_leaders(expr, out),
        AstNode::ConstFalse | AstNode::Dummy => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leader_nodes_skips_not_branch() {
        let root = AstNode::not(AstNode::token("a"), AstNode::token("b"));
        let leaders: Vec<&str> = leader_nodes(&root).iter().map(|s| &**s).collect();
        assert_eq!(leaders, vec!["a"]);
    }

    #[test]
    fn leader_nodes_collects_both_and_sides() {
        let root = AstNode::and(AstNode::token("a"), AstNode::token("b"));
        let leaders: Vec<&str> = leader_nodes(&root).iter().map(|s| &**s).collect();
        assert_eq!(leaders, vec!["a", "b"]);
    }

    #[test]
    fn leader_nodes_phrase_uses_first_term() {
        let root = AstNode::phrase(vec!["quick", "brown", "fox"]);
        let leaders: Vec<&str> = leader_nodes(&root).iter().map(|s| &**s).collect();
        assert_eq!(leaders, vec!["quick"]);
    }

    #[test]
    fn normalize_collapses_and_with_false_child() {
        let root = AstNode::and(AstNode::ConstFalse, AstNode::token("a"));
        assert!(matches!(normalize_root(root), AstNode::ConstFalse));
    }

    #[test]
    fn normalize_or_with_one_false_child_returns_other() {
        let root = AstNode::or(AstNode::ConstFalse, AstNode::token("a"));
        assert!(matches!(normalize_root(root), AstNode::Token { .. }));
    }
}
