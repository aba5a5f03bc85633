//! Boolean query execution core for a text search engine's inverted index.
//!
//! 面向单个索引段(segment)的布尔查询执行内核
//!
//! ## 核心特性
//! - 查询优化器: 代价估计 + 子表达式重排 + 不可满足分支折叠
//! - 编译器: 布尔树 -> 压平的 opcode 节点数组 + 旁路上下文表
//! - 执行引擎: leader-merge 候选文档发现 + 递归 opcode 解释器 + 命中物化
//!
//! ## 架构
//! - [`ast`]: 解析后的查询树边界形状 (`Token`/`Phrase`/`BinOp`/`UnaryOp`)
//! - [`optimizer`]: 代价估计与树重写 (§4.3)
//! - [`compiler`]: AST -> `ExecNode` 数组 + 旁路表 (§4.4)
//! - [`interpreter`]: opcode 解释器 (§4.5)
//! - [`driver`]: leader-merge 主循环 (§4.6)
//! - [`bank`]: 候选文档 bank + 捕获状态 (§4.7)
//! - [`collector`]: 命中收集 / 匹配词物化 (§4.8)
//! - [`term`]: term 注册表 + decoder/hit-buffer 缓存 (§4.1)
//! - [`bitmap`]: 按文档复用的位置位图 (§4.2)
//! - [`segment`]: 外部协作者的边界 trait (segment/decoder/masked-docs)
//! - [`context`]: 把上述装配成一次查询入口点
//!
//! Out of scope (external collaborators, spec §6): the segment/postings
//! codec itself, query parsing/normalization, the masked-document registry's
//! storage, and score computation. This crate only consumes their trait
//! boundaries.

pub mod ast;
pub mod bank;
pub mod bitmap;
pub mod collector;
pub mod compiler;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod interpreter;
pub mod optimizer;
pub mod segment;
pub mod term;

mod trace;

#[cfg(test)]
pub(crate) mod testkit;

pub use ast::{AstNode, Operator};
pub use collector::MatchedTerm;
pub use config::ExecConfig;
pub use context::ExecutionContext;
pub use error::{QueryExecError, Result};
pub use segment::{Decoder, DocId, Hit, MaskedDocuments, NoMaskedDocuments, Position, Segment, TermContext};
pub use term::TermId;
