//! Abstract syntax tree: a tagged union of statement and expression nodes.
//! Nodes are owned (`Box`/`Vec`), not arena-allocated — ordinary allocation
//! fits a tree-walking interpreter for short scripts better than a bump
//! arena would, and nothing else in the crate needs arena lifetimes.

pub mod stmt;

pub use stmt::{
    ArrowBody, AssignOp, BinaryOp, Block, ClassDecl, Expr, ForHeader, IncDec, Literal,
    LogicalOp, LValue, MethodDecl, Param, Program, Stmt, StmtKind, SwitchCase, UnaryOp,
};
