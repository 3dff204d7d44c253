//! prism-codegen — the C backend of the first-stage Prism compiler.
//!
//! The first-stage compiler lowered Prism source to C and handed it to the
//! system toolchain; the self-hosted compiler has since replaced it. This
//! crate keeps the renderer so the bootstrap path can still be rebuilt.
//!
//! Only the node kinds the bootstrap compiler actually produced are
//! modelled; there is no parser and no type checker here.

pub mod ast;
pub mod cgen;

pub use ast::{BinaryOp, Def, Expr, Program, Stmt, UnaryOp};
pub use cgen::render_program;
