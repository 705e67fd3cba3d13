//! Compiled action-script expression trees
//!
//! Action scripts compile into small ownership-shaped trees: every node owns
//! its children outright, so dropping the root releases the whole tree. The
//! variants are fixed and pattern matching replaces virtual dispatch.

use crate::symbols::Signature;
use serde::{Deserialize, Serialize};

/// A compiled expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Literal value
    Constant(Constant),
    /// Argument-position wrapper around one owned expression
    Parameter(Box<Expr>),
    /// Integer conversion applied to the inner expression
    IntCast(Box<Expr>),
    /// Reference to a frame by absolute index, produced by the relative
    /// jump-offset argument form
    StateByIndex(usize),
    /// Resolved function call
    Call(CallExpr),
    /// Ordered statement sequence
    Sequence(Vec<Expr>),
    /// Conditional with mandatory-brace branches; either branch may be
    /// empty, and the false branch may be absent entirely
    IfElse(IfElseExpr),
    /// Return statement carrying an optional call whose results it forwards
    Return(Option<Box<CallExpr>>),
}

/// Literal constants appearing in argument positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Int(i32),
    Float(f64),
    Str(String),
    /// Bare identifier naming an engine-level constant
    Name(String),
    /// State argument given as a label to resolve later
    StateLabel(String),
    /// Null state reference (jump offset 0)
    NoState,
}

/// A call to a resolved callable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    /// Canonical (case-folded) name of the resolved callee
    pub callee: String,
    /// The callee's declared return signature
    pub ret: Signature,
    /// Ordered owned argument nodes, implicit parameters excluded
    pub args: Vec<Expr>,
}

/// A compiled `if`/`else` statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfElseExpr {
    pub cond: Box<Expr>,
    pub then_part: Option<Box<Expr>>,
    pub else_part: Option<Box<Expr>>,
}

impl Expr {
    /// True for sequences with no statements
    pub fn is_empty_sequence(&self) -> bool {
        matches!(self, Expr::Sequence(stmts) if stmts.is_empty())
    }
}
