//! StateScript front end - actor state-script compilation
//!
//! This library provides the front end of the actor scripting compiler:
//! - State-block tokenization and frame-table construction
//! - Inline action-script compilation to typed expression trees
//! - Return-signature unification and callable resolution
//! - Deferred call records queued for a later code-generation pass

/// Front-end version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Public API modules
pub mod actions;
pub mod deferred;
pub mod diagnostic;
pub mod expr;
pub mod scanner;
pub mod states;
pub mod statetable;
pub mod symbols;

// Re-export commonly used types
pub use deferred::{DeferredCall, PendingAction};
pub use diagnostic::{error_codes, Diagnostic, DiagnosticLevel, SourcePos};
pub use expr::{CallExpr, Constant, Expr, IfElseExpr};
pub use scanner::{Scanner, Token, TokenKind};
pub use states::{parse_states, StateParser};
pub use statetable::{
    FrameDef, NextState, SpriteMap, StateTable, StateTableError, MAX_FRAME, MAX_TICS,
};
pub use symbols::{
    internal_cast_name, Callable, ParamKind, ParamSpec, Signature, SpecialDef, SpecialsTable,
    SymbolTable, ValueType, SPECIAL_DISPATCH,
};
