//! Deferred call records awaiting their frame-index range
//!
//! A frame declaration's compiled script is finished before the declaration's
//! letter string is expanded, so the frame range it governs is not known yet.
//! The compiled tree is held in a `PendingAction` and finalized into an
//! immutable `DeferredCall` once the range is known; finalized records are
//! appended to a caller-supplied worklist that a later code-generation pass
//! drains in order.

use crate::expr::Expr;
use crate::symbols::Signature;
use serde::{Deserialize, Serialize};

/// A compiled action script whose frame range is not yet known
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAction {
    pub code: Expr,
    pub proto: Signature,
}

impl PendingAction {
    pub fn new(code: Expr, proto: Signature) -> Self {
        Self { code, proto }
    }

    /// Bind the compiled script to its owning actor and frame range
    pub fn finalize(
        self,
        actor: impl Into<String>,
        first_state: usize,
        num_states: usize,
    ) -> DeferredCall {
        DeferredCall {
            actor: actor.into(),
            first_state,
            num_states,
            code: self.code,
            proto: self.proto,
        }
    }
}

/// A compiled action script bound to the frame range it governs,
/// queued for code generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferredCall {
    /// Owning actor type
    pub actor: String,
    /// First frame index the script covers
    pub first_state: usize,
    /// Number of consecutive frames covered
    pub num_states: usize,
    /// Compiled expression tree root
    pub code: Expr,
    /// Synthesized return signature of the script
    pub proto: Signature,
}
