//! Diagnostic system for errors and warnings
//!
//! All errors and warnings produced by the state parser flow through the
//! unified Diagnostic type. Errors mark the current declaration invalid but
//! never abort the whole block; the parser resumes at the next declaration
//! boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// Fatal to the current declaration
    Error,
    /// Advisory; parsing continues and the declaration stays valid
    Warning,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Error => write!(f, "error"),
            DiagnosticLevel::Warning => write!(f, "warning"),
        }
    }
}

/// Source position of a token or diagnostic (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourcePos {
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A diagnostic message (error or warning)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub level: DiagnosticLevel,
    /// Error code (e.g., "SS1003")
    pub code: String,
    /// Main diagnostic message
    pub message: String,
    /// Source position the diagnostic points at
    pub pos: SourcePos,
    /// Additional notes (optional)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: impl Into<String>, message: impl Into<String>, pos: SourcePos) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            code: code.into(),
            message: message.into(),
            pos,
            notes: Vec::new(),
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: impl Into<String>, message: impl Into<String>, pos: SourcePos) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            code: code.into(),
            message: message.into(),
            pos,
            notes: Vec::new(),
        }
    }

    /// Add a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Format as human-readable string
    pub fn to_human_string(&self) -> String {
        let mut output = format!(
            "{}[{}]: {} at {}\n",
            self.level, self.code, self.message, self.pos
        );
        for note in &self.notes {
            output.push_str(&format!("   = note: {}\n", note));
        }
        output
    }

    /// Format as JSON string
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Error code registry
pub mod error_codes {
    // SS1xxx - Structural errors
    pub const SYNTAX_ERROR: &str = "SS1000";
    pub const UNEXPECTED_EOF: &str = "SS1001";
    pub const BAD_SPRITE_NAME: &str = "SS1002";
    pub const INVALID_FRAME_CHARS: &str = "SS1003";
    pub const BEFORE_FIRST_STATE: &str = "SS1004";

    // SS3xxx - Type errors
    pub const RETURN_TYPE_MISMATCH: &str = "SS3001";
    pub const MISSING_RETURN: &str = "SS3002";
    pub const ARITY_MISMATCH: &str = "SS3003";
    pub const INVALID_PARAMETER: &str = "SS3004";
    pub const BAD_JUMP_OFFSET: &str = "SS3005";

    // SW2xxx - Warnings
    pub const MISPLACED_NODELAY: &str = "SW2001";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_creation() {
        let diag = Diagnostic::error("SS1000", "test error", SourcePos::new(3, 7));
        assert_eq!(diag.level, DiagnosticLevel::Error);
        assert_eq!(diag.message, "test error");
        assert_eq!(diag.pos.line, 3);
    }

    #[test]
    fn test_warning_creation() {
        let diag = Diagnostic::warning("SW2001", "test warning", SourcePos::default());
        assert_eq!(diag.level, DiagnosticLevel::Warning);
    }

    #[test]
    fn test_human_format() {
        let diag = Diagnostic::error("SS1002", "Sprite names must be exactly 4 characters", SourcePos::new(2, 5))
            .with_note("found 'LONGNAME'");
        let output = diag.to_human_string();
        assert!(output.contains("error[SS1002]"));
        assert!(output.contains("2:5"));
        assert!(output.contains("note: found 'LONGNAME'"));
    }

    #[test]
    fn test_json_format() {
        let diag = Diagnostic::error("SS3001", "Return types are incompatible", SourcePos::new(1, 1));
        let json = diag.to_json_string().unwrap();
        assert!(json.contains("\"level\": \"error\""));
        assert!(json.contains("\"code\": \"SS3001\""));
    }
}
