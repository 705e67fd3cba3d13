//! State-block parsing
//!
//! Parses one brace-delimited state block of an actor definition: label
//! chains, frame declarations with duration and modifier flags, the pseudo
//! states (`GOTO`, `STOP`, `WAIT`/`FAIL`, `LOOP`), and inline action scripts.
//! Each top-level declaration is its own error-isolation unit: a diagnostic
//! marks the declaration invalid and parsing resumes at the next line.

use crate::deferred::{DeferredCall, PendingAction};
use crate::diagnostic::{error_codes, Diagnostic, SourcePos};
use crate::scanner::{Scanner, Token};
use crate::statetable::{FrameDef, StateTable, MAX_TICS};
use crate::symbols::{SpecialsTable, SymbolTable};

/// Parse one state block and return the populated frame table along with
/// every diagnostic produced. Deferred call records are appended to
/// `worklist` in declaration order.
pub fn parse_states(
    source: &str,
    actor: &str,
    symbols: &SymbolTable,
    specials: &SpecialsTable,
    worklist: &mut Vec<DeferredCall>,
) -> (StateTable, Vec<Diagnostic>) {
    let mut parser = StateParser::new(source, actor, symbols, specials, worklist);
    parser.parse_block();
    parser.into_parts()
}

/// Recursive-descent parser for one actor's state block
pub struct StateParser<'a> {
    pub(crate) sc: Scanner,
    pub(crate) symbols: &'a SymbolTable,
    pub(crate) specials: &'a SpecialsTable,
    pub(crate) table: StateTable,
    worklist: &'a mut Vec<DeferredCall>,
    diagnostics: Vec<Diagnostic>,
    actor: String,
    /// Position of the most recently consumed token, for diagnostics that
    /// have no better anchor
    pub(crate) pos: SourcePos,
    /// Action-script braces currently open, so error recovery can skip the
    /// remainder of a partially parsed script
    pub(crate) script_depth: u32,
}

impl<'a> StateParser<'a> {
    pub fn new(
        source: &str,
        actor: &str,
        symbols: &'a SymbolTable,
        specials: &'a SpecialsTable,
        worklist: &'a mut Vec<DeferredCall>,
    ) -> Self {
        Self {
            sc: Scanner::new(source),
            symbols,
            specials,
            table: StateTable::new(),
            worklist,
            diagnostics: Vec::new(),
            actor: actor.to_string(),
            pos: SourcePos::default(),
            script_depth: 0,
        }
    }

    /// Consume the whole block, `{` through `}`. Escape processing is
    /// disabled for the block's extent and restored on every exit path.
    pub fn parse_block(&mut self) {
        if self.expect_exact("{").is_err() {
            return;
        }
        self.sc.set_escape(false);
        loop {
            if self.sc.check("}") {
                break;
            }
            if self.sc.at_end() {
                self.error_here(error_codes::UNEXPECTED_EOF, "Unterminated state block");
                break;
            }
            if self.parse_declaration().is_err() {
                self.synchronize();
            }
        }
        self.sc.set_escape(true);
    }

    /// Surrender the populated table and collected diagnostics
    pub fn into_parts(self) -> (StateTable, Vec<Diagnostic>) {
        (self.table, self.diagnostics)
    }

    // === Declarations ===

    /// One top-level declaration: a pseudo state, or a label chain followed
    /// by a frame declaration
    fn parse_declaration(&mut self) -> Result<(), ()> {
        let statestring = self.parse_state_string()?;
        if statestring.eq_ignore_ascii_case("goto") {
            self.parse_goto()
        } else if statestring.eq_ignore_ascii_case("stop") {
            if !self.table.set_stop() {
                self.error_here(error_codes::BEFORE_FIRST_STATE, "STOP before first state");
            }
            Ok(())
        } else if statestring.eq_ignore_ascii_case("wait") || statestring.eq_ignore_ascii_case("fail")
        {
            if !self.table.set_wait() {
                self.error_here(
                    error_codes::BEFORE_FIRST_STATE,
                    format!("{} before first state", statestring.to_ascii_uppercase()),
                );
            }
            Ok(())
        } else if statestring.eq_ignore_ascii_case("loop") {
            if !self.table.set_loop() {
                self.error_here(error_codes::BEFORE_FIRST_STATE, "LOOP before first state");
            }
            Ok(())
        } else {
            self.parse_frame_declaration(statestring)
        }
    }

    /// Reads a state string that may be scope-qualified (`Super::Label`)
    /// and carry dot-chained sublabels, separators preserved literally
    pub(crate) fn parse_state_string(&mut self) -> Result<String, ()> {
        let mut statestring = self.expect_token()?.text;
        if self.sc.check("::") {
            statestring.push_str("::");
            statestring.push_str(&self.expect_token()?.text);
        }
        while self.sc.check(".") {
            statestring.push('.');
            statestring.push_str(&self.expect_token()?.text);
        }
        Ok(statestring)
    }

    /// `GOTO <label>[+<offset>]`; the offset is appended to the label text
    /// verbatim and interpreted when jumps are resolved
    fn parse_goto(&mut self) -> Result<(), ()> {
        let mut target = self.parse_state_string()?;
        if self.sc.check("+") {
            let offset = self.expect_number()?;
            target.push('+');
            target.push_str(&offset.to_string());
        }
        if !self.table.set_goto(target) {
            self.error_here(error_codes::BEFORE_FIRST_STATE, "GOTO before first state");
        }
        Ok(())
    }

    /// Label chains plus one frame declaration
    fn parse_frame_declaration(&mut self, statestring: String) -> Result<(), ()> {
        let mut statestring = statestring;

        // A following ':' makes the identifier a label, not a sprite name.
        // Any number of labels may chain before one frame declaration, all
        // bound to the same frame index. GOTO and STOP remain reachable
        // from inside the chain.
        let mut tok = self.expect_token()?;
        if tok.text == ":" {
            loop {
                self.table.add_label(&statestring);
                statestring = self.parse_state_string()?;
                if statestring.eq_ignore_ascii_case("goto") {
                    return self.parse_goto();
                }
                if statestring.eq_ignore_ascii_case("stop") {
                    if !self.table.set_stop() {
                        self.error_here(error_codes::BEFORE_FIRST_STATE, "STOP before first state");
                    }
                    return Ok(());
                }
                tok = self.expect_token()?;
                if tok.text != ":" {
                    break;
                }
            }
        }
        self.sc.unget(tok);

        if statestring.chars().count() != 4 {
            self.error_here(
                error_codes::BAD_SPRITE_NAME,
                "Sprite names must be exactly 4 characters",
            );
            return Err(());
        }
        let sprite = self.table.sprite_index(&statestring);
        let mut state = FrameDef::new(sprite);

        let letters_tok = self.expect_token()?;
        let letters = letters_tok.text;

        if self.sc.check("RANDOM") {
            self.expect_exact("(")?;
            let mut min = self.expect_number()?.clamp(-1, MAX_TICS);
            self.expect_exact(",")?;
            let mut max = self.expect_number()?.clamp(-1, MAX_TICS);
            self.expect_exact(")")?;
            if min > max {
                std::mem::swap(&mut min, &mut max);
            }
            state.tics = min;
            state.tic_range = max - min;
        } else {
            state.tics = self.expect_number()?.clamp(-1, MAX_TICS);
            state.tic_range = 0;
        }

        let pending = self.parse_frame_trailer(&mut state, &letters)?;

        let count = self.table.add_frames(&state, &letters);
        let count = if count < 0 {
            self.error(
                error_codes::INVALID_FRAME_CHARS,
                format!("Invalid frame character string '{}'", letters),
                letters_tok.pos,
            );
            (-count) as usize
        } else {
            count as usize
        };
        if let Some(pending) = pending {
            let first_state = self.table.state_count() - count;
            self.worklist
                .push(pending.finalize(self.actor.clone(), first_state, count));
        }
        Ok(())
    }

    /// Modifier keywords after the duration, then an optional inline action
    /// script. The scan stops at the first non-modifier token on a new line,
    /// which is pushed back for the next declaration.
    fn parse_frame_trailer(
        &mut self,
        state: &mut FrameDef,
        letters: &str,
    ) -> Result<Option<PendingAction>, ()> {
        loop {
            let Some(tok) = self.sc.get() else {
                return Ok(None);
            };
            if tok.crossed && !tok.is("{") {
                self.sc.unget(tok);
                return Ok(None);
            }
            self.pos = tok.pos;
            if tok.is("BRIGHT") {
                state.bright = true;
                continue;
            }
            if tok.is("FAST") {
                state.fast = true;
                continue;
            }
            if tok.is("SLOW") {
                state.slow = true;
                continue;
            }
            if tok.is("NODELAY") {
                // Only the very first frame registered under the Spawn label
                // may skip its first-tic delay; elsewhere the keyword is
                // accepted with a warning and ignored
                if self.table.label_index("Spawn") == Some(self.table.state_count()) {
                    state.no_delay = true;
                } else {
                    self.warning(
                        error_codes::MISPLACED_NODELAY,
                        "NODELAY may only be used immediately after Spawn:",
                        tok.pos,
                    );
                }
                continue;
            }
            if tok.is("OFFSET") {
                self.expect_exact("(")?;
                state.offset_x = self.expect_number()?;
                self.expect_exact(",")?;
                state.offset_y = self.expect_number()?;
                self.expect_exact(")")?;
                continue;
            }
            if tok.is("LIGHT") {
                self.expect_exact("(")?;
                loop {
                    let name = self.expect_token()?;
                    #[cfg(feature = "lights")]
                    state.lights.push(name.text.to_ascii_lowercase());
                    #[cfg(not(feature = "lights"))]
                    let _ = name;
                    if !self.sc.check(",") {
                        break;
                    }
                }
                self.expect_exact(")")?;
                continue;
            }
            if tok.is("CANRAISE") {
                state.can_raise = true;
                continue;
            }

            // Anything else on the declaration line starts the action script
            let (code, proto, ends_with_ret) = self.parse_actions(letters, tok)?;
            let Some(mut code) = code else {
                return Ok(None);
            };
            let proto = proto.unwrap_or_default();
            if !ends_with_ret {
                self.add_implicit_return(&mut code, &proto)?;
            }
            return Ok(Some(PendingAction::new(code, proto)));
        }
    }

    /// Skip to the next declaration boundary after an error: first close any
    /// action-script braces left open, then discard the rest of the line
    fn synchronize(&mut self) {
        while self.script_depth > 0 {
            let Some(tok) = self.sc.get() else {
                self.script_depth = 0;
                return;
            };
            if tok.text == "{" {
                self.script_depth += 1;
            } else if tok.text == "}" {
                self.script_depth -= 1;
            }
        }
        while let Some(tok) = self.sc.get() {
            if tok.crossed || tok.is("}") {
                self.sc.unget(tok);
                return;
            }
        }
    }

    // === Token helpers ===

    pub(crate) fn expect_token(&mut self) -> Result<Token, ()> {
        match self.sc.get() {
            Some(token) => {
                self.pos = token.pos;
                Ok(token)
            }
            None => {
                self.error_here(error_codes::UNEXPECTED_EOF, "Unexpected end of file");
                Err(())
            }
        }
    }

    pub(crate) fn expect_exact(&mut self, text: &str) -> Result<Token, ()> {
        let token = self.expect_token()?;
        if token.is(text) {
            Ok(token)
        } else {
            self.error(
                error_codes::SYNTAX_ERROR,
                format!("Expected '{}', found '{}'", text, token.text),
                token.pos,
            );
            Err(())
        }
    }

    pub(crate) fn expect_number(&mut self) -> Result<i32, ()> {
        let token = self.expect_token()?;
        match token.int_value() {
            Some(value) => Ok(value),
            None => {
                self.error(
                    error_codes::SYNTAX_ERROR,
                    format!("Expected a number, found '{}'", token.text),
                    token.pos,
                );
                Err(())
            }
        }
    }

    // === Diagnostics ===

    pub(crate) fn error(
        &mut self,
        code: &str,
        message: impl Into<String>,
        pos: SourcePos,
    ) {
        self.diagnostics.push(Diagnostic::error(code, message, pos));
    }

    pub(crate) fn error_here(&mut self, code: &str, message: impl Into<String>) {
        let pos = self.pos;
        self.error(code, message, pos);
    }

    pub(crate) fn warning(&mut self, code: &str, message: impl Into<String>, pos: SourcePos) {
        self.diagnostics.push(Diagnostic::warning(code, message, pos));
    }
}
