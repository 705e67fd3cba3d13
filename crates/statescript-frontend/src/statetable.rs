//! Frame table: ordered frame records, labels, and jump resolution
//!
//! The state parser emits frame records into a `StateTable`. Labels bind to
//! "the next frame index to be emitted"; the terminal directives mark the
//! last emitted frame's disposition and fail when no frame exists yet.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Highest valid frame letter index (`A`–`Z`, `[`, `\`, then `]`)
pub const MAX_FRAME: usize = 28;

/// Longest representable duration in tics
pub const MAX_TICS: i32 = 32767;

/// What happens after a frame's duration elapses
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NextState {
    /// Fall through to the following frame
    #[default]
    Advance,
    /// Jump back to the frame bound by the most recent label
    Loop(usize),
    /// Repeat this frame until an external transition fires
    Wait,
    /// Remove the actor
    Stop,
    /// Unresolved jump target, label text with optional `+N` suffix verbatim
    Goto { target: String },
    /// Resolved jump target
    Jump(usize),
}

/// One timed animation frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDef {
    /// Interned sprite index
    pub sprite: usize,
    /// Frame letter index (0 = `A`)
    pub frame: usize,
    /// Duration in tics; -1 = forever
    pub tics: i32,
    /// Additive random range on top of `tics`; 0 = fixed duration
    pub tic_range: i32,
    pub bright: bool,
    pub fast: bool,
    pub slow: bool,
    pub no_delay: bool,
    pub can_raise: bool,
    /// Weapon-style sprite offsets
    pub offset_x: i32,
    pub offset_y: i32,
    #[cfg(feature = "lights")]
    pub lights: Vec<String>,
    pub next: NextState,
}

impl FrameDef {
    /// A frame template for the given sprite, all fields at rest
    pub fn new(sprite: usize) -> Self {
        Self {
            sprite,
            frame: 0,
            tics: 0,
            tic_range: 0,
            bright: false,
            fast: false,
            slow: false,
            no_delay: false,
            can_raise: false,
            offset_x: 0,
            offset_y: 0,
            #[cfg(feature = "lights")]
            lights: Vec::new(),
            next: NextState::Advance,
        }
    }
}

/// Errors surfaced when resolving recorded jump targets
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateTableError {
    #[error("goto target '{0}' is not defined")]
    UnknownGotoTarget(String),
    #[error("goto offset in '{0}' points past the end of the frame table")]
    GotoOffsetOutOfRange(String),
    #[error("malformed goto offset in '{0}'")]
    BadGotoOffset(String),
}

/// Interning table mapping sprite names to dense indices
#[derive(Debug, Clone, Default)]
pub struct SpriteMap {
    names: Vec<String>,
    indices: HashMap<String, usize>,
}

impl SpriteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a sprite name (case-folded to uppercase) and return its index
    pub fn get_or_intern(&mut self, name: &str) -> usize {
        let folded = name.to_ascii_uppercase();
        if let Some(&index) = self.indices.get(&folded) {
            return index;
        }
        let index = self.names.len();
        self.names.push(folded.clone());
        self.indices.insert(folded, index);
        index
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Ordered frame records plus the labels and sprites they reference
#[derive(Debug, Clone, Default)]
pub struct StateTable {
    states: Vec<FrameDef>,
    labels: HashMap<String, usize>,
    sprites: SpriteMap,
    /// Frame index bound by the most recent label, for `LOOP`
    loop_point: usize,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames emitted so far
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[FrameDef] {
        &self.states
    }

    pub fn state(&self, index: usize) -> Option<&FrameDef> {
        self.states.get(index)
    }

    /// Bind a label to the next frame index to be emitted.
    /// Re-declaring a label rebinds it.
    pub fn add_label(&mut self, name: &str) {
        let index = self.states.len();
        self.labels.insert(name.to_ascii_lowercase(), index);
        self.loop_point = index;
    }

    /// Look up a label, case-insensitively
    pub fn label_index(&self, name: &str) -> Option<usize> {
        self.labels.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().map(|(name, &index)| (name.as_str(), index))
    }

    /// Intern a sprite name and return its index
    pub fn sprite_index(&mut self, name: &str) -> usize {
        self.sprites.get_or_intern(name)
    }

    pub fn sprite_name(&self, index: usize) -> Option<&str> {
        self.sprites.name(index)
    }

    /// Record an unresolved jump on the last emitted frame.
    /// False when no frame has been emitted yet.
    pub fn set_goto(&mut self, target: impl Into<String>) -> bool {
        match self.states.last_mut() {
            Some(state) => {
                state.next = NextState::Goto {
                    target: target.into(),
                };
                true
            }
            None => false,
        }
    }

    /// Mark the last emitted frame as terminal
    pub fn set_stop(&mut self) -> bool {
        self.set_next(NextState::Stop)
    }

    /// Mark the last emitted frame as self-repeating
    pub fn set_wait(&mut self) -> bool {
        self.set_next(NextState::Wait)
    }

    /// Loop the last emitted frame back to the most recent label
    pub fn set_loop(&mut self) -> bool {
        self.set_next(NextState::Loop(self.loop_point))
    }

    fn set_next(&mut self, next: NextState) -> bool {
        match self.states.last_mut() {
            Some(state) => {
                state.next = next;
                true
            }
            None => false,
        }
    }

    /// Expand a frame template into one record per frame letter.
    ///
    /// Returns the emitted count; a negative count reports that at least one
    /// letter was invalid (invalid letters emit frame 0 so the magnitude
    /// still matches the number of records appended). `#` holds the frame
    /// letter of the previously emitted record.
    pub fn add_frames(&mut self, template: &FrameDef, letters: &str) -> i32 {
        let mut count = 0i32;
        let mut bad = false;
        for c in letters.chars() {
            let frame = if c == '#' {
                self.states.last().map_or(0, |s| s.frame)
            } else {
                match frame_index(c) {
                    Some(frame) => frame,
                    None => {
                        bad = true;
                        0
                    }
                }
            };
            let mut state = template.clone();
            state.frame = frame;
            self.states.push(state);
            count += 1;
        }
        if bad {
            -count
        } else {
            count
        }
    }

    /// Resolve every recorded `Goto` target into a concrete frame index.
    /// Targets may carry a trailing `+N` relative offset.
    pub fn resolve_gotos(&mut self) -> Result<(), Vec<StateTableError>> {
        let mut resolved = Vec::new();
        let mut errors = Vec::new();
        for (index, state) in self.states.iter().enumerate() {
            let NextState::Goto { target } = &state.next else {
                continue;
            };
            let (label, offset) = match target.split_once('+') {
                Some((label, suffix)) => match suffix.parse::<usize>() {
                    Ok(offset) => (label, offset),
                    Err(_) => {
                        errors.push(StateTableError::BadGotoOffset(target.clone()));
                        continue;
                    }
                },
                None => (target.as_str(), 0),
            };
            match self.label_index(label) {
                Some(base) if base + offset < self.states.len() => {
                    resolved.push((index, base + offset));
                }
                Some(_) => errors.push(StateTableError::GotoOffsetOutOfRange(target.clone())),
                None => errors.push(StateTableError::UnknownGotoTarget(target.clone())),
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        for (index, jump) in resolved {
            self.states[index].next = NextState::Jump(jump);
        }
        Ok(())
    }
}

/// Map a frame letter to its index: `A`–`Z`, then `[`, `\`, `]`
fn frame_index(c: char) -> Option<usize> {
    let c = c.to_ascii_uppercase();
    match c {
        'A'..='Z' => Some(c as usize - 'A' as usize),
        '[' => Some(26),
        '\\' => Some(27),
        ']' => Some(MAX_FRAME),
        _ => None,
    }
}
