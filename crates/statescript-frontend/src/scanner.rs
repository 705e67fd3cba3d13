//! String-token scanning for state-definition blocks
//!
//! The scanner converts a state block into a stream of loosely typed string
//! tokens. It is deliberately simpler than a full language lexer: the state
//! grammar is line-sensitive and keyword matching is case-insensitive, so
//! consumers mostly compare token text. A one-token pushback buffer supports
//! the single-token lookahead the label grammar needs.

use crate::diagnostic::SourcePos;

/// Classification of scanned tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier-like word (sprite names, frame letters, keywords)
    Ident,
    /// Integer or decimal literal; a leading `-` folds into the literal,
    /// a leading `+` never does
    Number,
    /// Quoted string literal (quotes stripped)
    Str,
    /// Single punctuation character, or the two-character `::`
    Punct,
}

/// One scanned token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: SourcePos,
    /// True if this token started on a later line than the previous token
    pub crossed: bool,
}

impl Token {
    /// Case-insensitive text comparison
    pub fn is(&self, text: &str) -> bool {
        self.text.eq_ignore_ascii_case(text)
    }

    /// Parse the token as an integer, saturating at the i32 range
    pub fn int_value(&self) -> Option<i32> {
        if self.kind != TokenKind::Number {
            return None;
        }
        match self.text.parse::<i64>() {
            Ok(v) => Some(v.clamp(i32::MIN as i64, i32::MAX as i64) as i32),
            Err(_) => None,
        }
    }
}

/// Scanner state for tokenizing a state block
pub struct Scanner {
    chars: Vec<char>,
    current: usize,
    line: u32,
    column: u32,
    /// Line the previous token ended on, for the crossed flag
    prev_line: u32,
    /// Interpret backslash escapes inside string literals
    escape: bool,
    /// One-token pushback buffer
    pushback: Option<Token>,
}

impl Scanner {
    /// Create a new scanner for the given source text
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            current: 0,
            line: 1,
            column: 1,
            prev_line: 1,
            escape: true,
            pushback: None,
        }
    }

    /// Toggle backslash-escape interpretation in string literals.
    /// State blocks disable escapes for their whole extent.
    pub fn set_escape(&mut self, escape: bool) {
        self.escape = escape;
    }

    /// Read the next token, or None at end of input
    pub fn get(&mut self) -> Option<Token> {
        if let Some(token) = self.pushback.take() {
            self.prev_line = token.pos.line;
            return Some(token);
        }

        self.skip_whitespace_and_comments();
        if self.is_at_end() {
            return None;
        }

        let pos = SourcePos::new(self.line, self.column);
        let crossed = self.line > self.prev_line;
        self.prev_line = self.line;

        let c = self.peek();
        let (kind, text) = if c == '"' {
            self.scan_string()
        } else if c.is_ascii_digit() || (c == '-' && self.peek_next().is_some_and(|n| n.is_ascii_digit())) {
            self.scan_number()
        } else if is_ident_start(c) {
            self.scan_ident()
        } else if c == ':' && self.peek_next() == Some(':') {
            self.advance();
            self.advance();
            (TokenKind::Punct, "::".to_string())
        } else {
            self.advance();
            (TokenKind::Punct, c.to_string())
        };

        Some(Token {
            kind,
            text,
            pos,
            crossed,
        })
    }

    /// Push one token back; the next get() returns it unchanged
    pub fn unget(&mut self, token: Token) {
        debug_assert!(self.pushback.is_none(), "pushback buffer holds one token");
        self.pushback = Some(token);
    }

    /// Consume the next token if its text matches (case-insensitive)
    pub fn check(&mut self, text: &str) -> bool {
        match self.get() {
            Some(token) if token.is(text) => true,
            Some(token) => {
                self.unget(token);
                false
            }
            None => false,
        }
    }

    /// Consume the next token if it is an integer literal
    pub fn check_number(&mut self) -> Option<i32> {
        let token = self.get()?;
        match token.int_value() {
            Some(value) => Some(value),
            None => {
                self.unget(token);
                None
            }
        }
    }

    /// True when no tokens remain
    pub fn at_end(&mut self) -> bool {
        if self.pushback.is_some() {
            return false;
        }
        self.skip_whitespace_and_comments();
        self.is_at_end()
    }

    // === Token scanning ===

    fn scan_ident(&mut self) -> (TokenKind, String) {
        let start = self.current;
        while !self.is_at_end() && is_ident_char(self.peek()) {
            self.advance();
        }
        let text: String = self.chars[start..self.current].iter().collect();
        (TokenKind::Ident, text)
    }

    fn scan_number(&mut self) -> (TokenKind, String) {
        let start = self.current;
        if self.peek() == '-' {
            self.advance();
        }
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            self.advance();
        }
        // One decimal point, digits required after it
        if self.peek() == '.' && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        let text: String = self.chars[start..self.current].iter().collect();
        (TokenKind::Number, text)
    }

    fn scan_string(&mut self) -> (TokenKind, String) {
        self.advance(); // opening quote
        let mut value = String::new();
        while !self.is_at_end() && self.peek() != '"' {
            let c = self.advance();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            }
            if c == '\\' && self.escape && !self.is_at_end() {
                let escaped = self.advance();
                value.push(match escaped {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    other => other,
                });
            } else {
                value.push(c);
            }
        }
        if !self.is_at_end() {
            self.advance(); // closing quote
        }
        (TokenKind::Str, value)
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            if self.is_at_end() {
                return;
            }
            match self.peek() {
                ' ' | '\r' | '\t' => {
                    self.advance();
                }
                '\n' => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                '/' => {
                    if self.peek_next() == Some('/') {
                        while !self.is_at_end() && self.peek() != '\n' {
                            self.advance();
                        }
                    } else if self.peek_next() == Some('*') {
                        self.advance(); // /
                        self.advance(); // *
                        while !self.is_at_end() {
                            if self.peek() == '*' && self.peek_next() == Some('/') {
                                self.advance();
                                self.advance();
                                break;
                            }
                            if self.peek() == '\n' {
                                self.line += 1;
                                self.column = 1;
                            }
                            self.advance();
                        }
                    } else {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    // === Character navigation ===

    fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.current]
        }
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.current + 1).copied()
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }
}

/// Identifier start: letters, underscore, and the frame-hold marker `#`
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '#'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '#'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tokens(source: &str) -> Vec<Token> {
        let mut scanner = Scanner::new(source);
        let mut tokens = Vec::new();
        while let Some(token) = scanner.get() {
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn test_empty_input() {
        let mut scanner = Scanner::new("");
        assert!(scanner.at_end());
        assert_eq!(scanner.get(), None);
    }

    #[test]
    fn test_ident_and_number_tokens() {
        let tokens = all_tokens("POSS AB 5");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].text, "POSS");
        assert_eq!(tokens[1].text, "AB");
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[2].int_value(), Some(5));
    }

    #[test]
    fn test_negative_number_folds() {
        let tokens = all_tokens("-1");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].int_value(), Some(-1));
    }

    #[test]
    fn test_plus_stays_standalone() {
        // `See+2` must stay three tokens so goto offsets parse
        let tokens = all_tokens("See+2");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "See");
        assert_eq!(tokens[1].text, "+");
        assert_eq!(tokens[2].int_value(), Some(2));
    }

    #[test]
    fn test_double_colon_token() {
        let tokens = all_tokens("Super::Missile:");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Super", "::", "Missile", ":"]);
    }

    #[test]
    fn test_hash_ident() {
        let tokens = all_tokens("#### # 4");
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].text, "####");
        assert_eq!(tokens[1].text, "#");
    }

    #[test]
    fn test_decimal_number() {
        let tokens = all_tokens("0.5");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Number);
        // Not an integer
        assert_eq!(tokens[0].int_value(), None);
    }

    #[test]
    fn test_crossed_flag() {
        let tokens = all_tokens("POSS A 5\nBRIGHT FAST");
        assert!(!tokens[0].crossed);
        assert!(!tokens[2].crossed);
        assert!(tokens[3].crossed, "first token of a new line crosses");
        assert!(!tokens[4].crossed, "same-line token does not cross");
    }

    #[test]
    fn test_pushback_preserves_crossed() {
        let mut scanner = Scanner::new("A 0\nGoto");
        scanner.get();
        scanner.get();
        let goto = scanner.get().unwrap();
        assert!(goto.crossed);
        scanner.unget(goto);
        let again = scanner.get().unwrap();
        assert!(again.crossed);
        assert!(again.is("GOTO"));
    }

    #[test]
    fn test_check_consumes_on_match() {
        let mut scanner = Scanner::new("random ( 3 , 5 )");
        assert!(scanner.check("RANDOM"));
        assert!(scanner.check("("));
        assert_eq!(scanner.check_number(), Some(3));
        assert!(!scanner.check(")"));
        assert!(scanner.check(","));
    }

    #[test]
    fn test_string_escape_toggle() {
        let mut scanner = Scanner::new(r#""a\tb" "a\tb""#);
        let interpreted = scanner.get().unwrap();
        assert_eq!(interpreted.text, "a\tb");
        scanner.set_escape(false);
        let literal = scanner.get().unwrap();
        assert_eq!(literal.text, r"a\tb");
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = all_tokens("A // line comment\n/* block */ B");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B"]);
    }

    #[test]
    fn test_case_insensitive_is() {
        let tokens = all_tokens("Bright");
        assert!(tokens[0].is("BRIGHT"));
        assert!(tokens[0].is("bright"));
    }
}
