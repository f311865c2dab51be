//! Module `scanner` implements a one-pass, streaming lexer for the Rox
//! language.
//!
//! It transforms a byte slice (`&[u8]`) into a sequence of `Token<'a>`s,
//! skipping whitespace and `//` comments, and emitting exactly one `EOF`
//! token at the end.  The scanner is a `FusedIterator` over
//! `Result<Token<'a>>`: a lex error (unexpected character, unterminated
//! string) is yielded in place of a token and scanning continues with the
//! following byte, so a single pass surfaces every lexical problem in the
//! file.
//!
//! Tokens borrow their lexemes from the source buffer, so the only
//! allocations are the contents of string literals.  Keywords resolve
//! through a compile-time perfect-hash map; `//` comments are skipped in
//! bulk with `memchr`.

use crate::error::{Result, RoxError};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile-time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// A single-pass **scanner / lexer** that converts raw source bytes into a
/// sequence of [`Token`]s.  The lifetime `'a` ties every emitted token's
/// `lexeme` slice back to the original source buffer.
pub struct Scanner<'a> {
    src: &'a [u8],     // entire source buffer
    start: usize,      // index of the first byte of the current lexeme
    current: usize,    // index one past the last byte examined
    line: usize,       // 1-based line counter (incremented on \n)
    emitted_eof: bool, // exactly one EOF token is produced
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(src: &'a [u8]) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            current: 0,
            line: 1,
            emitted_eof: false,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    /// Are we at (or past) the end of input?
    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.current >= self.src.len()
    }

    /// Advance one byte and return it.  Callers guard with [`Self::is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.current];
        self.current += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` past EOF
    /// to avoid branching at call sites.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.current]
        }
    }

    /// Peek one byte beyond [`Self::peek`].  Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.src.len() {
            0
        } else {
            self.src[self.current + 1]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.current += 1;
            true
        } else {
            false
        }
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a single lexeme starting at `self.start`.  `Ok(Some(tt))` is a
    /// recognised token kind, `Ok(None)` means the lexeme was whitespace or
    /// a comment and produced nothing.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let b = self.advance();

        let tt = match b {
            // ── single-character punctuators ──────────────────────────────
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,

            // ── one-or-two-character operators ────────────────────────────
            b'!' => {
                if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                }
            }

            b'=' => {
                if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                }
            }

            b'<' => {
                if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                }
            }

            b'>' => {
                if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                }
            }

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => return Ok(None),

            b'\n' => {
                self.line += 1;

                return Ok(None);
            }

            // ── comments (// ... until newline) ──────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    // Fast-forward to the next newline with `memchr`; if none
                    // remains, skip to EOF.  The newline itself is left for
                    // the next round so line counting stays in one place.
                    match memchr(b'\n', &self.src[self.current..]) {
                        Some(pos) => self.current += pos,
                        None => self.current = self.src.len(),
                    }

                    return Ok(None);
                }

                TokenType::SLASH
            }

            // ── string literal " ... " ───────────────────────────────────
            b'"' => return self.string().map(Some),

            // ── number literal (digit-leading) ───────────────────────────
            b'0'..=b'9' => self.number(),

            // ── identifiers / keywords (alpha or underscore-leading) ─────
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            // ── unexpected character ─────────────────────────────────────
            _ => {
                return Err(RoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", b as char),
                ));
            }
        };

        Ok(Some(tt))
    }

    /// Scan a double-quoted string literal.
    ///
    /// `self.start` still points at the opening `"`; on success `self.current`
    /// points past the closing one.  Strings may span lines.
    fn string(&mut self) -> Result<TokenType> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(RoxError::lex(self.line, "Unterminated string."));
        }

        self.advance(); // closing quote

        // Contents without the surrounding quotes.  This is the one place a
        // lexeme can hold non-ASCII bytes, so the conversion is checked.
        let slice: &[u8] = &self.src[self.start + 1..self.current - 1];

        match std::str::from_utf8(slice) {
            Ok(s) => Ok(TokenType::STRING(s.to_owned())),
            Err(_) => Err(RoxError::lex(self.line, "Invalid UTF-8 in string.")),
        }
    }

    /// Scan a numeric literal (`123`, `3.14`).  The fractional part is
    /// optional; a trailing `.` belongs to the next token.
    fn number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let slice: &[u8] = &self.src[self.start..self.current];

        // SAFETY: the slice is ASCII digits and at most one '.' by
        // construction.
        let s: &str = unsafe { std::str::from_utf8_unchecked(slice) };

        // Cannot fail for a digits[.digits] lexeme.
        TokenType::NUMBER(s.parse::<f64>().unwrap_or(0.0))
    }

    /// Scan an identifier and decide whether it is a **keyword** or a plain
    /// `IDENTIFIER`.
    fn identifier(&mut self) -> TokenType {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.src[self.start..self.current];

        KEYWORDS.get(slice).cloned().unwrap_or(TokenType::IDENTIFIER)
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        // Loop until we emit a token, yield an error, or reach EOF.
        loop {
            if self.is_at_end() {
                if self.emitted_eof {
                    return None;
                }

                self.emitted_eof = true;

                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.current;

            match self.scan_token() {
                Err(e) => return Some(Err(e)),

                Ok(None) => continue, // whitespace / comment

                Ok(Some(tt)) => {
                    let slice: &[u8] = &self.src[self.start..self.current];

                    // SAFETY: every token-producing path leaves only ASCII
                    // bytes in the lexeme, except string literals whose
                    // contents were UTF-8 checked in `string`.
                    let lexeme: &str = unsafe { std::str::from_utf8_unchecked(slice) };

                    debug!("Scanned token ({:?}) on line {}", tt, self.line);

                    return Some(Ok(Token::new(tt, lexeme, self.line)));
                }
            }
        }
    }
}

impl FusedIterator for Scanner<'_> {}
