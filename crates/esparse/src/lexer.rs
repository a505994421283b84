//! Lexer (tokenizer) for ECMAScript.
//!
//! The lexer converts source text into tokens on demand. It never decides
//! between regex and division on its own: `/` and `/=` are always scanned as
//! punctuators and the parser asks for [`Lexer::rescan_regex`] when it is at
//! the start of an expression. Template continuations after `}` are rescanned
//! the same way.

use crate::error::{ErrorCode, ParseError, Result};
use crate::span::Span;
use crate::token::{keyword_from_str, TemplateChunk, Token, TokenFlags, TokenKind};

/// A saved lexer position for bounded lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerCheckpoint {
    pos: usize,
}

/// The lexer state.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    /// Source code as bytes (for fast indexing).
    bytes: &'a [u8],
    /// Current byte position.
    pos: usize,
    /// Start position of the current token.
    token_start: usize,
    /// Flags collected for the current token.
    flags: TokenFlags,
    /// Module goal: HTML-like comments are errors.
    module: bool,
}

/// A decoded escape sequence in a string or template.
enum Escape {
    Char(char),
    /// `\0` not followed by a decimal digit.
    Nul,
    /// Backslash followed by a line terminator.
    LineContinuation,
    /// `\1`..`\377`, or `\0` followed by a digit.
    LegacyOctal(char),
    /// `\8` or `\9`.
    NonOctalDecimal(char),
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str, module: bool) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            token_start: 0,
            flags: TokenFlags::empty(),
            module,
        }
    }

    /// Get the current byte position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn checkpoint(&self) -> LexerCheckpoint {
        LexerCheckpoint { pos: self.pos }
    }

    pub fn rewind(&mut self, checkpoint: LexerCheckpoint) {
        self.pos = checkpoint.pos;
    }

    /// Scan the token after the current one without consuming it.
    pub fn lookahead(&mut self) -> Result<Token> {
        let saved = self.checkpoint();
        let token = self.next_token();
        self.rewind(saved);
        token
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.flags = TokenFlags::empty();
        if self.pos == 0 {
            self.skip_hashbang();
        }
        self.skip_trivia()?;
        self.token_start = self.pos;

        let Some(ch) = self.current_char() else {
            return Ok(self.make_token(TokenKind::Eof));
        };

        let kind = match ch {
            // Identifiers and keywords
            'a'..='z' | 'A'..='Z' | '_' | '$' | '\\' => self.scan_identifier_or_keyword()?,

            // Numbers
            '0'..='9' => self.scan_number()?,

            // Strings
            '"' | '\'' => self.scan_string(ch)?,

            // Template literals
            '`' => {
                self.advance();
                self.scan_template_chunk(true)?
            }

            // Punctuation and operators
            '(' => { self.advance(); TokenKind::LParen }
            ')' => { self.advance(); TokenKind::RParen }
            '{' => { self.advance(); TokenKind::LBrace }
            '}' => { self.advance(); TokenKind::RBrace }
            '[' => { self.advance(); TokenKind::LBracket }
            ']' => { self.advance(); TokenKind::RBracket }
            ';' => { self.advance(); TokenKind::Semicolon }
            ',' => { self.advance(); TokenKind::Comma }
            ':' => { self.advance(); TokenKind::Colon }
            '@' => { self.advance(); TokenKind::At }
            '~' => { self.advance(); TokenKind::Tilde }
            '#' => self.scan_private_name()?,

            '.' => self.scan_dot()?,
            '?' => self.scan_question(),
            '+' => self.scan_plus(),
            '-' => self.scan_minus(),
            '*' => self.scan_star(),
            '/' => self.scan_slash(),
            '%' => self.scan_percent(),
            '=' => self.scan_equals(),
            '!' => self.scan_bang(),
            '<' => self.scan_less_than(),
            '>' => self.scan_greater_than(),
            '&' => self.scan_ampersand(),
            '|' => self.scan_pipe(),
            '^' => self.scan_caret(),

            c if is_id_start(c) => self.scan_identifier_or_keyword()?,

            c => {
                self.pos += c.len_utf8();
                return Err(self.error(ErrorCode::InvalidCharacter(c)));
            }
        };

        Ok(self.make_token(kind))
    }

    /// Rescan a `/` or `/=` token as a regular expression literal.
    pub fn rescan_regex(&mut self, slash: &Token) -> Result<Token> {
        self.token_start = slash.span.start as usize;
        self.pos = self.token_start + 1;
        self.flags = slash.flags;

        let body_start = self.pos;
        let mut in_class = false;
        loop {
            let Some(c) = self.current_char() else {
                return Err(self.error(ErrorCode::UnterminatedRegExp));
            };
            if is_line_terminator(c) {
                return Err(self.error(ErrorCode::UnterminatedRegExp));
            }
            match c {
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some(next) if !is_line_terminator(next) => self.pos += next.len_utf8(),
                        _ => return Err(self.error(ErrorCode::UnterminatedRegExp)),
                    }
                    continue;
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => break,
                _ => {}
            }
            self.pos += c.len_utf8();
        }
        let pattern = self.slice(body_start, self.pos).to_string();
        self.advance(); // Skip closing /

        let flags_start = self.pos;
        while let Some(c) = self.current_char() {
            if c == '\\' {
                return Err(self.error(ErrorCode::InvalidRegExpFlags));
            }
            if !is_id_continue(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        let flags = self.slice(flags_start, self.pos).to_string();

        Ok(self.make_token(TokenKind::Regex { pattern, flags }))
    }

    /// Rescan a `}` token as the continuation of a template literal.
    pub fn rescan_template_continuation(&mut self, rbrace: &Token) -> Result<Token> {
        self.token_start = rbrace.span.start as usize;
        self.pos = self.token_start + 1;
        self.flags = rbrace.flags;
        let kind = self.scan_template_chunk(false)?;
        Ok(self.make_token(kind))
    }

    // === Helper methods ===

    fn current(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(0)
    }

    fn current_char(&self) -> Option<char> {
        self.source.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    fn peek_char(&self) -> u8 {
        self.bytes.get(self.pos + 1).copied().unwrap_or(0)
    }

    fn peek_char_n(&self, n: usize) -> u8 {
        self.bytes.get(self.pos + n).copied().unwrap_or(0)
    }

    /// Advance past one ASCII byte.
    fn advance(&mut self) {
        self.pos += 1;
    }

    fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(
            kind,
            Span::new(self.token_start as u32, self.pos as u32),
            self.flags,
        )
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        self.source.get(start..end).unwrap_or("")
    }

    fn error(&self, code: ErrorCode) -> ParseError {
        ParseError::new(code, Span::new(self.token_start as u32, self.pos as u32))
    }

    fn error_at(&self, code: ErrorCode, start: usize) -> ParseError {
        ParseError::new(code, Span::new(start as u32, self.pos as u32))
    }

    // === Whitespace and comments ===

    fn skip_hashbang(&mut self) {
        if self.bytes.starts_with(b"#!") {
            self.skip_line_comment(2);
        }
    }

    fn skip_trivia(&mut self) -> Result<()> {
        let at_start_of_input = self.pos == 0;
        loop {
            match self.current() {
                b' ' | b'\t' | 0x0B | 0x0C => self.advance(),
                b'\n' | b'\r' => {
                    self.advance();
                    self.flags |= TokenFlags::NEWLINE_BEFORE;
                }
                b'/' if self.peek_char() == b'/' => self.skip_line_comment(2),
                b'/' if self.peek_char() == b'*' => self.skip_block_comment()?,
                b'<' if self.peek_char() == b'!'
                    && self.peek_char_n(2) == b'-'
                    && self.peek_char_n(3) == b'-' =>
                {
                    self.skip_html_comment(4)?;
                }
                b'-' if self.peek_char() == b'-'
                    && self.peek_char_n(2) == b'>'
                    && (at_start_of_input || self.flags.contains(TokenFlags::NEWLINE_BEFORE)) =>
                {
                    self.skip_html_comment(3)?;
                }
                b if b >= 0x80 => match self.current_char() {
                    Some(c) if is_line_terminator(c) => {
                        self.pos += c.len_utf8();
                        self.flags |= TokenFlags::NEWLINE_BEFORE;
                    }
                    Some(c) if is_whitespace(c) => self.pos += c.len_utf8(),
                    _ => break,
                },
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_line_comment(&mut self, prefix: usize) {
        self.advance_n(prefix);
        while let Some(c) = self.current_char() {
            if is_line_terminator(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn skip_html_comment(&mut self, prefix: usize) -> Result<()> {
        if self.module {
            let start = self.pos;
            self.advance_n(prefix);
            return Err(self.error_at(ErrorCode::HtmlCommentInModule, start));
        }
        self.flags |= TokenFlags::HTML_COMMENT_BEFORE;
        self.skip_line_comment(prefix);
        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        let start = self.pos;
        self.advance_n(2); // Skip /*
        while let Some(c) = self.current_char() {
            if c == '*' && self.peek_char() == b'/' {
                self.advance_n(2);
                return Ok(());
            }
            if is_line_terminator(c) {
                self.flags |= TokenFlags::NEWLINE_BEFORE;
            }
            self.pos += c.len_utf8();
        }
        Err(self.error_at(ErrorCode::UnterminatedComment, start))
    }

    // === Token scanning ===

    fn scan_identifier_or_keyword(&mut self) -> Result<TokenKind> {
        let (name, escaped) = self.scan_identifier_name()?;
        if escaped {
            self.flags |= TokenFlags::ESCAPED;
            return Ok(TokenKind::Identifier(name));
        }
        Ok(keyword_from_str(&name).unwrap_or(TokenKind::Identifier(name)))
    }

    /// Scan an `IdentifierName`, decoding unicode escapes.
    fn scan_identifier_name(&mut self) -> Result<(String, bool)> {
        let mut name = String::new();
        let mut escaped = false;
        loop {
            let first = name.is_empty();
            match self.current() {
                b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' => {
                    name.push(self.current() as char);
                    self.advance();
                }
                b'0'..=b'9' if !first => {
                    name.push(self.current() as char);
                    self.advance();
                }
                b'\\' => {
                    let start = self.pos;
                    self.advance();
                    if self.current() != b'u' {
                        return Err(self.error_at(ErrorCode::InvalidUnicodeEscape, start));
                    }
                    self.advance();
                    let c = self
                        .scan_unicode_escape_value()
                        .and_then(char::from_u32)
                        .ok_or_else(|| self.error_at(ErrorCode::InvalidUnicodeEscape, start))?;
                    let valid = if first { is_id_start(c) } else { is_id_continue(c) };
                    if !valid {
                        return Err(self.error_at(ErrorCode::InvalidUnicodeEscape, start));
                    }
                    name.push(c);
                    escaped = true;
                }
                b if b >= 0x80 => match self.current_char() {
                    Some(c) if (first && is_id_start(c)) || (!first && is_id_continue(c)) => {
                        name.push(c);
                        self.pos += c.len_utf8();
                    }
                    _ => break,
                },
                _ => break,
            }
        }
        Ok((name, escaped))
    }

    fn scan_private_name(&mut self) -> Result<TokenKind> {
        self.advance(); // Skip #
        match self.current_char() {
            Some(c) if c == '\\' || is_id_start(c) => {
                let (name, _) = self.scan_identifier_name()?;
                Ok(TokenKind::PrivateName(name))
            }
            _ => Err(self.error(ErrorCode::InvalidCharacter('#'))),
        }
    }

    fn scan_number(&mut self) -> Result<TokenKind> {
        let start = self.pos;

        // Handle different number formats
        if self.current() == b'0' {
            match self.peek_char() {
                b'x' | b'X' => return self.scan_radix_number(16),
                b'o' | b'O' => return self.scan_radix_number(8),
                b'b' | b'B' => return self.scan_radix_number(2),
                b'0'..=b'9' => return self.scan_legacy_octal_like(),
                b'_' => {
                    self.advance_n(2);
                    return Err(self.error(ErrorCode::InvalidNumericSeparator));
                }
                _ => {}
            }
        }

        let mut is_integer = true;

        // Decimal integer part (absent for `.5`)
        if self.current() != b'.' {
            self.scan_digits(10)?;
        }

        // Fraction
        if self.current() == b'.' {
            self.advance();
            is_integer = false;
            if self.current() == b'_' {
                return Err(self.error(ErrorCode::InvalidNumericSeparator));
            }
            self.scan_digits(10)?;
        }

        // Exponent
        if matches!(self.current(), b'e' | b'E') {
            self.advance();
            is_integer = false;
            if matches!(self.current(), b'+' | b'-') {
                self.advance();
            }
            if self.scan_digits(10)? == 0 {
                return Err(self.error(ErrorCode::InvalidNumber));
            }
        }

        if self.current() == b'n' {
            if !is_integer {
                self.advance();
                return Err(self.error(ErrorCode::InvalidBigInt));
            }
            let digits = self.slice(start, self.pos).replace('_', "");
            self.advance();
            self.check_after_number()?;
            return Ok(TokenKind::BigInt(digits));
        }

        let text = self.slice(start, self.pos).replace('_', "");
        let value = text
            .parse::<f64>()
            .map_err(|_| self.error(ErrorCode::InvalidNumber))?;
        self.check_after_number()?;
        Ok(TokenKind::Number(value))
    }

    /// `0x`, `0o` and `0b` literals.
    fn scan_radix_number(&mut self, radix: u32) -> Result<TokenKind> {
        let start = self.pos;
        self.advance_n(2); // Skip 0x
        if self.current() == b'_' {
            return Err(self.error(ErrorCode::InvalidNumericSeparator));
        }
        if self.scan_digits(radix)? == 0 {
            return Err(self.error(ErrorCode::InvalidNumber));
        }
        let text = self.slice(start, self.pos).replace('_', "");
        if self.current() == b'n' {
            self.advance();
            self.check_after_number()?;
            return Ok(TokenKind::BigInt(text));
        }
        let value = text[2..].chars().fold(0f64, |acc, c| {
            acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
        });
        self.check_after_number()?;
        Ok(TokenKind::Number(value))
    }

    /// `017` (legacy octal) and `089` (non-octal decimal integer).
    fn scan_legacy_octal_like(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        while self.current().is_ascii_digit() {
            self.advance();
        }
        if self.current() == b'_' {
            self.advance();
            return Err(self.error(ErrorCode::InvalidNumericSeparator));
        }
        let digits = self.slice(start, self.pos);
        let value = if digits.bytes().all(|b| b < b'8') {
            self.flags |= TokenFlags::LEGACY_OCTAL;
            digits
                .chars()
                .fold(0f64, |acc, c| acc * 8.0 + f64::from(c.to_digit(8).unwrap_or(0)))
        } else {
            self.flags |= TokenFlags::NON_OCTAL_DECIMAL;
            if self.current() == b'.' {
                self.advance();
                self.scan_digits(10)?;
            }
            if matches!(self.current(), b'e' | b'E') {
                self.advance();
                if matches!(self.current(), b'+' | b'-') {
                    self.advance();
                }
                if self.scan_digits(10)? == 0 {
                    return Err(self.error(ErrorCode::InvalidNumber));
                }
            }
            self.slice(start, self.pos)
                .parse::<f64>()
                .map_err(|_| self.error(ErrorCode::InvalidNumber))?
        };
        if self.current() == b'n' {
            self.advance();
            return Err(self.error(ErrorCode::InvalidBigInt));
        }
        self.check_after_number()?;
        Ok(TokenKind::Number(value))
    }

    /// Scan digits of the given radix with numeric separators. Returns the
    /// number of digits seen.
    fn scan_digits(&mut self, radix: u32) -> Result<usize> {
        let mut count = 0;
        let mut last_was_separator = false;
        loop {
            let b = self.current();
            if b == b'_' {
                if count == 0 || last_was_separator {
                    self.advance();
                    return Err(self.error(ErrorCode::InvalidNumericSeparator));
                }
                last_was_separator = true;
                self.advance();
            } else if (b as char).is_digit(radix) {
                count += 1;
                last_was_separator = false;
                self.advance();
            } else {
                break;
            }
        }
        if last_was_separator {
            return Err(self.error(ErrorCode::InvalidNumericSeparator));
        }
        Ok(count)
    }

    /// A numeric literal may not be directly followed by an identifier or digit.
    fn check_after_number(&mut self) -> Result<()> {
        match self.current_char() {
            Some(c) if c.is_ascii_digit() || c == '\\' || is_id_start(c) => {
                self.pos += c.len_utf8();
                Err(self.error(ErrorCode::IdentifierAfterNumber))
            }
            _ => Ok(()),
        }
    }

    fn scan_string(&mut self, quote: char) -> Result<TokenKind> {
        self.advance(); // Skip opening quote
        let mut value = String::new();
        loop {
            let Some(c) = self.current_char() else {
                return Err(self.error(ErrorCode::UnterminatedString));
            };
            match c {
                _ if c == quote => {
                    self.advance();
                    break;
                }
                '\\' => {
                    let escape_start = self.pos;
                    self.advance();
                    match self.scan_escape_sequence() {
                        Ok(Escape::Char(ch)) => value.push(ch),
                        Ok(Escape::Nul) => {
                            self.flags |= TokenFlags::ZERO_ESCAPE;
                            value.push('\0');
                        }
                        Ok(Escape::LineContinuation) => {}
                        Ok(Escape::LegacyOctal(ch)) => {
                            self.flags |= TokenFlags::LEGACY_OCTAL;
                            value.push(ch);
                        }
                        Ok(Escape::NonOctalDecimal(ch)) => {
                            self.flags |= TokenFlags::NON_OCTAL_DECIMAL;
                            value.push(ch);
                        }
                        Err(code) => return Err(self.error_at(code, escape_start)),
                    }
                }
                '\n' | '\r' => return Err(self.error(ErrorCode::UnterminatedString)),
                _ => {
                    value.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
        Ok(TokenKind::String(value))
    }

    /// Decode an escape sequence; the backslash has been consumed.
    fn scan_escape_sequence(&mut self) -> std::result::Result<Escape, ErrorCode> {
        let Some(c) = self.current_char() else {
            return Err(ErrorCode::InvalidEscape);
        };
        self.pos += c.len_utf8();
        let escape = match c {
            'n' => Escape::Char('\n'),
            't' => Escape::Char('\t'),
            'r' => Escape::Char('\r'),
            'b' => Escape::Char('\u{8}'),
            'f' => Escape::Char('\u{C}'),
            'v' => Escape::Char('\u{B}'),
            '0' if !self.current().is_ascii_digit() => Escape::Nul,
            '0'..='7' => {
                let mut value = c as u32 - '0' as u32;
                let max_extra = if c <= '3' { 2 } else { 1 };
                for _ in 0..max_extra {
                    match self.current() {
                        d @ b'0'..=b'7' => {
                            value = value * 8 + u32::from(d - b'0');
                            self.advance();
                        }
                        _ => break,
                    }
                }
                Escape::LegacyOctal(char::from_u32(value).unwrap_or('\0'))
            }
            '8' | '9' => Escape::NonOctalDecimal(c),
            'x' => {
                let hi = self.hex_digit_at(0).ok_or(ErrorCode::InvalidEscape)?;
                let lo = self.hex_digit_at(1).ok_or(ErrorCode::InvalidEscape)?;
                self.advance_n(2);
                Escape::Char(char::from_u32(hi * 16 + lo).unwrap_or('\u{FFFD}'))
            }
            'u' => {
                let unit = self
                    .scan_unicode_escape_value()
                    .ok_or(ErrorCode::InvalidUnicodeEscape)?;
                Escape::Char(self.combine_surrogates(unit))
            }
            '\r' => {
                if self.current() == b'\n' {
                    self.advance();
                }
                Escape::LineContinuation
            }
            '\n' | '\u{2028}' | '\u{2029}' => Escape::LineContinuation,
            other => Escape::Char(other),
        };
        Ok(escape)
    }

    fn hex_digit_at(&self, offset: usize) -> Option<u32> {
        (self.peek_char_n(offset) as char).to_digit(16)
    }

    /// Scan the part of a unicode escape after `\u`: either `XXXX` or
    /// `{X...}`. Returns the code point or UTF-16 code unit.
    fn scan_unicode_escape_value(&mut self) -> Option<u32> {
        if self.current() == b'{' {
            self.advance();
            let mut value: u32 = 0;
            let mut digits = 0;
            while let Some(d) = (self.current() as char).to_digit(16) {
                value = value.checked_mul(16)?.checked_add(d)?;
                if value > 0x10FFFF {
                    return None;
                }
                digits += 1;
                self.advance();
            }
            if digits == 0 || self.current() != b'}' {
                return None;
            }
            self.advance();
            Some(value)
        } else {
            let mut value = 0;
            for offset in 0..4 {
                value = value * 16 + self.hex_digit_at(offset)?;
            }
            self.advance_n(4);
            Some(value)
        }
    }

    /// Turn a code unit into a char, pairing a high surrogate with an
    /// immediately following `\uXXXX` low surrogate. Lone surrogates become
    /// U+FFFD since they cannot be represented in a Rust string.
    fn combine_surrogates(&mut self, unit: u32) -> char {
        if (0xD800..0xDC00).contains(&unit)
            && self.current() == b'\\'
            && self.peek_char() == b'u'
        {
            let saved = self.pos;
            self.advance_n(2);
            match self.scan_unicode_escape_value() {
                Some(low) if (0xDC00..0xE000).contains(&low) => {
                    let combined = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                    return char::from_u32(combined).unwrap_or('\u{FFFD}');
                }
                _ => self.pos = saved,
            }
        }
        char::from_u32(unit).unwrap_or('\u{FFFD}')
    }

    /// Scan template characters up to and including the closing backtick or
    /// `${`. `head` is true when the chunk started with a backtick.
    fn scan_template_chunk(&mut self, head: bool) -> Result<TokenKind> {
        let mut cooked = String::new();
        let mut raw = String::new();
        let mut invalid_escape: Option<Span> = None;
        let tail = loop {
            let Some(c) = self.current_char() else {
                return Err(self.error(ErrorCode::UnterminatedTemplate));
            };
            match c {
                '`' => {
                    self.advance();
                    break true;
                }
                '$' if self.peek_char() == b'{' => {
                    self.advance_n(2);
                    break false;
                }
                '\\' => {
                    let escape_start = self.pos;
                    self.advance();
                    match self.scan_escape_sequence() {
                        Ok(Escape::Char(ch)) => cooked.push(ch),
                        Ok(Escape::Nul) => cooked.push('\0'),
                        Ok(Escape::LineContinuation) => {}
                        Ok(Escape::LegacyOctal(_) | Escape::NonOctalDecimal(_)) | Err(_) => {
                            invalid_escape.get_or_insert(Span::new(
                                escape_start as u32,
                                self.pos as u32,
                            ));
                        }
                    }
                    let text = self.slice(escape_start, self.pos);
                    raw.push_str(&normalize_line_endings(text));
                }
                '\r' => {
                    self.advance();
                    if self.current() == b'\n' {
                        self.advance();
                    }
                    cooked.push('\n');
                    raw.push('\n');
                }
                _ => {
                    cooked.push(c);
                    raw.push(c);
                    self.pos += c.len_utf8();
                }
            }
        };

        let chunk = TemplateChunk {
            cooked: invalid_escape.is_none().then_some(cooked),
            raw,
            invalid_escape,
        };
        Ok(match (head, tail) {
            (true, true) => TokenKind::TemplateNoSub(chunk),
            (true, false) => TokenKind::TemplateHead(chunk),
            (false, false) => TokenKind::TemplateMiddle(chunk),
            (false, true) => TokenKind::TemplateTail(chunk),
        })
    }

    // === Multi-character operators ===

    fn scan_dot(&mut self) -> Result<TokenKind> {
        if self.peek_char().is_ascii_digit() {
            return self.scan_number();
        }
        self.advance();
        if self.current() == b'.' && self.peek_char() == b'.' {
            self.advance_n(2);
            Ok(TokenKind::Spread)
        } else {
            Ok(TokenKind::Dot)
        }
    }

    fn scan_question(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'?' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::QuestionQuestionEq
                } else {
                    TokenKind::QuestionQuestion
                }
            }
            // `a?.5:b` is a conditional
            b'.' if !self.peek_char().is_ascii_digit() => {
                self.advance();
                TokenKind::QuestionDot
            }
            _ => TokenKind::Question,
        }
    }

    fn scan_plus(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'+' => { self.advance(); TokenKind::PlusPlus }
            b'=' => { self.advance(); TokenKind::PlusEq }
            _ => TokenKind::Plus,
        }
    }

    fn scan_minus(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'-' => { self.advance(); TokenKind::MinusMinus }
            b'=' => { self.advance(); TokenKind::MinusEq }
            _ => TokenKind::Minus,
        }
    }

    fn scan_star(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'*' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::StarStarEq
                } else {
                    TokenKind::StarStar
                }
            }
            b'=' => { self.advance(); TokenKind::StarEq }
            _ => TokenKind::Star,
        }
    }

    fn scan_slash(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'=' => { self.advance(); TokenKind::SlashEq }
            _ => TokenKind::Slash,
        }
    }

    fn scan_percent(&mut self) -> TokenKind {
        self.advance();
        if self.current() == b'=' {
            self.advance();
            TokenKind::PercentEq
        } else {
            TokenKind::Percent
        }
    }

    fn scan_equals(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'=' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::EqEqEq
                } else {
                    TokenKind::EqEq
                }
            }
            b'>' => { self.advance(); TokenKind::Arrow }
            _ => TokenKind::Eq,
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'=' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::BangEqEq
                } else {
                    TokenKind::BangEq
                }
            }
            _ => TokenKind::Bang,
        }
    }

    fn scan_less_than(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'<' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::LtLtEq
                } else {
                    TokenKind::LtLt
                }
            }
            b'=' => { self.advance(); TokenKind::LtEq }
            _ => TokenKind::Lt,
        }
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'>' => {
                self.advance();
                match self.current() {
                    b'>' => {
                        self.advance();
                        if self.current() == b'=' {
                            self.advance();
                            TokenKind::GtGtGtEq
                        } else {
                            TokenKind::GtGtGt
                        }
                    }
                    b'=' => { self.advance(); TokenKind::GtGtEq }
                    _ => TokenKind::GtGt,
                }
            }
            b'=' => { self.advance(); TokenKind::GtEq }
            _ => TokenKind::Gt,
        }
    }

    fn scan_ampersand(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'&' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::AmpAmpEq
                } else {
                    TokenKind::AmpAmp
                }
            }
            b'=' => { self.advance(); TokenKind::AmpEq }
            _ => TokenKind::Amp,
        }
    }

    fn scan_pipe(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'|' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::PipePipeEq
                } else {
                    TokenKind::PipePipe
                }
            }
            b'=' => { self.advance(); TokenKind::PipeEq }
            _ => TokenKind::Pipe,
        }
    }

    fn scan_caret(&mut self) -> TokenKind {
        self.advance();
        if self.current() == b'=' {
            self.advance();
            TokenKind::CaretEq
        } else {
            TokenKind::Caret
        }
    }
}

/// `ID_Start` plus `$` and `_`.
pub fn is_id_start(c: char) -> bool {
    c == '$' || c == '_' || unicode_ident::is_xid_start(c)
}

/// `ID_Continue` plus `$`, ZWNJ and ZWJ.
pub fn is_id_continue(c: char) -> bool {
    c == '$' || c == '\u{200C}' || c == '\u{200D}' || unicode_ident::is_xid_continue(c)
}

pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// ECMAScript `WhiteSpace`: TAB, VT, FF, SP, NBSP, ZWNBSP and category Zs.
pub fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\u{B}'
            | '\u{C}'
            | ' '
            | '\u{A0}'
            | '\u{FEFF}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Result<Vec<Token>> {
        let mut lexer = Lexer::new(source, false);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            if matches!(token.kind, TokenKind::Eof) {
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn tokenize(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn lex_error(source: &str) -> ErrorCode {
        lex(source).unwrap_err().code
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            tokenize("foo bar _baz $qux café"),
            vec![
                TokenKind::Identifier("foo".into()),
                TokenKind::Identifier("bar".into()),
                TokenKind::Identifier("_baz".into()),
                TokenKind::Identifier("$qux".into()),
                TokenKind::Identifier("café".into()),
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            tokenize("const let var function"),
            vec![TokenKind::Const, TokenKind::Let, TokenKind::Var, TokenKind::Function]
        );
    }

    #[test]
    fn test_escaped_keyword_is_identifier() {
        let tokens = lex("\\u0069f a\\u{62}").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier("if".into()));
        assert!(tokens[0].is_escaped());
        assert_eq!(tokens[1].kind, TokenKind::Identifier("ab".into()));
    }

    #[test]
    fn test_invalid_identifier_escape() {
        assert_eq!(lex_error("\\u0031abc"), ErrorCode::InvalidUnicodeEscape);
        assert_eq!(lex_error("a\\x41"), ErrorCode::InvalidUnicodeEscape);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokenize("42 3.14 .5 1e3 0xff 0o17 0b101 1_000_000"),
            vec![
                TokenKind::Number(42.0),
                TokenKind::Number(3.14),
                TokenKind::Number(0.5),
                TokenKind::Number(1000.0),
                TokenKind::Number(255.0),
                TokenKind::Number(15.0),
                TokenKind::Number(5.0),
                TokenKind::Number(1_000_000.0),
            ]
        );
        assert_eq!(tokenize("10n 0x1_Fn"), vec![
            TokenKind::BigInt("10".into()),
            TokenKind::BigInt("0x1F".into()),
        ]);
    }

    #[test]
    fn test_legacy_octal_flags() {
        let tokens = lex("017 089 0.5").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number(15.0));
        assert!(tokens[0].flags.contains(TokenFlags::LEGACY_OCTAL));
        assert_eq!(tokens[1].kind, TokenKind::Number(89.0));
        assert!(tokens[1].flags.contains(TokenFlags::NON_OCTAL_DECIMAL));
        assert!(!tokens[2].has_octal());
    }

    #[test]
    fn test_number_errors() {
        assert_eq!(lex_error("1_"), ErrorCode::InvalidNumericSeparator);
        assert_eq!(lex_error("1__0"), ErrorCode::InvalidNumericSeparator);
        assert_eq!(lex_error("0_1"), ErrorCode::InvalidNumericSeparator);
        assert_eq!(lex_error("1._5"), ErrorCode::InvalidNumericSeparator);
        assert_eq!(lex_error("3in x"), ErrorCode::IdentifierAfterNumber);
        assert_eq!(lex_error("1.5n"), ErrorCode::InvalidBigInt);
        assert_eq!(lex_error("017n"), ErrorCode::InvalidBigInt);
        assert_eq!(lex_error("0x"), ErrorCode::InvalidNumber);
        assert_eq!(lex_error("0b12"), ErrorCode::IdentifierAfterNumber);
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            tokenize(r#""hello" 'world' "a\nb" "\x41B\u{43}" "😀""#),
            vec![
                TokenKind::String("hello".into()),
                TokenKind::String("world".into()),
                TokenKind::String("a\nb".into()),
                TokenKind::String("ABC".into()),
                TokenKind::String("\u{1F600}".into()),
            ]
        );
    }

    #[test]
    fn test_string_line_continuation() {
        assert_eq!(tokenize("'a\\\nb'"), vec![TokenKind::String("ab".into())]);
    }

    #[test]
    fn test_string_octal_flags() {
        let tokens = lex(r#""\0" "\01" "\8" "\08""#).unwrap();
        assert!(!tokens[0].has_octal());
        assert!(tokens[0].flags.contains(TokenFlags::ZERO_ESCAPE));
        assert!(tokens[1].flags.contains(TokenFlags::LEGACY_OCTAL));
        assert_eq!(tokens[1].kind, TokenKind::String("\u{1}".into()));
        assert!(tokens[2].flags.contains(TokenFlags::NON_OCTAL_DECIMAL));
        assert!(tokens[3].flags.contains(TokenFlags::LEGACY_OCTAL));
        assert_eq!(tokens[3].kind, TokenKind::String("\08".into()));
    }

    #[test]
    fn test_string_errors() {
        assert_eq!(lex_error("'abc"), ErrorCode::UnterminatedString);
        assert_eq!(lex_error("'a\nb'"), ErrorCode::UnterminatedString);
        assert_eq!(lex_error(r#""\u{110000}""#), ErrorCode::InvalidUnicodeEscape);
        assert_eq!(lex_error(r#""\xZ1""#), ErrorCode::InvalidEscape);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokenize("+ - * / % ** ++ -- ?. ?? ??= ... =>"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::StarStar,
                TokenKind::PlusPlus,
                TokenKind::MinusMinus,
                TokenKind::QuestionDot,
                TokenKind::QuestionQuestion,
                TokenKind::QuestionQuestionEq,
                TokenKind::Spread,
                TokenKind::Arrow,
            ]
        );
    }

    #[test]
    fn test_question_dot_digit_is_conditional() {
        assert_eq!(
            tokenize("a?.5:b"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Question,
                TokenKind::Number(0.5),
                TokenKind::Colon,
                TokenKind::Identifier("b".into()),
            ]
        );
    }

    #[test]
    fn test_comments_and_newlines() {
        let tokens = lex("a // line\n/* block */ b /* multi\nline */ c").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(tokens[1].had_newline_before());
        assert!(tokens[2].had_newline_before());
        assert_eq!(lex_error("/* open"), ErrorCode::UnterminatedComment);
    }

    #[test]
    fn test_unicode_whitespace_and_terminators() {
        let tokens = lex("a\u{A0}b\u{2028}c").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(!tokens[1].had_newline_before());
        assert!(tokens[2].had_newline_before());
    }

    #[test]
    fn test_hashbang() {
        assert_eq!(tokenize("#!/usr/bin/env node\nx"), vec![TokenKind::Identifier("x".into())]);
    }

    #[test]
    fn test_html_comments() {
        let tokens = lex("a <!-- comment\n--> also comment\nb").unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(tokens[1].flags.contains(TokenFlags::HTML_COMMENT_BEFORE));

        // `-->` mid-line is a decrement followed by `>`
        assert_eq!(
            tokenize("a --> b"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::MinusMinus,
                TokenKind::Gt,
                TokenKind::Identifier("b".into()),
            ]
        );

        let mut lexer = Lexer::new("<!-- x", true);
        assert_eq!(lexer.next_token().unwrap_err().code, ErrorCode::HtmlCommentInModule);
    }

    #[test]
    fn test_template_literal_no_sub() {
        match &tokenize("`hello\\nworld`")[0] {
            TokenKind::TemplateNoSub(chunk) => {
                assert_eq!(chunk.cooked.as_deref(), Some("hello\nworld"));
                assert_eq!(chunk.raw, "hello\\nworld");
            }
            other => panic!("expected template, got {other:?}"),
        }
    }

    #[test]
    fn test_template_continuation() {
        let mut lexer = Lexer::new("`a${x}b`", false);
        assert!(matches!(lexer.next_token().unwrap().kind, TokenKind::TemplateHead(_)));
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier("x".into()));
        let rbrace = lexer.next_token().unwrap();
        assert_eq!(rbrace.kind, TokenKind::RBrace);
        let tail = lexer.rescan_template_continuation(&rbrace).unwrap();
        match tail.kind {
            TokenKind::TemplateTail(chunk) => assert_eq!(chunk.cooked.as_deref(), Some("b")),
            other => panic!("expected template tail, got {other:?}"),
        }
    }

    #[test]
    fn test_template_invalid_escape_is_not_fatal() {
        match &tokenize("`\\unicode and \\01`")[0] {
            TokenKind::TemplateNoSub(chunk) => {
                assert_eq!(chunk.cooked, None);
                assert_eq!(chunk.raw, "\\unicode and \\01");
                assert_eq!(chunk.invalid_escape, Some(Span::new(1, 3)));
            }
            other => panic!("expected template, got {other:?}"),
        }
    }

    #[test]
    fn test_template_normalizes_carriage_returns() {
        match &tokenize("`a\r\nb`")[0] {
            TokenKind::TemplateNoSub(chunk) => {
                assert_eq!(chunk.cooked.as_deref(), Some("a\nb"));
                assert_eq!(chunk.raw, "a\nb");
            }
            other => panic!("expected template, got {other:?}"),
        }
    }

    #[test]
    fn test_regex_rescan() {
        let mut lexer = Lexer::new("/[/]\\//gi", false);
        let slash = lexer.next_token().unwrap();
        assert_eq!(slash.kind, TokenKind::Slash);
        let regex = lexer.rescan_regex(&slash).unwrap();
        assert_eq!(
            regex.kind,
            TokenKind::Regex {
                pattern: "[/]\\/".into(),
                flags: "gi".into()
            }
        );
        assert_eq!(regex.span, Span::new(0, 9));
    }

    #[test]
    fn test_unterminated_regex() {
        let mut lexer = Lexer::new("/abc\n/", false);
        let slash = lexer.next_token().unwrap();
        assert_eq!(
            lexer.rescan_regex(&slash).unwrap_err().code,
            ErrorCode::UnterminatedRegExp
        );
    }

    #[test]
    fn test_private_name() {
        assert_eq!(tokenize("#x"), vec![TokenKind::PrivateName("x".into())]);
        assert_eq!(lex_error("# x"), ErrorCode::InvalidCharacter('#'));
    }

    #[test]
    fn test_lookahead_does_not_consume() {
        let mut lexer = Lexer::new("a b", false);
        lexer.next_token().unwrap();
        let peeked = lexer.lookahead().unwrap();
        let next = lexer.next_token().unwrap();
        assert_eq!(peeked, next);
    }
}
