//! Regular expression literal validation.
//!
//! The parser keeps regex bodies as source text; this module only checks
//! that the body and flags would be accepted by `new RegExp(body, flags)`.
//! Without the `u` or `v` flag the Annex B grammar applies: lone `{`, `}` and
//! `]` are literal characters, unknown escapes are identity escapes and
//! `\8`-style references to missing groups are legacy escapes.

use rustc_hash::FxHashSet;

use crate::error::ErrorCode;
use crate::lexer::{is_id_continue, is_id_start};

/// Parsed regular expression flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegExpFlags {
    pub has_indices: bool,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
    pub dot_all: bool,
    pub unicode: bool,
    pub unicode_sets: bool,
    pub sticky: bool,
}

impl RegExpFlags {
    /// `u` or `v`: the stricter grammar is in effect.
    pub fn unicode_mode(&self) -> bool {
        self.unicode || self.unicode_sets
    }
}

/// Validate a flags string: only `dgimsuvy`, each at most once, and not
/// both `u` and `v`.
pub fn validate_flags(flags: &str) -> Result<RegExpFlags, ErrorCode> {
    let mut parsed = RegExpFlags::default();
    for c in flags.chars() {
        let slot = match c {
            'd' => &mut parsed.has_indices,
            'g' => &mut parsed.global,
            'i' => &mut parsed.ignore_case,
            'm' => &mut parsed.multiline,
            's' => &mut parsed.dot_all,
            'u' => &mut parsed.unicode,
            'v' => &mut parsed.unicode_sets,
            'y' => &mut parsed.sticky,
            _ => return Err(ErrorCode::InvalidRegExpFlags),
        };
        if *slot {
            return Err(ErrorCode::InvalidRegExpFlags);
        }
        *slot = true;
    }
    if parsed.unicode && parsed.unicode_sets {
        return Err(ErrorCode::InvalidRegExpFlags);
    }
    Ok(parsed)
}

/// Validate a pattern body against already validated flags.
pub fn validate_pattern(pattern: &str, flags: RegExpFlags) -> Result<(), ErrorCode> {
    let mut validator = PatternValidator::new(pattern, flags);
    validator
        .validate()
        .map_err(|msg| ErrorCode::InvalidRegExp(format!("/{pattern}/: {msg}")))
}

/// Validate both parts of a regex literal.
pub fn validate(pattern: &str, flags: &str) -> Result<(), ErrorCode> {
    let flags = validate_flags(flags)?;
    validate_pattern(pattern, flags)
}

type PatternResult<T = ()> = Result<T, &'static str>;

struct PatternValidator {
    chars: Vec<char>,
    pos: usize,
    unicode: bool,
    unicode_sets: bool,
    /// Named groups make `\k` a backreference even without `u`.
    has_named_groups: bool,
    group_count: u32,
    max_backreference: u32,
    group_names: FxHashSet<String>,
    backreference_names: Vec<String>,
}

impl PatternValidator {
    fn new(pattern: &str, flags: RegExpFlags) -> Self {
        Self {
            chars: pattern.chars().collect(),
            pos: 0,
            unicode: flags.unicode_mode(),
            unicode_sets: flags.unicode_sets,
            has_named_groups: pattern.contains("(?<") && has_group_name(pattern),
            group_count: 0,
            max_backreference: 0,
            group_names: FxHashSet::default(),
            backreference_names: Vec::new(),
        }
    }

    fn validate(&mut self) -> PatternResult {
        self.disjunction()?;
        if self.pos < self.chars.len() {
            return Err(match self.current() {
                Some(')') => "Unmatched ')'",
                _ => "Lone quantifier brackets",
            });
        }
        if self.unicode && self.max_backreference > self.group_count {
            return Err("Invalid escape");
        }
        if self
            .backreference_names
            .iter()
            .any(|name| !self.group_names.contains(name))
        {
            return Err("Invalid named capture referenced");
        }
        Ok(())
    }

    // === Helpers ===

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.current() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let len = s.chars().count();
        if s.chars().enumerate().all(|(i, c)| self.peek(i) == Some(c)) {
            self.pos += len;
            true
        } else {
            false
        }
    }

    // === Structure ===

    fn disjunction(&mut self) -> PatternResult {
        self.alternative()?;
        while self.eat('|') {
            self.alternative()?;
        }
        Ok(())
    }

    fn alternative(&mut self) -> PatternResult {
        while let Some(c) = self.current() {
            if c == '|' || c == ')' {
                break;
            }
            self.term()?;
        }
        Ok(())
    }

    fn term(&mut self) -> PatternResult {
        let start = self.pos;
        if self.assertion()? {
            // Annex B: lookaheads are quantifiable without `u`.
            let quantifiable = !self.unicode
                && (self.chars[start..].starts_with(&['(', '?', '='])
                    || self.chars[start..].starts_with(&['(', '?', '!']));
            if self.quantifier_ahead() {
                if quantifiable {
                    self.quantifier()?;
                } else {
                    return Err("Nothing to repeat");
                }
            }
            return Ok(());
        }
        self.atom()?;
        if self.quantifier_ahead() {
            self.quantifier()?;
        }
        Ok(())
    }

    fn assertion(&mut self) -> PatternResult<bool> {
        match (self.current(), self.peek(1)) {
            (Some('^' | '$'), _) => {
                self.pos += 1;
                Ok(true)
            }
            (Some('\\'), Some('b' | 'B')) => {
                self.pos += 2;
                Ok(true)
            }
            (Some('('), Some('?')) => {
                let lookaround = self.eat_str("(?=")
                    || self.eat_str("(?!")
                    || self.eat_str("(?<=")
                    || self.eat_str("(?<!");
                if !lookaround {
                    return Ok(false);
                }
                self.disjunction()?;
                if !self.eat(')') {
                    return Err("Unterminated group");
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn quantifier_ahead(&self) -> bool {
        match self.current() {
            Some('*' | '+' | '?') => true,
            Some('{') => self.braced_quantifier_len().is_some(),
            _ => false,
        }
    }

    /// Length of a `{n}`, `{n,}` or `{n,m}` quantifier at the cursor.
    fn braced_quantifier_len(&self) -> Option<usize> {
        let mut i = 1;
        let digits = |i: &mut usize| {
            let start = *i;
            while self.peek(*i).is_some_and(|c| c.is_ascii_digit()) {
                *i += 1;
            }
            *i > start
        };
        if !digits(&mut i) {
            return None;
        }
        if self.peek(i) == Some(',') {
            i += 1;
            digits(&mut i);
        }
        (self.peek(i) == Some('}')).then_some(i + 1)
    }

    fn quantifier(&mut self) -> PatternResult {
        match self.current() {
            Some('*' | '+' | '?') => self.pos += 1,
            Some('{') => {
                let len = self.braced_quantifier_len().ok_or("Incomplete quantifier")?;
                let body: String = self.chars[self.pos + 1..self.pos + len - 1].iter().collect();
                let mut bounds = body.splitn(2, ',');
                let min = bounds.next().and_then(parse_bound);
                let max = bounds.next().filter(|s| !s.is_empty()).and_then(parse_bound);
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err("numbers out of order in {} quantifier");
                    }
                }
                self.pos += len;
            }
            _ => return Err("Nothing to repeat"),
        }
        self.eat('?');
        Ok(())
    }

    fn atom(&mut self) -> PatternResult {
        let Some(c) = self.current() else {
            return Ok(());
        };
        match c {
            '.' => {
                self.pos += 1;
                Ok(())
            }
            '\\' => {
                self.pos += 1;
                self.atom_escape()
            }
            '[' => {
                self.pos += 1;
                if self.unicode_sets {
                    self.class_set()
                } else {
                    self.class_ranges()
                }
            }
            '(' => self.group(),
            '*' | '+' | '?' => Err("Nothing to repeat"),
            '{' => {
                if self.unicode || self.braced_quantifier_len().is_some() {
                    Err(if self.unicode { "Lone quantifier brackets" } else { "Nothing to repeat" })
                } else {
                    self.pos += 1;
                    Ok(())
                }
            }
            '}' | ']' if self.unicode => Err("Lone quantifier brackets"),
            _ => {
                self.pos += 1;
                Ok(())
            }
        }
    }

    fn group(&mut self) -> PatternResult {
        self.pos += 1; // (
        if self.eat('?') {
            match self.current() {
                Some(':') => self.pos += 1,
                Some('<') => {
                    self.pos += 1;
                    let name = self.group_name()?;
                    if !self.group_names.insert(name) {
                        return Err("Duplicate capture group name");
                    }
                    self.group_count += 1;
                }
                Some('i' | 'm' | 's' | '-') => self.modifiers()?,
                _ => return Err("Invalid group"),
            }
        } else {
            self.group_count += 1;
        }
        self.disjunction()?;
        if !self.eat(')') {
            return Err("Unterminated group");
        }
        Ok(())
    }

    /// `(?ims-ims:` inline modifiers.
    fn modifiers(&mut self) -> PatternResult {
        let mut seen = FxHashSet::default();
        let mut any = false;
        let mut removing = false;
        while let Some(c) = self.current() {
            match c {
                'i' | 'm' | 's' => {
                    if !seen.insert(c) {
                        return Err("Repeated flag in modifiers");
                    }
                    any = true;
                }
                '-' if !removing => removing = true,
                ':' => {
                    self.pos += 1;
                    if removing && !any {
                        return Err("Invalid group");
                    }
                    return Ok(());
                }
                _ => return Err("Invalid group"),
            }
            self.pos += 1;
        }
        Err("Invalid group")
    }

    /// `name>` after `(?<` or `\k<`.
    fn group_name(&mut self) -> PatternResult<String> {
        let mut name = String::new();
        loop {
            let c = match self.current() {
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    self.pos += 1;
                    if !self.eat('u') {
                        return Err("Invalid capture group name");
                    }
                    self.unicode_escape_value(true)
                        .and_then(char::from_u32)
                        .ok_or("Invalid capture group name")?
                }
                Some(c) => {
                    self.pos += 1;
                    c
                }
                None => return Err("Invalid capture group name"),
            };
            let valid = if name.is_empty() { is_id_start(c) } else { is_id_continue(c) };
            if !valid {
                return Err("Invalid capture group name");
            }
            name.push(c);
        }
        if name.is_empty() {
            return Err("Invalid capture group name");
        }
        Ok(name)
    }

    // === Escapes ===

    fn atom_escape(&mut self) -> PatternResult {
        let Some(c) = self.current() else {
            return Err("\\ at end of pattern");
        };
        match c {
            '1'..='9' => {
                let value = self.decimal_value();
                if self.unicode || value <= self.group_count_upper_bound() {
                    self.max_backreference = self.max_backreference.max(value);
                }
                Ok(())
            }
            'k' if self.unicode || self.has_named_groups => {
                self.pos += 1;
                if !self.eat('<') {
                    return Err("Invalid named reference");
                }
                let name = self.group_name()?;
                self.backreference_names.push(name);
                Ok(())
            }
            _ => self.character_escape(false).map(|_| ()),
        }
    }

    /// Without `u`, a reference past the last group is a legacy octal escape,
    /// so only the total count matters. It is not known until the end; count
    /// opening parentheses instead.
    fn group_count_upper_bound(&self) -> u32 {
        let mut count = 0;
        let mut i = 0;
        let mut in_class = false;
        while i < self.chars.len() {
            match self.chars[i] {
                '\\' => i += 1,
                '[' => in_class = true,
                ']' => in_class = false,
                '(' if !in_class && self.chars.get(i + 1) != Some(&'?') => count += 1,
                '(' if !in_class && self.chars.get(i + 2) == Some(&'<')
                    && !matches!(self.chars.get(i + 3), Some('=' | '!')) =>
                {
                    count += 1
                }
                _ => {}
            }
            i += 1;
        }
        count
    }

    fn decimal_value(&mut self) -> u32 {
        let mut value: u32 = 0;
        while let Some(d) = self.current().and_then(|c| c.to_digit(10)) {
            value = value.saturating_mul(10).saturating_add(d);
            self.pos += 1;
        }
        value
    }

    /// Character and class escapes shared by atoms and classes. Returns the
    /// code point when the escape denotes a single character.
    fn character_escape(&mut self, in_class: bool) -> PatternResult<Option<u32>> {
        let Some(c) = self.current() else {
            return Err("\\ at end of pattern");
        };
        self.pos += 1;
        let value = match c {
            'd' | 'D' | 's' | 'S' | 'w' | 'W' => return Ok(None),
            'p' | 'P' if self.unicode => {
                self.property_escape()?;
                return Ok(None);
            }
            'f' => 0x0C,
            'n' => 0x0A,
            'r' => 0x0D,
            't' => 0x09,
            'v' => 0x0B,
            'b' if in_class => 0x08,
            '-' if in_class && self.unicode => '-' as u32,
            'c' => match self.current() {
                Some(l) if l.is_ascii_alphabetic() => {
                    self.pos += 1;
                    l as u32 % 32
                }
                Some(d) if in_class && !self.unicode && (d.is_ascii_digit() || d == '_') => {
                    self.pos += 1;
                    d as u32 % 32
                }
                _ if self.unicode => return Err("Invalid unicode escape"),
                _ => {
                    // Annex B: `\c` is a literal backslash followed by `c`.
                    self.pos -= 1;
                    '\\' as u32
                }
            },
            '0' if !self.current().is_some_and(|d| d.is_ascii_digit()) => 0,
            '0'..='7' if !self.unicode => {
                // Legacy octal escape
                let mut value = c as u32 - '0' as u32;
                let max_extra = if c <= '3' { 2 } else { 1 };
                for _ in 0..max_extra {
                    match self.current().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                value
            }
            'x' => match (self.hex_at(0), self.hex_at(1)) {
                (Some(hi), Some(lo)) => {
                    self.pos += 2;
                    hi * 16 + lo
                }
                _ if self.unicode => return Err("Invalid escape"),
                _ => 'x' as u32,
            },
            'u' => match self.unicode_escape_value(self.unicode) {
                Some(value) => value,
                None if self.unicode => return Err("Invalid unicode escape"),
                None => 'u' as u32,
            },
            c if self.unicode => {
                if is_syntax_character(c) || c == '/' {
                    c as u32
                } else {
                    return Err("Invalid escape");
                }
            }
            'k' if self.has_named_groups => return Err("Invalid named reference"),
            c => c as u32,
        };
        Ok(Some(value))
    }

    fn hex_at(&self, offset: usize) -> Option<u32> {
        self.peek(offset).and_then(|c| c.to_digit(16))
    }

    /// The part of a `\u` escape after the `u`. `braces` allows `\u{...}`.
    /// A high surrogate followed by `\uDC00`-`\uDFFF` is combined in unicode
    /// mode.
    fn unicode_escape_value(&mut self, braces: bool) -> Option<u32> {
        if braces && self.current() == Some('{') {
            let mut i = 1;
            let mut value: u32 = 0;
            while let Some(d) = self.hex_at(i) {
                value = value.checked_mul(16)?.checked_add(d)?;
                if value > 0x10FFFF {
                    return None;
                }
                i += 1;
            }
            if i == 1 || self.peek(i) != Some('}') {
                return None;
            }
            self.pos += i + 1;
            return Some(value);
        }
        let mut value = 0;
        for offset in 0..4 {
            value = value * 16 + self.hex_at(offset)?;
        }
        self.pos += 4;
        if self.unicode
            && (0xD800..0xDC00).contains(&value)
            && self.current() == Some('\\')
            && self.peek(1) == Some('u')
        {
            let saved = self.pos;
            self.pos += 2;
            let mut low = 0;
            let mut ok = true;
            for offset in 0..4 {
                match self.hex_at(offset) {
                    Some(d) => low = low * 16 + d,
                    None => ok = false,
                }
            }
            if ok && (0xDC00..0xE000).contains(&low) {
                self.pos += 4;
                return Some(0x10000 + ((value - 0xD800) << 10) + (low - 0xDC00));
            }
            self.pos = saved;
        }
        Some(value)
    }

    /// `\p{Name}` or `\p{Name=Value}`; the names themselves are not checked
    /// against the Unicode database.
    fn property_escape(&mut self) -> PatternResult {
        if !self.eat('{') {
            return Err("Invalid property name");
        }
        let mut len = 0;
        while let Some(c) = self.current() {
            if c == '}' {
                break;
            }
            if !(c.is_ascii_alphanumeric() || c == '_' || c == '=') {
                return Err("Invalid property name");
            }
            len += 1;
            self.pos += 1;
        }
        if len == 0 || !self.eat('}') {
            return Err("Invalid property name");
        }
        Ok(())
    }

    // === Character classes ===

    fn class_ranges(&mut self) -> PatternResult {
        self.eat('^');
        loop {
            match self.current() {
                None => return Err("Unterminated character class"),
                Some(']') => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => {}
            }
            let left = self.class_atom()?;
            if self.current() == Some('-') && self.peek(1).is_some_and(|c| c != ']') {
                self.pos += 1;
                let right = self.class_atom()?;
                match (left, right) {
                    (Some(l), Some(r)) if l > r => {
                        return Err("Range out of order in character class");
                    }
                    (None, _) | (_, None) if self.unicode => {
                        return Err("Invalid character class");
                    }
                    _ => {}
                }
            }
        }
    }

    fn class_atom(&mut self) -> PatternResult<Option<u32>> {
        match self.current() {
            None => Err("Unterminated character class"),
            Some('\\') => {
                self.pos += 1;
                self.character_escape(true)
            }
            Some(c) => {
                self.pos += 1;
                Ok(Some(c as u32))
            }
        }
    }

    /// A `v`-mode class: nested classes, `&&` and `--` operators, `\q{}`.
    fn class_set(&mut self) -> PatternResult {
        self.eat('^');
        loop {
            match self.current() {
                None => return Err("Unterminated character class"),
                Some(']') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some('[') => {
                    self.pos += 1;
                    self.class_set()?;
                }
                Some('&') if self.peek(1) == Some('&') => {
                    self.pos += 2;
                    if self.current() == Some('&') {
                        return Err("Invalid set operation in character class");
                    }
                }
                Some('-') if self.peek(1) == Some('-') => self.pos += 2,
                Some('\\') if self.peek(1) == Some('q') => {
                    self.pos += 2;
                    if !self.eat('{') {
                        return Err("Invalid escape");
                    }
                    while !self.eat('}') {
                        match self.current() {
                            None => return Err("Unterminated character class"),
                            Some('\\') => {
                                self.pos += 1;
                                self.character_escape(true)?;
                            }
                            Some(_) => self.pos += 1,
                        }
                    }
                }
                Some(c) if is_class_set_reserved_single(c) && c != '-' => {
                    return Err("Invalid character in character class");
                }
                Some(c) if is_class_set_reserved_double(c) && self.peek(1) == Some(c) => {
                    return Err("Invalid set operation in character class");
                }
                _ => {
                    let left = self.class_atom()?;
                    if self.current() == Some('-') && self.peek(1) != Some('-') {
                        self.pos += 1;
                        let right = self.class_atom()?;
                        match (left, right) {
                            (Some(l), Some(r)) if l > r => {
                                return Err("Range out of order in character class");
                            }
                            (None, _) | (_, None) => return Err("Invalid character class"),
                            _ => {}
                        }
                    }
                }
            }
        }
    }
}

fn parse_bound(digits: &str) -> Option<u64> {
    digits.parse().ok().or(Some(u64::MAX))
}

fn has_group_name(pattern: &str) -> bool {
    pattern
        .match_indices("(?<")
        .any(|(i, _)| !matches!(pattern.as_bytes().get(i + 3), Some(b'=' | b'!')))
}

fn is_syntax_character(c: char) -> bool {
    matches!(
        c,
        '^' | '$' | '\\' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|'
    )
}

fn is_class_set_reserved_single(c: char) -> bool {
    matches!(c, '(' | ')' | '{' | '}' | '/' | '-' | '|')
}

fn is_class_set_reserved_double(c: char) -> bool {
    matches!(
        c,
        '!' | '#' | '$' | '%' | '*' | '+' | ',' | '.' | ':' | ';' | '<' | '=' | '>' | '?'
            | '@' | '^' | '`' | '~'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(pattern: &str, flags: &str) {
        if let Err(err) = validate(pattern, flags) {
            panic!("/{pattern}/{flags} should be valid: {err}");
        }
    }

    fn fails(pattern: &str, flags: &str) {
        assert!(
            validate(pattern, flags).is_err(),
            "/{pattern}/{flags} should be invalid"
        );
    }

    #[test]
    fn test_flags() {
        assert!(validate_flags("dgimsuy").is_ok());
        assert!(validate_flags("v").unwrap().unicode_sets);
        assert_eq!(validate_flags("gg"), Err(ErrorCode::InvalidRegExpFlags));
        assert_eq!(validate_flags("uv"), Err(ErrorCode::InvalidRegExpFlags));
        assert_eq!(validate_flags("x"), Err(ErrorCode::InvalidRegExpFlags));
    }

    #[test]
    fn test_basic_patterns() {
        ok("abc", "");
        ok("a|b|", "");
        ok("^a*b+?c{2,3}$", "");
        ok("(?:a)(b)\\1", "");
        ok("(?<year>\\d{4})-\\k<year>", "u");
        ok("(?<=a)b(?<!c)", "");
        ok("[a-z\\d_]", "u");
        ok("\\p{Script=Greek}", "u");
        ok("(?i:a)b", "");
    }

    #[test]
    fn test_annex_b_leniency() {
        ok("{", "");
        ok("a{1", "");
        ok("]", "");
        ok("\\c", "");
        ok("\\8", "");
        ok("(?=a)*", "");
        ok("[\\d-z]", "");
    }

    #[test]
    fn test_unicode_mode_is_stricter() {
        fails("{", "u");
        fails("]", "u");
        fails("\\c", "u");
        fails("\\1", "u");
        fails("\\-", "u");
        fails("(?=a)*", "u");
        fails("[\\d-z]", "u");
        fails("\\u{110000}", "u");
    }

    #[test]
    fn test_structural_errors() {
        fails("(", "");
        fails("a)", "");
        fails("*a", "");
        fails("a**", "");
        fails("a{2,1}", "");
        fails("[b-a]", "");
        fails("[a", "");
        fails("(?<a>x)(?<a>y)", "");
        fails("\\k<b>(?<a>x)", "");
        fails("(?<=a)*", "");
    }

    #[test]
    fn test_unicode_sets() {
        ok("[\\p{L}--[a-z]]", "v");
        ok("[[a-z]&&[aeiou]]", "v");
        ok("[\\q{abc|d}]", "v");
        fails("[(]", "v");
        fails("[a&&&b]", "v");
    }
}
