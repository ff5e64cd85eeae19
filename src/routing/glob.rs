//! Glob pattern compilation and matching.
//!
//! Supported syntax:
//! - `*` any run of characters within one path segment
//! - `?` one character other than `/`
//! - `[abc]`, `[a-z]`, `[!x]` / `[^x]` character classes
//! - `**` as a whole segment: zero or more segments
//! - extended groups `@(a|b)`, `?(a|b)`, `+(a|b)`, `*(a|b)`, `!(a|b)`
//! - `\x` escapes `x`
//!
//! Malformed constructs (an unclosed `[` or group) are taken literally, so
//! compilation never fails. Matching is against the whole input and never lets
//! a single-segment construct cross a `/`.

use std::collections::HashMap;
use std::fmt;

/// Returns true if `segment` contains glob metacharacters.
pub fn has_magic(segment: &str) -> bool {
    segment.contains(['*', '?', '['])
        || segment.contains("@(")
        || segment.contains("+(")
        || segment.contains("!(")
}

/// A compiled glob pattern.
#[derive(Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyChar,
    Star,
    /// `**` closing the pattern.
    GlobStar,
    /// `**/`: empty, or anything ending in `/`.
    GlobStarSlash,
    Class {
        negated: bool,
        ranges: Vec<(char, char)>,
    },
    Group {
        kind: GroupKind,
        alternatives: Vec<Vec<Token>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    /// `@(...)`
    ExactlyOne,
    /// `?(...)`
    ZeroOrOne,
    /// `*(...)`
    ZeroOrMore,
    /// `+(...)`
    OneOrMore,
    /// `!(...)`
    Not,
}

impl GroupKind {
    fn from_prefix(c: char) -> Option<Self> {
        match c {
            '@' => Some(GroupKind::ExactlyOne),
            '?' => Some(GroupKind::ZeroOrOne),
            '*' => Some(GroupKind::ZeroOrMore),
            '+' => Some(GroupKind::OneOrMore),
            '!' => Some(GroupKind::Not),
            _ => None,
        }
    }
}

impl Pattern {
    /// Compile a pattern.
    pub fn new(source: &str) -> Self {
        let chars: Vec<char> = source.chars().collect();
        let mut parser = Parser { chars: &chars, pos: 0 };
        let tokens = parser.sequence(false);
        Self {
            source: source.to_string(),
            tokens,
        }
    }

    /// The pattern text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if the whole of `path` matches.
    pub fn matches(&self, path: &str) -> bool {
        let input: Vec<char> = path.chars().collect();
        Matcher::new(&input).sequence(&self.tokens, 0, input.len())
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

struct Parser<'a> {
    chars: &'a [char],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Parses tokens until the end, or until `|` / `)` inside a group.
    fn sequence(&mut self, in_group: bool) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek(0) {
            if in_group && (c == '|' || c == ')') {
                break;
            }
            if c == '\\' {
                if let Some(escaped) = self.peek(1) {
                    tokens.push(Token::Literal(escaped));
                    self.pos += 2;
                    continue;
                }
            }
            if self.peek(1) == Some('(') {
                if let Some(kind) = GroupKind::from_prefix(c) {
                    if let Some(group) = self.group(kind) {
                        tokens.push(group);
                        continue;
                    }
                }
            }
            match c {
                '*' => {
                    let token = self.star(in_group, &tokens);
                    tokens.push(token);
                }
                '?' => {
                    tokens.push(Token::AnyChar);
                    self.pos += 1;
                }
                '[' => match self.class() {
                    Some(class) => tokens.push(class),
                    None => {
                        tokens.push(Token::Literal('['));
                        self.pos += 1;
                    }
                },
                _ => {
                    tokens.push(Token::Literal(c));
                    self.pos += 1;
                }
            }
        }
        tokens
    }

    fn star(&mut self, in_group: bool, preceding: &[Token]) -> Token {
        let mut count = 0;
        while self.peek(count) == Some('*') {
            count += 1;
        }
        let at_segment_start =
            matches!(preceding.last(), None | Some(Token::Literal('/')));
        if count == 2 && !in_group && at_segment_start {
            match self.peek(2) {
                None => {
                    self.pos += 2;
                    return Token::GlobStar;
                }
                Some('/') => {
                    self.pos += 3;
                    return Token::GlobStarSlash;
                }
                _ => {}
            }
        }
        self.pos += count;
        Token::Star
    }

    /// Parses `[...]` at the current position; `None` when unterminated.
    fn class(&mut self) -> Option<Token> {
        let mut i = self.pos + 1;
        let negated = matches!(self.chars.get(i), Some('!') | Some('^'));
        if negated {
            i += 1;
        }
        let first = i;
        let mut ranges = Vec::new();
        loop {
            let c = *self.chars.get(i)?;
            if c == ']' && i > first {
                break;
            }
            if self.chars.get(i + 1) == Some(&'-') {
                if let Some(&end) = self.chars.get(i + 2) {
                    if end != ']' {
                        ranges.push((c, end));
                        i += 3;
                        continue;
                    }
                }
            }
            ranges.push((c, c));
            i += 1;
        }
        self.pos = i + 1;
        Some(Token::Class { negated, ranges })
    }

    /// Parses `x(a|b)` at the current position; `None` when unterminated.
    fn group(&mut self, kind: GroupKind) -> Option<Token> {
        let start = self.pos;
        self.pos += 2;
        let mut alternatives = Vec::new();
        loop {
            alternatives.push(self.sequence(true));
            match self.peek(0) {
                Some('|') => self.pos += 1,
                Some(')') => {
                    self.pos += 1;
                    return Some(Token::Group { kind, alternatives });
                }
                _ => {
                    self.pos = start;
                    return None;
                }
            }
        }
    }
}

/// Backtracking matcher over one input.
///
/// Every sub-result is memoized by token sequence and input span, so nested
/// repetitions such as `+(a|aa)` stay polynomial in the input length.
struct Matcher<'a> {
    input: &'a [char],
    /// (token sequence address, length, start, end) → matched
    sequences: HashMap<(usize, usize, usize, usize), bool>,
    /// (alternatives address, start, end) → matched
    repetitions: HashMap<(usize, usize, usize), bool>,
}

impl<'a> Matcher<'a> {
    fn new(input: &'a [char]) -> Self {
        Self {
            input,
            sequences: HashMap::new(),
            repetitions: HashMap::new(),
        }
    }

    /// `tokens` match exactly `input[start..end]`.
    fn sequence(&mut self, tokens: &[Token], start: usize, end: usize) -> bool {
        let key = (tokens.as_ptr() as usize, tokens.len(), start, end);
        if let Some(&hit) = self.sequences.get(&key) {
            return hit;
        }
        let matched = self.sequence_uncached(tokens, start, end);
        self.sequences.insert(key, matched);
        matched
    }

    fn sequence_uncached(&mut self, tokens: &[Token], start: usize, end: usize) -> bool {
        let Some((token, rest)) = tokens.split_first() else {
            return start == end;
        };
        let input = self.input;
        let text = &input[start..end];
        match token {
            Token::Literal(c) => text.first() == Some(c) && self.sequence(rest, start + 1, end),
            Token::AnyChar => {
                matches!(text.first(), Some(c) if *c != '/') && self.sequence(rest, start + 1, end)
            }
            Token::Class { negated, ranges } => match text.first() {
                Some(&c) if c != '/' => {
                    let within = ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
                    within != *negated && self.sequence(rest, start + 1, end)
                }
                _ => false,
            },
            Token::Star => {
                let limit = segment_len(text);
                (0..=limit).any(|k| self.sequence(rest, start + k, end))
            }
            Token::GlobStar => (start..=end).any(|k| self.sequence(rest, k, end)),
            Token::GlobStarSlash => {
                self.sequence(rest, start, end)
                    || text
                        .iter()
                        .enumerate()
                        .filter(|(_, c)| **c == '/')
                        .any(|(k, _)| self.sequence(rest, start + k + 1, end))
            }
            Token::Group { kind, alternatives } => {
                let limit = segment_len(text);
                (0..=limit).any(|k| {
                    self.group(*kind, alternatives, start, start + k)
                        && self.sequence(rest, start + k, end)
                })
            }
        }
    }

    fn group(
        &mut self,
        kind: GroupKind,
        alternatives: &[Vec<Token>],
        start: usize,
        end: usize,
    ) -> bool {
        match kind {
            GroupKind::ExactlyOne => self.any_alternative(alternatives, start, end),
            GroupKind::ZeroOrOne => start == end || self.any_alternative(alternatives, start, end),
            GroupKind::ZeroOrMore => self.repeats(alternatives, start, end),
            GroupKind::OneOrMore => start < end && self.repeats(alternatives, start, end),
            GroupKind::Not => !self.any_alternative(alternatives, start, end),
        }
    }

    fn any_alternative(&mut self, alternatives: &[Vec<Token>], start: usize, end: usize) -> bool {
        alternatives.iter().any(|alt| self.sequence(alt, start, end))
    }

    /// `input[start..end]` splits into non-empty pieces that each match an
    /// alternative.
    fn repeats(&mut self, alternatives: &[Vec<Token>], start: usize, end: usize) -> bool {
        if start == end {
            return true;
        }
        let key = (alternatives.as_ptr() as usize, start, end);
        if let Some(&hit) = self.repetitions.get(&key) {
            return hit;
        }
        let matched = (start + 1..=end).any(|j| {
            self.any_alternative(alternatives, start, j) && self.repeats(alternatives, j, end)
        });
        self.repetitions.insert(key, matched);
        matched
    }
}

fn segment_len(input: &[char]) -> usize {
    input.iter().position(|c| *c == '/').unwrap_or(input.len())
}
