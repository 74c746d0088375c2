//! Single-pass scanner for property path strings.
//!
//! ```text
//! path      := root { accessor }
//! root      := name | index
//! accessor  := '.' name | index
//! name      := [A-Za-z_$] { [A-Za-z0-9_$] } | '*'
//! index     := '[' ( quoted | digits | '*' ) ']'
//! quoted    := '"' { '\"' | '\\' | any } '"'
//! ```
//!
//! Lenient mode also accepts a `.` directly before an index, a name directly
//! after an index, and names made of any characters other than `.` and `[`.

use tracing::debug;

use crate::error::{PathError, PathResult};
use crate::path::{PathSegment, WILDCARD};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Accept the looser forms found in paths written by older tools.
    #[default]
    Lenient,
    /// Accept only the grammar.
    Strict,
}

pub(crate) fn parse(input: &str, mode: ParseMode) -> PathResult<Vec<PathSegment>> {
    Parser {
        input,
        pos: 0,
        mode,
    }
    .run()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    mode: ParseMode,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self, c: char) {
        self.pos += c.len_utf8();
    }

    fn syntax(&self, reason: &'static str) -> PathError {
        let rest = self.rest();
        PathError::Syntax {
            path: self.input.to_string(),
            fragment: if rest.is_empty() {
                "<end>".to_string()
            } else {
                rest.to_string()
            },
            reason,
        }
    }

    fn run(mut self) -> PathResult<Vec<PathSegment>> {
        let mut segments = Vec::new();
        match self.peek() {
            None => return Ok(segments),
            Some('.') => return Err(self.syntax("expected a name or index at the start")),
            Some('[') => segments.push(self.index()?),
            Some(_) => segments.push(self.name()?),
        }

        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.bump(c);
                    match self.peek() {
                        None => return Err(self.syntax("expected a name or index after '.'")),
                        Some('[') if self.mode == ParseMode::Strict => {
                            return Err(self.syntax("expected a property name after '.'"))
                        }
                        Some('[') => {
                            debug!(path = self.input, "property path has '.' before '['");
                            segments.push(self.index()?);
                        }
                        Some(_) => segments.push(self.name()?),
                    }
                }
                '[' => segments.push(self.index()?),
                _ if self.mode == ParseMode::Lenient => segments.push(self.name()?),
                _ => return Err(self.syntax("expected '.' or '['")),
            }
        }
        Ok(segments)
    }

    fn name(&mut self) -> PathResult<PathSegment> {
        match self.mode {
            ParseMode::Strict => self.strict_name(),
            ParseMode::Lenient => self.lenient_name(),
        }
    }

    fn strict_name(&mut self) -> PathResult<PathSegment> {
        let rest = self.rest();
        if rest.starts_with(WILDCARD) {
            self.pos += WILDCARD.len();
            return Ok(PathSegment::Wildcard);
        }
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(rest.len());
        let name = &rest[..len];
        match name.chars().next() {
            Some(c) if !c.is_ascii_digit() => {
                self.pos += len;
                Ok(PathSegment::Key(name.to_string()))
            }
            _ => Err(self.syntax("expected a property name")),
        }
    }

    fn lenient_name(&mut self) -> PathResult<PathSegment> {
        let rest = self.rest();
        let len = rest.find(['.', '[']).unwrap_or(rest.len());
        let name = &rest[..len];
        if name.is_empty() {
            return Err(self.syntax("expected a property name"));
        }
        self.pos += len;
        Ok(if name == WILDCARD {
            PathSegment::Wildcard
        } else {
            PathSegment::Key(name.to_string())
        })
    }

    /// Parses `[...]`, positioned at the `[`.
    fn index(&mut self) -> PathResult<PathSegment> {
        self.bump('[');
        if self.peek() == Some('"') {
            self.bump('"');
            return self.quoted();
        }

        let rest = self.rest();
        let Some(close) = rest.find(']') else {
            return Err(self.syntax("missing closing bracket in array index"));
        };
        let inner = &rest[..close];
        let segment = if inner == WILDCARD {
            PathSegment::Wildcard
        } else if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
            let index = inner.parse().map_err(|_| self.invalid_index(inner))?;
            PathSegment::Index(index)
        } else {
            return Err(self.invalid_index(inner));
        };
        self.pos += close + 1;
        Ok(segment)
    }

    /// Parses the rest of `["..."]`, positioned after the opening quote.
    fn quoted(&mut self) -> PathResult<PathSegment> {
        let mut key = String::new();
        loop {
            let mut chars = self.rest().chars();
            match (chars.next(), chars.next()) {
                (None, _) => return Err(self.syntax("missing closing quote in property name")),
                (Some('"'), _) => {
                    self.bump('"');
                    break;
                }
                (Some('\\'), Some(escaped @ ('"' | '\\'))) => {
                    key.push(escaped);
                    self.bump('\\');
                    self.bump(escaped);
                }
                (Some(c), _) => {
                    key.push(c);
                    self.bump(c);
                }
            }
        }
        if self.peek() != Some(']') {
            return Err(self.syntax("missing closing bracket in property access"));
        }
        self.bump(']');
        Ok(if key == WILDCARD {
            PathSegment::Wildcard
        } else {
            PathSegment::Key(key)
        })
    }

    fn invalid_index(&self, index: &str) -> PathError {
        PathError::InvalidIndex {
            path: self.input.to_string(),
            index: index.to_string(),
        }
    }
}
