//! Path expression tokenizer.

use crate::types::Segment;
use crate::PathSyntaxError;

/// Single-pass parser for `name(.name | [index])*` expressions.
pub(crate) struct PathParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> PathParser<'a> {
    pub(crate) fn parse(input: &'a str) -> Result<Vec<Segment>, PathSyntaxError> {
        if input.is_empty() {
            return Ok(Vec::new());
        }
        let mut parser = Self { input, pos: 0 };
        parser.parse_path()
    }

    fn parse_path(&mut self) -> Result<Vec<Segment>, PathSyntaxError> {
        let mut segments = Vec::new();

        loop {
            let name = self.parse_name()?;
            segments.push(Segment::Field(name));

            if self.peek() == Some('[') {
                segments.push(Segment::Index(self.parse_index()?));
                // `a[1][2]`: only one index per field name.
                if self.peek() == Some('[') {
                    return Err(PathSyntaxError::MisplacedIndex { pos: self.pos });
                }
            }

            match self.peek() {
                None => break,
                Some('.') => {
                    self.advance();
                }
                Some(ch) => {
                    return Err(PathSyntaxError::UnexpectedChar { pos: self.pos, ch });
                }
            }
        }

        Ok(segments)
    }

    fn parse_name(&mut self) -> Result<String, PathSyntaxError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_delimiter(c) {
                break;
            }
            self.advance();
        }

        if start == self.pos {
            return Err(match self.peek() {
                Some('[') if start == 0 => PathSyntaxError::MisplacedIndex { pos: start },
                Some(']') => PathSyntaxError::UnexpectedChar { pos: start, ch: ']' },
                _ => PathSyntaxError::EmptySegment { pos: start },
            });
        }

        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_index(&mut self) -> Result<usize, PathSyntaxError> {
        let open = self.pos;
        self.advance();

        let start = self.pos;
        loop {
            match self.peek() {
                Some(']') => break,
                Some(_) => self.advance(),
                None => return Err(PathSyntaxError::UnclosedBracket { pos: open }),
            }
        }
        let text = &self.input[start..self.pos];
        self.advance();

        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PathSyntaxError::InvalidIndex {
                pos: start,
                text: text.to_string(),
            });
        }
        text.parse().map_err(|_| PathSyntaxError::InvalidIndex {
            pos: start,
            text: text.to_string(),
        })
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }
}

/// Characters that can never appear inside a field name.
pub(crate) fn is_delimiter(c: char) -> bool {
    matches!(c, '.' | '[' | ']')
}
