use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// A line and column within a source file. Both numbers start at 1.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl Position {
    /// Returns the position reached after consuming `text`, which must start
    /// at this position.
    ///
    /// The returned position is the one of the character that follows `text`,
    /// not the one of its last character.
    pub(crate) fn after(mut self, text: &[u8]) -> Self {
        for b in text {
            match b {
                b'\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                // A lone carriage return also counts as a line break, but a
                // carriage return followed by a line feed is one break only,
                // the line feed will take care of it.
                b'\r' => {}
                // Continuation bytes of multi-byte UTF-8 characters don't
                // advance the column.
                b if b & 0xC0 == 0x80 => {}
                _ => self.column += 1,
            }
        }
        if text.ends_with(b"\r") {
            self.line += 1;
            self.column = 1;
        }
        self
    }
}

/// The place where a token was found.
///
/// Tokens created by the builder don't come from any source file and have
/// an unnamed location at line 1, column 1.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Location {
    file: Option<Rc<str>>,
    begin: Position,
    end: Position,
}

impl Location {
    pub(crate) const UNNAMED: &'static str = "unnamed";

    /// Creates a location in `file` going from `begin` to `end`. Both
    /// positions are inclusive.
    pub fn new(file: Option<Rc<str>>, begin: Position, end: Position) -> Self {
        Self { file, begin, end }
    }

    /// Name of the file this location belongs to, `"unnamed"` for sources
    /// that were not read from a file.
    pub fn file_name(&self) -> &str {
        self.file.as_deref().unwrap_or(Self::UNNAMED)
    }

    #[inline]
    pub fn begin(&self) -> Position {
        self.begin
    }

    #[inline]
    pub fn end(&self) -> Position {
        self.end
    }

    #[inline]
    pub fn line(&self) -> usize {
        self.begin.line
    }

    /// Returns a location that spans from the start of `self` to the end of
    /// `other`.
    pub fn combine(&self, other: &Location) -> Location {
        Location {
            file: self.file.clone(),
            begin: self.begin,
            end: other.end,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:", file)?;
        }
        write!(f, "{}.{}", self.begin.line, self.begin.column)?;
        if self.begin.line == self.end.line
            && self.end.column > self.begin.column
        {
            write!(f, "-{}", self.end.column)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Location, Position};

    #[test]
    fn position_after() {
        let start = Position::default();
        assert_eq!(start.after(b"rule"), Position { line: 1, column: 5 });
        assert_eq!(start.after(b"a\nbc"), Position { line: 2, column: 3 });
        assert_eq!(start.after(b"\r\n"), Position { line: 2, column: 1 });
        assert_eq!(start.after(b"\r"), Position { line: 2, column: 1 });
        assert_eq!(
            start.after("é".as_bytes()),
            Position { line: 1, column: 2 }
        );
    }

    #[test]
    fn display() {
        let loc = Location::new(
            None,
            Position { line: 3, column: 8 },
            Position { line: 3, column: 19 },
        );
        assert_eq!(loc.to_string(), "3.8-19");
        assert_eq!(loc.file_name(), "unnamed");

        let loc = Location::new(
            Some("rules.yar".into()),
            Position { line: 1, column: 1 },
            Position { line: 1, column: 1 },
        );
        assert_eq!(loc.to_string(), "rules.yar:1.1");
    }
}
