/// Line/column projection of a byte offset into a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn from_offset(content: &str, offset: usize) -> Self {
        let clamped = offset.min(content.len());
        let mut line = 1;
        let mut column = 1;
        for c in content[..clamped].chars() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ErrorKind {
    #[error("error lexing input: {0}")]
    Lexing(String),
    #[error("the \"{0}\" directive was not registered")]
    UnresolvedDirective(String),
    #[error(
        "wrong number of arguments when \"{name}\" is called: {given} given, \
         between {min} and {max} required"
    )]
    ArgumentCount {
        name: String,
        min: usize,
        max: usize,
        given: usize,
    },
    #[error("error evaluating expression: {0}")]
    Evaluation(String),
    #[error("\"{0}\": no such file or directory")]
    NotReadable(String),
    #[error("{0}")]
    MalformedConditional(String),
    #[error("error processing io: {0}")]
    Io(#[from] std::io::Error),
}

/// An [`ErrorKind`] tagged with the identity of the source and the position of
/// the offending token. Faults raised inside a recursively included file carry
/// that file's identity.
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub source_name: Option<String>,
    pub offset: Option<usize>,
    pub position: Option<Position>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            source_name: None,
            offset: None,
            position: None,
        }
    }

    /// Attach the source identity and the offending token's byte offset,
    /// projected to line/column against `content`. The first attachment wins:
    /// an error bubbling out of an included file keeps its original location.
    pub fn locate(mut self, source_name: &str, offset: usize, content: &str) -> Self {
        if self.source_name.is_none() {
            self.source_name = Some(source_name.to_owned());
            self.offset = Some(offset);
            self.position = Some(Position::from_offset(content, offset));
        }
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.source_name, &self.position) {
            (Some(name), Some(position)) => write!(f, "{}:{}: {}", name, position, self.kind),
            (Some(name), None) => write!(f, "{}: {}", name, self.kind),
            _ => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::new(ErrorKind::Io(error))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod test {
    use super::Position;

    #[test]
    fn test_position_from_offset() {
        let content = "first\nsecond\nthird";
        assert_eq!(Position::from_offset(content, 0), Position { line: 1, column: 1 });
        assert_eq!(Position::from_offset(content, 6), Position { line: 2, column: 1 });
        assert_eq!(Position::from_offset(content, 8), Position { line: 2, column: 3 });
    }

    #[test]
    fn test_position_clamps_out_of_range_offset() {
        assert_eq!(
            Position::from_offset("ab", 100),
            Position { line: 1, column: 3 }
        );
    }
}
