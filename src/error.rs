use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind { Lex, Parse, Eval }

// Errors which abort evaluation of an expression. The message is the only payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Lex(String),
    Parse(String),
    Eval(String)
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Lex(_) => ErrorKind::Lex,
            Error::Parse(_) => ErrorKind::Parse,
            Error::Eval(_) => ErrorKind::Eval
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::Lex(m) | Error::Parse(m) | Error::Eval(m) => m
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for Error {}
