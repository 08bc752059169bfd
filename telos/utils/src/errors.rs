//! Errors generated by the compiler.
use crate::Id;

/// Convenience wrapper to represent success or a meaningful compiler error.
pub type TelosResult<T> = std::result::Result<T, Error>;

/// Errors generated by the compiler
#[derive(Clone)]
pub struct Error {
    kind: Box<ErrorKind>,
    post_msg: Option<String>,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(post) = &self.post_msg {
            write!(f, "\n{}", post)?;
        }
        Ok(())
    }
}

impl Error {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
            post_msg: None,
        }
    }

    pub fn with_post_msg(mut self, msg: Option<String>) -> Self {
        self.post_msg = msg;
        self
    }

    /// The domain file could not be parsed.
    pub fn domain_parse<S: ToString>(msg: S) -> Self {
        Self::new(ErrorKind::DomainParse(msg.to_string()))
    }
    /// The automaton text or one of its labels could not be parsed.
    pub fn dfa_parse<S: ToString>(msg: S) -> Self {
        Self::new(ErrorKind::DfaParse(msg.to_string()))
    }
    /// A propositional symbol is not present in the grounding map.
    pub fn unknown_symbol(sym: Id) -> Self {
        Self::new(ErrorKind::UnknownSymbol(sym))
    }
    /// A predicate or argument cannot be encoded as a propositional symbol.
    pub fn invalid_symbol<S: ToString>(msg: S) -> Self {
        Self::new(ErrorKind::InvalidSymbol(msg.to_string()))
    }
    /// The external SAS+ translator was unavailable or produced garbage.
    pub fn invariant_extraction<S: ToString>(msg: S) -> Self {
        Self::new(ErrorKind::InvariantExtraction(msg.to_string()))
    }
    /// A canonicalisation or cache-key mismatch. Always a bug.
    pub fn internal<S: ToString>(msg: S) -> Self {
        Self::new(ErrorKind::Internal(msg.to_string()))
    }
    /// The name has not been bound.
    pub fn undefined<S: ToString>(name: Id, typ: S) -> Self {
        Self::new(ErrorKind::Undefined(name, typ.to_string()))
    }
    /// The name has already been bound.
    pub fn already_bound<S: ToString>(name: Id, typ: S) -> Self {
        Self::new(ErrorKind::AlreadyBound(name, typ.to_string()))
    }
    /// The input file is invalid (does not exist or cannot be read).
    pub fn invalid_file<S: ToString>(msg: S) -> Self {
        Self::new(ErrorKind::InvalidFile(msg.to_string()))
    }
    /// Failed to write an output.
    pub fn write_error<S: ToString>(msg: S) -> Self {
        Self::new(ErrorKind::WriteError(msg.to_string()))
    }
    pub fn misc<S: ToString>(msg: S) -> Self {
        Self::new(ErrorKind::Misc(msg.to_string()))
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// Standard error type for telos errors.
#[derive(Clone)]
enum ErrorKind {
    /// The domain input is malformed.
    DomainParse(String),
    /// The DFA input or an edge label is malformed.
    DfaParse(String),

    /// A DFA symbol has no entry in the grounding map. Indicates a
    /// front-end/translator mismatch.
    UnknownSymbol(Id),
    /// An atom cannot be encoded under the symbol scheme.
    InvalidSymbol(String),

    /// The external SAS+ translator failed; the compilation cannot proceed.
    InvariantExtraction(String),

    /// Violation of an internal invariant. A programming bug.
    Internal(String),

    /// The name has not been bound.
    Undefined(Id, String),
    /// The name has already been bound.
    AlreadyBound(Id, String),

    /// The input file is invalid (does not exist).
    InvalidFile(String),
    /// Failed to write the output.
    WriteError(String),
    /// Miscellaneous error message.
    Misc(String),
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use ErrorKind::*;
        match self {
            DomainParse(msg) => write!(f, "Domain parse error: {msg}"),
            DfaParse(msg) => write!(f, "DFA parse error: {msg}"),
            UnknownSymbol(sym) => {
                write!(f, "Symbol `{sym}' is not in the grounding map")
            }
            InvalidSymbol(msg) => write!(f, "Invalid symbol: {msg}"),
            InvariantExtraction(msg) => {
                write!(f, "Invariant extraction failed: {msg}")
            }
            Internal(msg) => write!(f, "Internal invariant violated: {msg}"),
            Undefined(name, typ) => {
                write!(f, "Undefined {typ} name: {name}")
            }
            AlreadyBound(name, bound_by) => {
                write!(f, "Name `{name}' already bound by {bound_by}")
            }
            InvalidFile(msg) | WriteError(msg) | Misc(msg) => {
                write!(f, "{msg}")
            }
        }
    }
}

// Conversions from other error types to our error type so that
// we can use `?` in all the places.
impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::invalid_file(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::write_error(format!("IO Error: {}", e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::write_error(format!("serde_json Error: {}", e))
    }
}
