use std::fmt;

/// The error type for a single engine invocation.
///
/// Every fatal condition in the pipeline funnels into one of these. The
/// engine entry point is the only place that looks at one: it turns the
/// error into the one-element output list that callers (the CLI, the
/// scripting bridge) expect. Everything below the entry point just bubbles
/// these up with `?`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineError {
    kind: ErrorKind,
    message: String,
}

/// The category of a fatal engine error.
///
/// The category names are part of the output format: an error renders as
/// `ERROR (<kind>): <message>`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The caller handed us something unusable, e.g. a bad base substring.
    BadArguments,
    /// The regex does not conform to the accepted grammar.
    ParseError,
    /// The regex uses a feature the engine deliberately does not model.
    Unsupported,
    /// An alternation where both alternatives are empty.
    PointlessAlternation,
    /// A repeat quantifier that can never match anything, i.e. `{0}`.
    PointlessRepeat,
    /// A character range that does not denote a sensible span.
    BadRange,
    /// An internal invariant was violated. Always a bug.
    Internal,
}

impl ErrorKind {
    fn as_str(&self) -> &'static str {
        match *self {
            ErrorKind::BadArguments => "bad arguments",
            ErrorKind::ParseError => "parse error",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::PointlessAlternation => "pointless alternation",
            ErrorKind::PointlessRepeat => "pointless repeat",
            ErrorKind::BadRange => "bad range",
            ErrorKind::Internal => "internal",
        }
    }
}

impl EngineError {
    /// Create a new error with the given kind and human readable message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> EngineError {
        EngineError { kind, message: message.into() }
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the message without the `ERROR (...)` prefix.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ERROR ({}): {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for EngineError {}

/// A convenience alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Builds an internal invariant failure.
///
/// Use this when the pipeline reaches a state that the preceding stages are
/// supposed to have made impossible.
pub fn internal(message: impl Into<String>) -> EngineError {
    EngineError::new(ErrorKind::Internal, message)
}

/// Builds a parse error.
pub fn parse(message: impl Into<String>) -> EngineError {
    EngineError::new(ErrorKind::ParseError, message)
}

/// Builds an unsupported-feature error.
pub fn unsupported(message: impl Into<String>) -> EngineError {
    EngineError::new(ErrorKind::Unsupported, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind() {
        let err = EngineError::new(
            ErrorKind::ParseError,
            "Input string ended prematurely",
        );
        assert_eq!(
            "ERROR (parse error): Input string ended prematurely",
            err.to_string()
        );
    }

    #[test]
    fn kind_names() {
        assert_eq!("bad arguments", ErrorKind::BadArguments.as_str());
        assert_eq!("pointless repeat", ErrorKind::PointlessRepeat.as_str());
        assert_eq!(
            "pointless alternation",
            ErrorKind::PointlessAlternation.as_str()
        );
    }
}
