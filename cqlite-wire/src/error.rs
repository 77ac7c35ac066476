//! Error types for CQL wire decoding

use std::fmt;
use thiserror::Error;

/// Result type alias for decoding operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for decoding and type resolution
#[derive(Error, Debug)]
pub enum Error {
    /// A fixed-width or length-prefixed read ran past the end of the buffer
    #[error("unexpected end of buffer: needed {requested} bytes, {available} remaining")]
    EndOfBuffer { requested: usize, available: usize },

    /// Negative length other than the null marker, or an arity mismatch
    #[error("Invalid length: {0}")]
    InvalidLength(String),

    /// Type name is neither recognized nor a qualifying user type
    #[error("Unsupported CQL type: {0}")]
    UnsupportedType(String),

    /// Inet payload is neither 4 nor 16 bytes
    #[error("expected a 4 or 16 octet network address, got {0} octets")]
    MalformedAddress(usize),

    /// Text payload is not valid UTF-8
    #[error("Invalid UTF-8 text: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// A value constructor rejected its input
    #[error("Construction failure: {0}")]
    ConstructionFailure(String),

    /// A required value constructor was not available
    #[error("Setup failure: {0}")]
    SetupFailure(String),

    /// Descriptor is structurally unusable (e.g. user type without constructors)
    #[error("Invalid type descriptor: {0}")]
    InvalidDescriptor(String),

    /// Descriptor nesting exceeds the configured limit
    #[error("Type nesting exceeds the limit of {limit} levels")]
    NestingTooDeep { limit: usize },

    /// Malformed textual type expression
    #[error("Type syntax error: {0}")]
    TypeSyntax(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Create an end-of-buffer error
    pub fn end_of_buffer(requested: usize, available: usize) -> Self {
        Self::EndOfBuffer {
            requested,
            available,
        }
    }

    /// Create an invalid length error
    pub fn invalid_length(msg: impl Into<String>) -> Self {
        Self::InvalidLength(msg.into())
    }

    /// Create an unsupported type error
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType(type_name.into())
    }

    /// Create a construction failure
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::ConstructionFailure(msg.into())
    }

    /// Create a setup failure
    pub fn setup(msg: impl Into<String>) -> Self {
        Self::SetupFailure(msg.into())
    }

    /// Create an invalid descriptor error
    pub fn invalid_descriptor(msg: impl Into<String>) -> Self {
        Self::InvalidDescriptor(msg.into())
    }

    /// Create a type syntax error
    pub fn type_syntax(msg: impl Into<String>) -> Self {
        Self::TypeSyntax(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::EndOfBuffer { .. } => ErrorCategory::Data,
            Error::InvalidLength(_) => ErrorCategory::Data,
            Error::MalformedAddress(_) => ErrorCategory::Data,
            Error::InvalidUtf8(_) => ErrorCategory::Data,
            Error::UnsupportedType(_) => ErrorCategory::Schema,
            Error::InvalidDescriptor(_) => ErrorCategory::Schema,
            Error::NestingTooDeep { .. } => ErrorCategory::Schema,
            Error::TypeSyntax(_) => ErrorCategory::Schema,
            Error::ConstructionFailure(_) => ErrorCategory::Construction,
            Error::SetupFailure(_) => ErrorCategory::Setup,
            Error::Configuration(_) => ErrorCategory::Configuration,
        }
    }

    /// Whether the error was raised while reading bytes rather than while
    /// resolving types or building the decoder tree
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Data | ErrorCategory::Construction
        )
    }
}

/// Error categories for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or truncated wire data
    Data,
    /// Type descriptor problems
    Schema,
    /// Value constructor rejected its input
    Construction,
    /// Constructor set could not be assembled
    Setup,
    /// Configuration errors
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Data => "Data",
            ErrorCategory::Schema => "Schema",
            ErrorCategory::Construction => "Construction",
            ErrorCategory::Setup => "Setup",
            ErrorCategory::Configuration => "Configuration",
        };
        write!(f, "{}", name)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Configuration(err.to_string())
    }
}
