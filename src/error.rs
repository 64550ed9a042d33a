//! Error types for the binding boundary

/// Result type for binding operations
pub type BindResult<T> = Result<T, BindError>;

/// Stable error-kind tag, mirrored into the host runtime's exception object.
///
/// Script code catching a binding error can branch on this without parsing
/// messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad class declaration (duplicate property, invalid name). Surfaced at
    /// registration time; a programmer error in the declaring native code.
    Declaration,
    /// The host runtime rejected class/symbol/function creation. Nothing is
    /// cached, so the operation may be retried.
    Registration,
    /// Triggered by (possibly incorrect) script usage. Always delivered as a
    /// catchable script exception, never a process abort.
    Invocation,
}

/// Binding error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum BindError {
    /// Duplicate property name in a class declaration
    #[error("duplicate property '{name}' declared on class '{class}'")]
    DuplicateProperty {
        /// Class display name
        class: &'static str,
        /// Offending property name
        name: String,
    },

    /// Class display name rejected before registration
    #[error("invalid class name '{name}'")]
    InvalidClassName {
        /// The rejected name
        name: String,
    },

    /// The host runtime refused a registration-time allocation
    #[error("class registration failed: {0}")]
    Registration(String),

    /// The class declares no public constructor
    #[error("class '{class}' is not constructible from script code")]
    NotConstructible {
        /// Class display name
        class: &'static str,
    },

    /// Constructor or method invoked without a `this` receiver
    #[error("function on class '{class}' called without binding `this`")]
    MissingReceiver {
        /// Class display name
        class: &'static str,
    },

    /// Two-argument call matched the capability token but the payload could
    /// not be recovered — tampering or a corrupted internal call
    #[error("invalid call to internal constructor of '{class}'")]
    InvalidInternalCall {
        /// Class display name
        class: &'static str,
    },

    /// Receiver carries no native instance for the class, or one of a
    /// mismatched dynamic type
    #[error("object of type '{class}' is not correctly wrapped")]
    NotWrapped {
        /// Class display name
        class: &'static str,
    },

    /// The native instance is already borrowed by a call further up the stack
    #[error("native instance of '{class}' is already in use")]
    InstanceBorrowed {
        /// Class display name
        class: &'static str,
    },

    /// Invalid argument
    #[error("argument error: {0}")]
    Argument(String),

    /// Type mismatch during argument conversion
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: &'static str,
    },
}

impl BindError {
    /// The stable kind tag for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BindError::DuplicateProperty { .. } | BindError::InvalidClassName { .. } => {
                ErrorKind::Declaration
            }
            BindError::Registration(_) => ErrorKind::Registration,
            BindError::NotConstructible { .. }
            | BindError::MissingReceiver { .. }
            | BindError::InvalidInternalCall { .. }
            | BindError::NotWrapped { .. }
            | BindError::InstanceBorrowed { .. }
            | BindError::Argument(_)
            | BindError::TypeMismatch { .. } => ErrorKind::Invocation,
        }
    }
}

impl From<String> for BindError {
    fn from(s: String) -> Self {
        BindError::Registration(s)
    }
}

impl From<&str> for BindError {
    fn from(s: &str) -> Self {
        BindError::Registration(s.to_string())
    }
}
