//! Error types for input accessors, the archive serializer and input dispatch.

/// Error type shared by accessors, the archive serializer and input schemes.
///
/// Every variant that concerns a location carries the offending path, already
/// rendered for humans (accessors pass it through `show_path`).
/// Uses `#[non_exhaustive]` for forward compatibility.
///
/// # Examples
///
/// ```rust
/// use inputfs::FetchError;
///
/// let err = FetchError::NotFound { path: "/virtual/1/missing".into() };
/// assert_eq!(err.to_string(), "path '/virtual/1/missing' does not exist");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    // Accessor errors
    /// Path does not exist, or is not of the kind the operation reads.
    #[error("path '{path}' does not exist")]
    NotFound {
        /// The path that was not found.
        path: String,
    },

    /// The sandbox refused access to a path.
    #[error("access to path '{path}' is forbidden")]
    PermissionDenied {
        /// The path that was refused.
        path: String,
    },

    /// The path exists but has the wrong type for the operation.
    #[error("path '{path}' is not a {expected}")]
    WrongType {
        /// The offending path.
        path: String,
        /// What the operation expected (e.g. "symlink").
        expected: &'static str,
    },

    /// A node that cannot be represented in an archive (socket, device, ...).
    #[error("file '{path}' has an unsupported type")]
    UnsupportedType {
        /// The offending path.
        path: String,
    },

    /// Two stored names collapse to the same name once the case hack is undone.
    #[error("file name collision between '{first}' and '{second}'")]
    NameCollision {
        /// The first stored name.
        first: String,
        /// The stored name that collided with it.
        second: String,
    },

    /// The accessor does not implement this operation.
    #[error("{operation} is not implemented for '{path}'")]
    NotImplemented {
        /// The unimplemented operation.
        operation: &'static str,
        /// The path (or input) the operation was attempted on.
        path: String,
    },

    /// Data read from an accessor is not in the expected shape.
    #[error("invalid data: {path} ({details})")]
    InvalidData {
        /// The path with invalid data.
        path: String,
        /// Details about the invalid data.
        details: String,
    },

    /// Traversal stopped because an interrupt was requested.
    #[error("interrupted by the user")]
    Interrupted,

    // Archive errors
    /// The byte stream is not a well-formed archive.
    #[error("bad archive: {details}")]
    BadArchive {
        /// What was wrong with the stream.
        details: String,
    },

    // Input errors
    /// No registered input scheme recognized the URL or attributes.
    #[error("input '{input}' is unsupported")]
    NoMatchingScheme {
        /// The URL or attribute bag that was not recognized.
        input: String,
    },

    /// The URL could not be parsed.
    #[error("'{url}' is not a valid URL: {source}")]
    InvalidUrl {
        /// The rejected URL text.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// A required input attribute is absent.
    #[error("input attribute '{name}' is missing")]
    MissingAttribute {
        /// The attribute name.
        name: String,
    },

    /// An input attribute has the wrong type or an unparseable value.
    #[error("input attribute '{name}' is invalid: {details}")]
    InvalidAttribute {
        /// The attribute name.
        name: String,
        /// Why it was rejected.
        details: String,
    },

    /// The input (or its scheme) cannot perform the operation.
    #[error("cannot {operation} input '{input}'")]
    UnsupportedOperation {
        /// The operation that was attempted.
        operation: &'static str,
        /// The input it was attempted on.
        input: String,
    },

    /// A locked attribute of the fetched input contradicts the specified one.
    #[error("{attribute} mismatch in input '{input}', expected '{expected}', got '{got}'")]
    LockMismatch {
        /// The input as specified.
        input: String,
        /// The attribute that differs.
        attribute: &'static str,
        /// The value that was specified.
        expected: String,
        /// The value the fetch produced.
        got: String,
    },

    /// Overrides dropped the lock of a locked input without being asked to.
    #[error("applying overrides to locked input '{input}' would unlock it")]
    LockLost {
        /// The locked input.
        input: String,
    },

    /// JSON deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// I/O error with context.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The path involved in the operation.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Convert an I/O error raised while touching `path`, keeping the path.
    ///
    /// `NotFound` and `PermissionDenied` map onto the accessor taxonomy, and
    /// so does `NotADirectory` (a path below a regular file does not exist);
    /// everything else stays an [`FetchError::Io`].
    pub fn from_io(operation: &'static str, path: impl Into<String>, error: std::io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => {
                FetchError::NotFound { path }
            }
            std::io::ErrorKind::PermissionDenied => FetchError::PermissionDenied { path },
            _ => FetchError::Io {
                operation,
                path,
                source: error,
            },
        }
    }
}
