use thiserror::Error;

/// Crate-wide error type for the document storage manager.
///
/// This error type encompasses all possible errors that can occur within
/// the jsonvault system, providing structured error handling and meaningful
/// error messages for different failure scenarios.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Caller-supplied JSON text could not be parsed
    #[error("Invalid JSON payload: {reason}")]
    InvalidJsonPayload {
        reason: String,
    },

    /// Filter expression rejected by the translator
    #[error("Invalid filter expression '{expression}': {reason}")]
    InvalidFilterExpression {
        expression: String,
        reason: String,
    },

    /// Document not found at the requested identity
    #[error("Document '{key}' not found in collection '{collection}' of project '{project}'")]
    DocumentNotFound {
        project: String,
        collection: String,
        key: String,
    },

    /// Document already exists (for create operations without upsert)
    #[error("Document '{key}' already exists in collection '{collection}' of project '{project}'")]
    DocumentAlreadyExists {
        project: String,
        collection: String,
        key: String,
    },

    /// Invalid project name format
    #[error("Invalid project name: {name}")]
    InvalidProjectName {
        name: String,
    },

    /// Invalid collection name format
    #[error("Invalid collection name: {name}")]
    InvalidCollectionName {
        name: String,
    },

    /// Invalid document key format
    #[error("Invalid document key: {key}")]
    InvalidDocumentKey {
        key: String,
    },

    /// Underlying database operation failed
    #[error("Database error: {source}")]
    Database {
        #[from]
        source: sqlx::Error,
    },
}

impl VaultError {
    /// Returns `true` when the error was caused by malformed caller input
    /// (invalid JSON, invalid filter, invalid identifier, or a duplicate-key
    /// create without upsert). The service layer surfaces these unchanged
    /// and never retries them.
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidJsonPayload { .. } |
                Self::InvalidFilterExpression { .. } |
                Self::DocumentAlreadyExists { .. } |
                Self::InvalidProjectName { .. } |
                Self::InvalidCollectionName { .. } |
                Self::InvalidDocumentKey { .. }
        )
    }

    /// Returns `true` when the requested document (or any document in the
    /// requested scope) does not exist.
    pub const fn is_not_found(&self) -> bool { matches!(self, Self::DocumentNotFound { .. }) }
}

/// Result type alias for jsonvault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
