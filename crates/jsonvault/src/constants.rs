//! Constants for database object names and identifier limits used throughout jsonvault.
//!
//! This module centralizes all special names to prevent typos and ensure consistency.

/// Name of the table holding all JSON documents for a deployment.
pub const DOCUMENTS_TABLE: &str = "json_documents";

/// Name of the server-side merge function installed by `DocumentStore::setup`.
pub const MERGE_FUNCTION: &str = "jsonb_merge_patch";

/// Maximum length for project identifiers.
pub const MAX_PROJECT_LENGTH: usize = 64;

/// Maximum length for collection identifiers.
pub const MAX_COLLECTION_LENGTH: usize = 64;

/// Maximum length for document keys.
pub const MAX_KEY_LENGTH: usize = 255;
