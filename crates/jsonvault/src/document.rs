use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Represents a stored JSON document.
///
/// A document is uniquely addressed by the `(project, collection, key)`
/// composite identity. The payload is arbitrary JSON; timestamps record
/// the initial insertion and the most recent mutation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JsonDocument {
    /// Tenant/namespace identifier.
    pub project:    String,
    /// Named sub-namespace within the project.
    pub collection: String,
    /// Unique identifier within `(project, collection)`.
    pub key:        String,
    /// The JSON payload of the document.
    pub json_value: Value,
    /// When the document was first inserted. Immutable after creation.
    pub created_at: DateTime<Utc>,
    /// When the document was last inserted or updated.
    /// Always `>= created_at`, strictly greater after any post-create mutation.
    pub updated_at: DateTime<Utc>,
}
