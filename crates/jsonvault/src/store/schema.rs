//! Schema installation for the document table and the merge function.

use sqlx::PgPool;
use tracing::{debug, trace};

use crate::{merge::JSONB_MERGE_PATCH_SQL, Result};

/// DDL for the single documents table of a deployment.
///
/// The composite primary key enforces the `(project, collection, key)`
/// identity; `created_at`/`updated_at` default to the transaction time so a
/// fresh insert always satisfies `created_at == updated_at`.
const CREATE_DOCUMENTS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS json_documents (
    project     TEXT        NOT NULL,
    collection  TEXT        NOT NULL,
    key         TEXT        NOT NULL,
    json_value  JSONB       NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (project, collection, key)
)
"#;

/// Prepares the database environment for the document store.
///
/// Creates the documents table if it does not exist and installs (or
/// replaces) the server-side `jsonb_merge_patch` function. Both statements
/// are idempotent, so this is safe to run on every startup.
pub(crate) async fn install(pool: &PgPool) -> Result<()> {
    trace!("Installing document store schema");

    sqlx::query(CREATE_DOCUMENTS_TABLE_SQL).execute(pool).await?;
    debug!("Documents table present");

    sqlx::query(JSONB_MERGE_PATCH_SQL).execute(pool).await?;
    debug!("jsonb_merge_patch function installed");

    Ok(())
}
