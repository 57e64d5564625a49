use async_trait::async_trait;
use futures::TryStreamExt as _;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, error, trace};

use crate::{
    api::JsonDocumentManager,
    filter::PathFilter,
    validation::{validate_collection_name, validate_document_key, validate_project_name},
    JsonDocument,
    Result,
    VaultError,
};
use super::manager::DocumentStore;

/// Column list shared by every statement that returns document rows.
const DOCUMENT_COLUMNS: &str = "project, collection, key, json_value, created_at, updated_at";

/// Parses caller-supplied JSON text, mapping syntax errors to the client
/// error class. Runs before any statement so malformed payloads never
/// reach the database.
fn parse_json_payload(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| {
        debug!("Rejecting malformed JSON payload: {}", e);
        VaultError::InvalidJsonPayload {
            reason: e.to_string(),
        }
    })
}

/// Postgres reports a primary-key conflict as SQLSTATE 23505.
fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db_error) if db_error.code().as_deref() == Some("23505")
    )
}

#[async_trait]
impl JsonDocumentManager for DocumentStore {
    async fn create_json_document(
        &self,
        project: &str,
        collection: &str,
        key: &str,
        json_value: &str,
        upsert: bool,
    ) -> Result<JsonDocument> {
        trace!(
            "Creating document {}/{}/{} (upsert: {})",
            project, collection, key, upsert
        );
        validate_project_name(project)?;
        validate_collection_name(collection)?;
        validate_document_key(key)?;
        let payload = parse_json_payload(json_value)?;

        let document = if upsert {
            // Insert-or-replace as one atomic primitive: no conflict check
            // races against the insert.
            sqlx::query_as::<_, JsonDocument>(&format!(
                "INSERT INTO json_documents (project, collection, key, json_value) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (project, collection, key) DO UPDATE \
                 SET json_value = EXCLUDED.json_value, updated_at = now() \
                 RETURNING {DOCUMENT_COLUMNS}"
            ))
            .bind(project)
            .bind(collection)
            .bind(key)
            .bind(&payload)
            .fetch_one(self.pool())
            .await?
        }
        else {
            sqlx::query_as::<_, JsonDocument>(&format!(
                "INSERT INTO json_documents (project, collection, key, json_value) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING {DOCUMENT_COLUMNS}"
            ))
            .bind(project)
            .bind(collection)
            .bind(key)
            .bind(&payload)
            .fetch_one(self.pool())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    debug!(
                        "Create conflict on existing document {}/{}/{}",
                        project, collection, key
                    );
                    VaultError::DocumentAlreadyExists {
                        project:    project.to_owned(),
                        collection: collection.to_owned(),
                        key:        key.to_owned(),
                    }
                }
                else {
                    error!(
                        "Failed to insert document {}/{}/{}: {}",
                        project, collection, key, e
                    );
                    e.into()
                }
            })?
        };

        debug!(
            "Document {}/{}/{} created successfully",
            project, collection, key
        );
        Ok(document)
    }

    async fn get_json_document(
        &self,
        project: &str,
        collection: &str,
        key: &str,
    ) -> Result<JsonDocument> {
        trace!("Retrieving document {}/{}/{}", project, collection, key);
        validate_project_name(project)?;
        validate_collection_name(collection)?;
        validate_document_key(key)?;

        let row = sqlx::query_as::<_, JsonDocument>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM json_documents \
             WHERE project = $1 AND collection = $2 AND key = $3"
        ))
        .bind(project)
        .bind(collection)
        .bind(key)
        .fetch_optional(self.pool())
        .await?;

        row.ok_or_else(|| {
            debug!("Document {}/{}/{} not found", project, collection, key);
            VaultError::DocumentNotFound {
                project:    project.to_owned(),
                collection: collection.to_owned(),
                key:        key.to_owned(),
            }
        })
    }

    async fn update_json_document(
        &self,
        project: &str,
        collection: &str,
        key: &str,
        json_patch: &str,
    ) -> Result<JsonDocument> {
        trace!("Updating document {}/{}/{}", project, collection, key);
        validate_project_name(project)?;
        validate_collection_name(collection)?;
        validate_document_key(key)?;
        let patch = parse_json_payload(json_patch)?;

        // The merge runs server-side in a single statement, so two
        // concurrent updates on the same identity serialize on the row and
        // neither can apply against a stale read.
        let row = sqlx::query_as::<_, JsonDocument>(&format!(
            "UPDATE json_documents \
             SET json_value = jsonb_merge_patch(json_value, $4), updated_at = now() \
             WHERE project = $1 AND collection = $2 AND key = $3 \
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(project)
        .bind(collection)
        .bind(key)
        .bind(&patch)
        .fetch_optional(self.pool())
        .await?;

        let document = row.ok_or_else(|| {
            debug!(
                "Update target {}/{}/{} not found",
                project, collection, key
            );
            VaultError::DocumentNotFound {
                project:    project.to_owned(),
                collection: collection.to_owned(),
                key:        key.to_owned(),
            }
        })?;
        debug!(
            "Document {}/{}/{} updated successfully",
            project, collection, key
        );
        Ok(document)
    }

    async fn list_json_documents(
        &self,
        project: &str,
        collection: &str,
        filter: Option<&str>,
        keys: Option<&[String]>,
    ) -> Result<Vec<JsonDocument>> {
        trace!(
            "Listing documents in {}/{} (filter: {}, keys: {})",
            project,
            collection,
            filter.is_some(),
            keys.map_or(0, <[String]>::len)
        );
        validate_project_name(project)?;
        validate_collection_name(collection)?;
        // Parse before building anything: a malformed filter must fail the
        // call without a query side effect.
        let parsed_filter = filter.map(PathFilter::parse).transpose()?;

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {DOCUMENT_COLUMNS} FROM json_documents WHERE project = "
        ));
        builder.push_bind(project.to_owned());
        builder.push(" AND collection = ");
        builder.push_bind(collection.to_owned());
        if let Some(keys) = keys {
            builder.push(" AND key = ANY(");
            builder.push_bind(keys.to_vec());
            builder.push(")");
        }
        if let Some(parsed) = &parsed_filter {
            parsed.push_predicate(&mut builder);
        }
        // Deterministic per call; no stability promise beyond that.
        builder.push(" ORDER BY key");

        let query = builder.build_query_as::<JsonDocument>();
        let documents: Vec<JsonDocument> = query.fetch(self.pool()).try_collect().await?;
        debug!(
            "Listed {} document(s) in {}/{}",
            documents.len(),
            project,
            collection
        );
        Ok(documents)
    }

    async fn delete_json_document(
        &self,
        project: &str,
        collection: &str,
        key: &str,
    ) -> Result<()> {
        trace!("Deleting document {}/{}/{}", project, collection, key);
        validate_project_name(project)?;
        validate_collection_name(collection)?;
        validate_document_key(key)?;

        let result = sqlx::query(
            "DELETE FROM json_documents \
             WHERE project = $1 AND collection = $2 AND key = $3",
        )
        .bind(project)
        .bind(collection)
        .bind(key)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            debug!(
                "Delete target {}/{}/{} not found",
                project, collection, key
            );
            return Err(VaultError::DocumentNotFound {
                project:    project.to_owned(),
                collection: collection.to_owned(),
                key:        key.to_owned(),
            });
        }
        debug!(
            "Document {}/{}/{} deleted successfully",
            project, collection, key
        );
        Ok(())
    }

    async fn delete_json_documents(
        &self,
        project: &str,
        collection: &str,
        keys: &[String],
    ) -> Result<u64> {
        trace!(
            "Deleting {} document(s) from {}/{}",
            keys.len(),
            project,
            collection
        );
        validate_project_name(project)?;
        validate_collection_name(collection)?;
        if keys.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "DELETE FROM json_documents \
             WHERE project = $1 AND collection = $2 AND key = ANY($3)",
        )
        .bind(project)
        .bind(collection)
        .bind(keys.to_vec())
        .execute(self.pool())
        .await?;

        let deleted = result.rows_affected();
        debug!(
            "Deleted {} of {} requested document(s) from {}/{}",
            deleted,
            keys.len(),
            project,
            collection
        );
        Ok(deleted)
    }

    async fn delete_json_collections(
        &self,
        project: &str,
        collection: Option<&str>,
    ) -> Result<()> {
        trace!(
            "Deleting collections in project {} (collection: {:?})",
            project, collection
        );
        validate_project_name(project)?;

        let result = match collection {
            Some(name) => {
                validate_collection_name(name)?;
                sqlx::query(
                    "DELETE FROM json_documents WHERE project = $1 AND collection = $2",
                )
                .bind(project)
                .bind(name)
                .execute(self.pool())
                .await?
            },
            None => {
                sqlx::query("DELETE FROM json_documents WHERE project = $1")
                    .bind(project)
                    .execute(self.pool())
                    .await?
            },
        };

        debug!(
            "Deleted {} document(s) from project {}",
            result.rows_affected(),
            project
        );
        Ok(())
    }
}
