//! The operation surface consumed by the upper service layer.

use async_trait::async_trait;

use crate::{JsonDocument, Result};

/// Contract for a JSON document manager backed by some storage engine.
///
/// The service layer supplies already-authorized project/collection/key
/// strings and raw JSON text; implementations perform no authorization.
/// All inputs are validated before any mutation is attempted, and every
/// operation is all-or-nothing.
#[async_trait]
pub trait JsonDocumentManager: Send + Sync {
    /// Creates a JSON document at `(project, collection, key)`.
    ///
    /// `json_value` must be syntactically valid JSON text. When a document
    /// already exists at the identity, `upsert = true` replaces its payload
    /// wholesale (bumping `updated_at`, preserving `created_at`) while
    /// `upsert = false` fails with `DocumentAlreadyExists` and mutates
    /// nothing.
    async fn create_json_document(
        &self,
        project: &str,
        collection: &str,
        key: &str,
        json_value: &str,
        upsert: bool,
    ) -> Result<JsonDocument>;

    /// Returns the document at `(project, collection, key)`.
    ///
    /// Fails with `DocumentNotFound` when no such document exists.
    async fn get_json_document(
        &self,
        project: &str,
        collection: &str,
        key: &str,
    ) -> Result<JsonDocument>;

    /// Applies a JSON merge patch to the document at `(project, collection, key)`.
    ///
    /// `json_patch` must be valid JSON text, usually an object. The merge is
    /// computed inside the storage engine as a single atomic statement, so
    /// concurrent updates to the same identity serialize correctly. Never
    /// creates; fails with `DocumentNotFound` when the target is absent.
    async fn update_json_document(
        &self,
        project: &str,
        collection: &str,
        key: &str,
        json_patch: &str,
    ) -> Result<JsonDocument>;

    /// Lists documents in `(project, collection)`.
    ///
    /// `filter` restricts results to documents whose JSON content satisfies
    /// the path-filter expression; `keys` restricts to the given key set.
    /// Both restrictions compose as a logical AND. An empty result is valid.
    async fn list_json_documents(
        &self,
        project: &str,
        collection: &str,
        filter: Option<&str>,
        keys: Option<&[String]>,
    ) -> Result<Vec<JsonDocument>>;

    /// Deletes the document at `(project, collection, key)`.
    ///
    /// Fails with `DocumentNotFound` when no such document exists, so a
    /// double delete surfaces the error on the second call.
    async fn delete_json_document(
        &self,
        project: &str,
        collection: &str,
        key: &str,
    ) -> Result<()>;

    /// Deletes all documents in `(project, collection)` whose key is in `keys`.
    ///
    /// Returns the number of documents actually deleted. Missing keys are
    /// silently skipped; this operation never fails on misses.
    async fn delete_json_documents(
        &self,
        project: &str,
        collection: &str,
        keys: &[String],
    ) -> Result<u64>;

    /// Deletes all documents in a project, or in `(project, collection)`
    /// when a collection is given.
    ///
    /// Never fails when nothing matches. Since collections exist only
    /// through their member documents, this removes the collection(s)
    /// entirely.
    async fn delete_json_collections(
        &self,
        project: &str,
        collection: Option<&str>,
    ) -> Result<()>;
}
