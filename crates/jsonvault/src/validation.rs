//! Identifier validation for projects, collections, and document keys.
//!
//! All validation runs before any statement reaches the database, so a
//! rejected identifier never causes a query side effect. Identifiers are
//! always passed to the database as bound parameters; the rules here exist
//! to catch obviously broken caller input early, not to escape anything.

use tracing::{debug, trace};

use crate::{
    constants::{MAX_COLLECTION_LENGTH, MAX_KEY_LENGTH, MAX_PROJECT_LENGTH},
    Result,
    VaultError,
};

/// Checks if an identifier contains only printable characters.
///
/// Control characters (0x00-0x1F, 0x7F) are rejected; everything else,
/// including whitespace and unicode, is allowed since identifiers only ever
/// travel as bound parameters.
fn has_no_control_chars(value: &str) -> bool {
    value.chars().all(|ch| !ch.is_control())
}

/// Validates a project identifier.
///
/// # Rules
/// - Must not be empty
/// - Must not exceed [`MAX_PROJECT_LENGTH`] characters
/// - Must not contain control characters
///
/// # Returns
/// - `Ok(())` if the name is valid
/// - `Err(VaultError::InvalidProjectName)` if the name is invalid
pub fn validate_project_name(name: &str) -> Result<()> {
    trace!("Validating project name: {}", name);
    if name.is_empty() || name.chars().count() > MAX_PROJECT_LENGTH || !has_no_control_chars(name) {
        debug!("Project name rejected: {:?}", name);
        return Err(VaultError::InvalidProjectName {
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// Validates a collection identifier.
///
/// # Rules
/// - Must not be empty
/// - Must not exceed [`MAX_COLLECTION_LENGTH`] characters
/// - Must not contain control characters
///
/// # Returns
/// - `Ok(())` if the name is valid
/// - `Err(VaultError::InvalidCollectionName)` if the name is invalid
pub fn validate_collection_name(name: &str) -> Result<()> {
    trace!("Validating collection name: {}", name);
    if name.is_empty() ||
        name.chars().count() > MAX_COLLECTION_LENGTH ||
        !has_no_control_chars(name)
    {
        debug!("Collection name rejected: {:?}", name);
        return Err(VaultError::InvalidCollectionName {
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// Validates a document key.
///
/// Keys are caller-assigned and may be any printable string (UUIDs, emails,
/// slugs), so the rules are intentionally loose.
///
/// # Rules
/// - Must not be empty
/// - Must not exceed [`MAX_KEY_LENGTH`] characters
/// - Must not contain control characters
///
/// # Returns
/// - `Ok(())` if the key is valid
/// - `Err(VaultError::InvalidDocumentKey)` if the key is invalid
pub fn validate_document_key(key: &str) -> Result<()> {
    trace!("Validating document key: {}", key);
    if key.is_empty() || key.chars().count() > MAX_KEY_LENGTH || !has_no_control_chars(key) {
        debug!("Document key rejected: {:?}", key);
        return Err(VaultError::InvalidDocumentKey {
            key: key.to_owned(),
        });
    }
    Ok(())
}
