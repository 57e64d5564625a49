pub mod api;
pub mod constants;
pub mod document;
pub mod error;
pub mod filter;
pub mod merge;
pub mod store;
pub mod validation;

pub use api::JsonDocumentManager;
pub use document::JsonDocument;
pub use error::{Result, VaultError};
pub use filter::{PathCondition, PathFilter};
pub use merge::merge_patch;
pub use store::DocumentStore;
