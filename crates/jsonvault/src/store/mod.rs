/// Store implementation.
pub mod manager;
/// Store operations.
pub mod operations;
/// Schema and merge-function installation.
pub mod schema;

pub use manager::DocumentStore;
