//! Shared data model and error taxonomy for the favorites workspace.

pub mod error;
pub mod types;

pub use error::FavoritesError;
pub use types::{CorruptPolicy, OutputFormat, PoemRecord, SavedPoemEntry};
