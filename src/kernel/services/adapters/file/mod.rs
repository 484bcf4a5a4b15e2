//! Content Store backends.

pub mod local;

pub use local::LocalContentStore;
