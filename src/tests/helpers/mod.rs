pub mod tempdir;
pub mod tools;

// Re-export the common helpers for easy access
pub use tempdir::unique_temp_dir;
pub use tools::{test_config, FakeToolchain, FakeTools};
