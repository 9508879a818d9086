/// Extension traits for built-in Rust types.
///
/// Each extension trait lives in its own file named after what it extends:
/// - `path.rs` - Slash-separated template path handling on `str`
pub mod path;

pub use path::{join, SlashPath};
