// The in-memory tree: item kinds, the arena they live in, their errors,
// and the file container orchestrating load/save/revalidate

mod error;
mod file;
mod items;
mod tree;

// Re-export all public symbols
pub use error::*;
pub use file::*;
pub use items::*;
pub use tree::*;
