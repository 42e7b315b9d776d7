// Human- and machine-readable presentation of a file's error list

mod format;
mod messages;

// Re-export all public symbols
pub use format::*;
pub use messages::*;
