// Syntax-and-schema definitions for the supported file types

mod definition;
mod registry;

// Re-export all public symbols
pub use definition::*;
pub use registry::*;
