// Serialization of a tree back to text

mod serializer;

// Re-export all public symbols
pub use serializer::*;
