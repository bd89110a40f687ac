//! Streaming FIX tag-value parser driven by an external FIX Orchestra schema.
//!
//! [`Repository`] loads the schema once; [`Message::parse`] then walks a flat
//! `(tag, value)` token stream and reconstructs the tree of repeating groups
//! it implies, using nothing but schema lookups and a single context pointer.
//! [`Message::to_json`] renders the result for downstream consumers.

pub mod error;
pub mod json;
pub mod parser;
pub mod repository;
pub mod spec;
pub mod tokenizer;
pub mod tree;

pub use error::RepositoryError;
pub use parser::Message;
pub use repository::Repository;
pub use tree::Field;
