//! Core XML parsing primitives
//!
//! The building blocks below the tree layer:
//! - Encoding: BOM detection and UTF-8/UTF-16 stream decoding
//! - Names: XML 1.0 name character classification
//! - Entities: entity resolution during collection, escaping on output
//! - Parser: character-at-a-time syntax state machine

pub mod encoding;
pub mod entities;
pub mod names;
pub mod parser;
