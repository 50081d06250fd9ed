//! DOM Module - Arena-based XML tree
//!
//! - Arena allocation for nodes with NodeId (u32) indices
//! - Document builder driven by the syntax event stream
//! - Namespace and path lookup over the finished tree
//! - Serialization back to a stable textual form

pub mod document;
pub mod node;
pub mod serializer;

pub use document::{Children, Document};
pub use node::{Node, NodeData, NodeId, NodeKind};
pub use serializer::{save, save_document};
