//! # Shadetree
//!
//! Lowers a layered shader-tree network (masks containing stacked texture and
//! noise layers feeding a terminal material) into a declarative shading graph
//! of typed nodes, typed inputs/outputs and explicit connections, following a
//! MaterialX-style standard-surface target vocabulary.
//!
//! The pass is a synchronous, single-threaded transform: a recursive descent
//! over the read-only input tree, threading a mutable [`lower::ShadingContext`]
//! and appending to an abstract [`graph::GraphSink`]. Nothing in the pass is
//! fatal: malformed data degrades to a sentinel plus a recorded diagnostic.
//!
//! ## Modules
//!
//! - [`util`] - Errors, name sanitization
//! - [`tree`] - Input IR (shader-tree nodes and channel values)
//! - [`graph`] - Output graph contract (sink trait, value kinds, in-memory graph)
//! - [`map`] - Static mapping tables and typed literal coercion
//! - [`lower`] - The lowering pass itself
//! - [`config`] - Pass configuration
//! - [`diag`] - Diagnostics collected alongside the result
//!
//! ## Example
//!
//! ```ignore
//! use shadetree::prelude::*;
//!
//! let tree: ShaderTreeNode = serde_json::from_str(&json)?;
//! let mut graph = MemoryGraph::new();
//! let maps = Mappings::default();
//! let lowerer = Lowerer::new(LowerConfig::default(), &maps);
//! let diags = lowerer.lower(&tree, &mut graph);
//! ```

pub mod config;
pub mod diag;
pub mod graph;
pub mod lower;
pub mod map;
pub mod tree;
pub mod util;

// Re-export commonly used types
pub use config::{LowerConfig, ShadingVariant};
pub use diag::{DiagKind, Diagnostic, Diagnostics};
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{LowerConfig, ShadingVariant};
    pub use crate::diag::{DiagKind, Diagnostic, Diagnostics};
    pub use crate::graph::{GraphSink, Literal, MemoryGraph, Operand, ValueKind};
    pub use crate::lower::{fold_stack, BlendMode, Connector, EffectStack, Lowerer};
    pub use crate::map::Mappings;
    pub use crate::tree::{ChannelValue, NodeKind, ShaderTreeNode};
    pub use crate::util::{clean_name, Error, Result};
}
