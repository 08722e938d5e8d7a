//! Error types for the rendering core.
//!
//! Failures fall into three classes with different handling policies:
//!
//! - Configuration errors (conflicting blueprints, invalid pipeline
//!   descriptors) abort construction. Without a well-defined static resource
//!   and pipeline set there is no graph to run.
//! - Graph integrity errors (dependency cycles, unknown pass names) abort
//!   Bake. A partial or guessed pass order has no safe execution semantics.
//! - Runtime resource errors (unsupported format combinations, allocation
//!   failures) are logged and degrade to visibly-missing content instead of
//!   halting the frame loop.

use thiserror::Error;

/// Top-level error type for the graphics core.
#[derive(Error, Debug)]
pub enum GraphicsError {
    /// A static configuration conflict detected at construction time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The render graph could not be compiled or driven.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A concrete resource could not be created.
    #[error("resource creation failed: {0}")]
    ResourceCreation(String),

    /// A format/usage/layout combination the backend cannot express.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Errors produced while compiling or driving the render graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The dependency edges among the named passes form a cycle.
    ///
    /// Render graphs must be directed acyclic graphs. Baking never resolves
    /// a cycle to a partial or arbitrary order.
    #[error("render graph contains a dependency cycle among passes: {0:?}")]
    CyclicDependency(Vec<String>),

    /// A pass names a dependency that was never declared.
    #[error("pass `{pass}` depends on unknown pass `{dependency}`")]
    UnknownDependency { pass: String, dependency: String },

    /// A pass with this name has already been declared.
    #[error("duplicate pass name `{0}`")]
    DuplicatePass(String),

    /// `bake` was called on a graph that is already baked.
    #[error("render graph has already been baked")]
    AlreadyBaked,

    /// An operation that requires a baked graph was called before `bake`.
    #[error("render graph has not been baked")]
    NotBaked,
}
