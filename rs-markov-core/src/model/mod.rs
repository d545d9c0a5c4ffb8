//! Top-level module for the Markov chain engine.
//!
//! This module provides a variable-depth word model, including:
//! - Text normalization and sentence splitting (`tokenizer`)
//! - The context trie (`Node`, `ProbabilityEdge`)
//! - Training and lookup (`MarkovChain`)
//! - Weighted sentence generation (`Generator`)
//! - Export and import of the trie (`TreeDocument`)

/// Text normalization and sentence splitting.
pub mod tokenizer;

/// Weighted transitions of the context trie and the weighted draw.
pub mod edge;

/// One node per distinct token, root of the paths starting with it.
pub mod node;

/// The chain itself: owns the nodes, trains sentences, walks contexts.
pub mod chain;

/// Sentence generation with an injectable random source.
pub mod generator;

/// Tree document export/import and its encodings.
pub mod document;

/// Index of a token in its chain.
pub type TokenId = usize;

/// Id of the sentence-start sentinel, created with every chain.
pub const SENTINEL_ID: TokenId = 0;

/// Smallest supported depth.
pub const MIN_DEPTH: usize = 3;

/// Depth used by `MarkovChain::default`.
pub const DEFAULT_DEPTH: usize = 8;
