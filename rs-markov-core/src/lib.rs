//! Word-level Markov chain text generation library.
//!
//! This crate learns a variable-depth n-gram model from raw text and
//! generates new sentences from it:
//! - Fixed normalization of fed text into sentences of tokens
//! - A context trie counting every n-gram up to the configured depth
//! - Weighted random generation with a seedable random source
//! - Lossless export/import through a tree document (JSON or binary)
//!
//! ```
//! use rs_markov_core::{Generator, MarkovChain};
//!
//! let mut chain = MarkovChain::new(3)?;
//! chain.feed("I am here. I am there.");
//!
//! let sentence = Generator::from_seed(7).generate(&chain)?;
//! assert!(sentence == "I am here." || sentence == "I am there.");
//! # Ok::<(), rs_markov_core::MarkovError>(())
//! ```

/// Core chain, generation and document logic.
pub mod model;

/// Error taxonomy shared by every operation.
pub mod error;

/// File helpers (text loading, document save/load).
pub mod io;

pub use error::{MarkovError, Result};
pub use model::chain::MarkovChain;
pub use model::document::{EdgeElement, NodeElement, TreeDocument};
pub use model::generator::Generator;
