//! Error types for the Markov chain engine.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, MarkovError>;

/// Everything that can go wrong while building, feeding, or persisting a chain.
///
/// Degenerate inputs (text without a complete sentence, a generation context
/// never seen during training) are not errors: they are absorbed by policy.
#[derive(Error, Debug)]
pub enum MarkovError {
	/// The chain was constructed with a depth below the supported minimum.
	#[error("depth must be >= {min}, got {0}", min = crate::model::MIN_DEPTH)]
	InvalidDepth(usize),

	/// A tree document was built for a chain of another depth.
	#[error("document depth {found} does not match chain depth {expected}")]
	DepthMismatch { expected: usize, found: usize },

	/// `generate` was called before the chain learned any sentence.
	#[error("chain is not ready to generate (no sentence learned yet)")]
	NotReady,

	/// A tree document is structurally invalid.
	#[error("malformed document: {0}")]
	MalformedDocument(String),

	/// IO error
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON encoding or decoding failed.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Binary encoding or decoding failed.
	#[error("binary encoding error: {0}")]
	Postcard(#[from] postcard::Error),
}

impl MarkovError {
	/// True for the configuration errors (bad depth, depth mismatch).
	pub fn is_configuration(&self) -> bool {
		matches!(self, Self::InvalidDepth(_) | Self::DepthMismatch { .. })
	}
}
