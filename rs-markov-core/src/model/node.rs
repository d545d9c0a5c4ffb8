use rand::Rng;

use super::TokenId;
use super::edge::{self, Edges, ProbabilityEdge};

/// One distinct token known by the chain.
///
/// A `Node` is the root of every path starting with its token. Its direct
/// edges are the tokens observed right after it; each of them nests the
/// longer contexts.
///
/// ## Invariants
/// - `total_weight` equals the sum of the direct edges counts
/// - `total_weight` is zero exactly when the node has no outgoing edge
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
	/// Token text, the only identity of a node.
	text: String,
	/// Sum of the direct edges counts.
	total_weight: usize,
	/// Direct edges (depth 1), keyed by target token.
	edges: Edges,
}

impl Node {
	/// Creates a node without any outgoing edge.
	pub fn new(text: &str) -> Self {
		Self {
			text: text.to_owned(),
			total_weight: 0,
			edges: Edges::new(),
		}
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn total_weight(&self) -> usize {
		self.total_weight
	}

	pub fn edges(&self) -> &Edges {
		&self.edges
	}

	/// Returns the direct edge toward `target`.
	pub fn edge(&self, target: TokenId) -> Option<&ProbabilityEdge> {
		self.edges.get(&target)
	}

	/// Records `count` occurrences of the bigram `self -> target`.
	///
	/// Returns `None`, leaving the node unchanged, if a count would overflow.
	pub(crate) fn add_edge(&mut self, target: TokenId, count: usize) -> Option<()> {
		let total_weight = self.total_weight.checked_add(count)?;
		match self.edges.get_mut(&target) {
			Some(edge) => edge.add(count)?,
			None => {
				self.edges.insert(target, ProbabilityEdge::new(target, count));
			}
		}
		self.total_weight = total_weight;
		Some(())
	}

	/// Returns the direct edge toward `target`, creating it with `count`
	/// occurrences if needed.
	///
	/// The node weight only grows when the edge is created here. Returns
	/// `None`, leaving the node unchanged, if that weight would overflow.
	pub(crate) fn edge_or_insert(&mut self, target: TokenId, count: usize) -> Option<(&mut ProbabilityEdge, bool)> {
		let created = !self.edges.contains_key(&target);
		if created {
			self.total_weight = self.total_weight.checked_add(count)?;
		}
		let edge = self.edges
			.entry(target)
			.or_insert_with(|| ProbabilityEdge::new(target, count));
		Some((edge, created))
	}

	/// Draws the next token among the direct edges.
	///
	/// Returns `None` if the node was never followed by anything.
	pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<TokenId> {
		edge::draw(&self.edges, self.total_weight, rng)
	}
}
