use std::collections::BTreeMap;

use rand::Rng;

use super::TokenId;

/// Outgoing transitions at one level of the context trie, keyed by target token.
///
/// A `BTreeMap` keeps the iteration order a pure function of the contents, so a
/// fixed random draw always selects the same entry.
pub type Edges = BTreeMap<TokenId, ProbabilityEdge>;

/// One weighted transition of the context trie.
///
/// An edge stores how many times the exact path leading to it was observed,
/// and the edges one level deeper (the tokens that followed this path).
///
/// ## Invariants
/// - `count` is strictly positive
/// - `target` refers to a node owned by the chain, the edge never owns it
/// - `count` is at least the sum of the children counts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbabilityEdge {
	/// Token this edge leads to.
	target: TokenId,
	/// Number of occurrences of this exact path.
	count: usize,
	/// Continuations of this path, one level deeper.
	children: Edges,
}

impl ProbabilityEdge {
	/// Creates a leaf edge toward `target` observed `count` times.
	pub fn new(target: TokenId, count: usize) -> Self {
		Self {
			target,
			count,
			children: Edges::new(),
		}
	}

	pub fn target(&self) -> TokenId {
		self.target
	}

	pub fn count(&self) -> usize {
		self.count
	}

	pub fn children(&self) -> &Edges {
		&self.children
	}

	/// Returns the child edge toward `target`, if that continuation was observed.
	pub fn child(&self, target: TokenId) -> Option<&ProbabilityEdge> {
		self.children.get(&target)
	}

	/// Sum of the children counts, the total used when drawing a continuation.
	///
	/// Saturates instead of overflowing.
	pub fn children_weight(&self) -> usize {
		self.children
			.values()
			.fold(0, |total, child| total.saturating_add(child.count))
	}

	/// Records `count` more occurrences of this path.
	///
	/// Returns `None`, leaving the edge unchanged, if the count would overflow.
	pub(crate) fn add(&mut self, count: usize) -> Option<()> {
		self.count = self.count.checked_add(count)?;
		Some(())
	}

	/// Returns the child toward `target`, creating it with `count` occurrences
	/// when it does not exist yet.
	///
	/// The boolean is `true` when the child was created.
	pub(crate) fn child_or_insert(&mut self, target: TokenId, count: usize) -> (&mut ProbabilityEdge, bool) {
		let created = !self.children.contains_key(&target);
		let child = self.children
			.entry(target)
			.or_insert_with(|| ProbabilityEdge::new(target, count));
		(child, created)
	}

	/// Draws one continuation of this path, weighted by the children counts.
	///
	/// Returns `None` when the path was never continued.
	pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<TokenId> {
		draw(&self.children, self.children_weight(), rng)
	}
}

/// Weighted draw over a set of sibling edges.
///
/// A value is drawn uniformly in `[0, total)`, then edges are scanned in map
/// order, subtracting each count until the value falls inside one bucket.
/// The probability of an edge is therefore `count / total`.
///
/// Returns `None` if `total` is zero or there are no edges.
pub fn draw<R: Rng + ?Sized>(edges: &Edges, total: usize, rng: &mut R) -> Option<TokenId> {
	if total == 0 || edges.is_empty() {
		return None;
	}

	let mut r = rng.random_range(0..total);

	let mut fallback: Option<TokenId> = None;
	for edge in edges.values() {
		if r < edge.count {
			return Some(edge.target);
		}
		r -= edge.count;
		fallback = Some(edge.target);
	}

	// Only reachable if `total` overstates the sum of counts
	fallback
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn edges(weights: &[(TokenId, usize)]) -> Edges {
		weights
			.iter()
			.map(|&(target, count)| (target, ProbabilityEdge::new(target, count)))
			.collect()
	}

	#[test]
	fn draw_on_empty_returns_none() {
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(draw(&Edges::new(), 0, &mut rng), None);
		assert_eq!(draw(&edges(&[(1, 3)]), 0, &mut rng), None);
	}

	#[test]
	fn draw_single_edge_is_certain() {
		let mut rng = StdRng::seed_from_u64(7);
		let e = edges(&[(4, 2)]);
		for _ in 0..20 {
			assert_eq!(draw(&e, 2, &mut rng), Some(4));
		}
	}

	#[test]
	fn draw_is_reproducible_with_same_seed() {
		let e = edges(&[(1, 3), (2, 5), (3, 1)]);
		let mut a = StdRng::seed_from_u64(42);
		let mut b = StdRng::seed_from_u64(42);
		let left: Vec<_> = (0..50).map(|_| draw(&e, 9, &mut a)).collect();
		let right: Vec<_> = (0..50).map(|_| draw(&e, 9, &mut b)).collect();
		assert_eq!(left, right);
	}

	#[test]
	fn draw_follows_counts() {
		let e = edges(&[(1, 9), (2, 1)]);
		let mut rng = StdRng::seed_from_u64(2024);
		let trials = 20_000;
		let hits = (0..trials).filter(|_| draw(&e, 10, &mut rng) == Some(1)).count();
		let ratio = hits as f64 / trials as f64;
		assert!((ratio - 0.9).abs() < 0.02, "ratio was {ratio}");
	}

	#[test]
	fn add_refuses_to_overflow() {
		let mut edge = ProbabilityEdge::new(0, usize::MAX - 1);
		assert_eq!(edge.add(1), Some(()));
		assert_eq!(edge.add(1), None);
		assert_eq!(edge.count(), usize::MAX);

		edge.child_or_insert(1, usize::MAX);
		edge.child_or_insert(2, 5);
		assert_eq!(edge.children_weight(), usize::MAX);
	}

	#[test]
	fn child_or_insert_reports_creation() {
		let mut edge = ProbabilityEdge::new(0, 1);
		let (_, created) = edge.child_or_insert(5, 2);
		assert!(created);
		let (child, created) = edge.child_or_insert(5, 7);
		assert!(!created);
		assert_eq!(child.count(), 2);
		assert_eq!(edge.children_weight(), 2);
	}
}
