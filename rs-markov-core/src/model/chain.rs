use std::collections::HashMap;

use log::{debug, info, warn};

use crate::error::{MarkovError, Result};
use super::edge::ProbabilityEdge;
use super::node::Node;
use super::tokenizer::{self, SENTINEL};
use super::{DEFAULT_DEPTH, MIN_DEPTH, SENTINEL_ID, TokenId};

/// Variable-depth Markov chain over words.
///
/// The chain owns one [`Node`] per distinct token. Every path of the context
/// trie refers to nodes by [`TokenId`], so a token is stored once no matter
/// how many contexts mention it.
///
/// # Responsibilities
/// - Feed raw text (normalized and split into sentences)
/// - Insert every n-gram of length 2 to `depth + 1` of each sentence
/// - Expose the trie to the generator and the tree codec
///
/// # Invariants
/// - `depth >= 3`
/// - The sentinel node exists with id 0 and is never replaced
/// - `index` and `nodes` agree: `nodes[index[text]].text() == text`
/// - A node holds at most `depth` edge levels
#[derive(Clone, Debug)]
pub struct MarkovChain {
	/// Number of edge levels kept under each node.
	depth: usize,
	/// Nodes, indexed by token id.
	nodes: Vec<Node>,
	/// Token text to token id.
	index: HashMap<String, TokenId>,
}

impl Default for MarkovChain {
	/// Builds an empty chain of depth [`DEFAULT_DEPTH`].
	fn default() -> Self {
		Self::with_depth(DEFAULT_DEPTH)
	}
}

impl MarkovChain {
	/// Creates an empty chain.
	///
	/// # Errors
	/// Returns [`MarkovError::InvalidDepth`] if `depth < 3`.
	pub fn new(depth: usize) -> Result<Self> {
		if depth < MIN_DEPTH {
			return Err(MarkovError::InvalidDepth(depth));
		}
		Ok(Self::with_depth(depth))
	}

	fn with_depth(depth: usize) -> Self {
		let mut chain = Self {
			depth,
			nodes: Vec::new(),
			index: HashMap::new(),
		};
		let sentinel = chain.intern(SENTINEL);
		debug_assert_eq!(sentinel, SENTINEL_ID);
		chain
	}

	pub fn depth(&self) -> usize {
		self.depth
	}

	/// Number of known tokens, sentinel included.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// True if nothing but the sentinel is known.
	///
	/// `len()` is 1, not 0, for such a chain: the sentinel always exists.
	pub fn is_untrained(&self) -> bool {
		self.nodes.len() == 1
	}

	/// Nodes in creation order, starting with the sentinel.
	pub fn nodes(&self) -> impl Iterator<Item = &Node> {
		self.nodes.iter()
	}

	/// The sentence-start node, entry point of every generation.
	pub fn sentinel(&self) -> &Node {
		&self.nodes[SENTINEL_ID]
	}

	/// Looks up the id of a token.
	pub fn id(&self, text: &str) -> Option<TokenId> {
		self.index.get(text).copied()
	}

	/// Text of a token id handed out by this chain.
	pub fn text(&self, id: TokenId) -> &str {
		self.nodes[id].text()
	}

	/// Looks up the node of a token.
	pub fn node(&self, text: &str) -> Option<&Node> {
		self.id(text).map(|id| &self.nodes[id])
	}

	/// Total weight of a token's node, zero for an unknown token.
	pub fn total_weight(&self, text: &str) -> usize {
		self.node(text).map_or(0, Node::total_weight)
	}

	/// True once the sentinel has at least one outgoing edge.
	pub fn is_ready(&self) -> bool {
		self.sentinel().total_weight() > 0
	}

	/// Returns the edge at the end of `path` (`path[0]` is the anchor node).
	///
	/// `["[]", "i", "am"]` is the edge `am` under the edge `i` of the sentinel.
	pub fn path(&self, path: &[&str]) -> Option<&ProbabilityEdge> {
		let (first, rest) = path.split_first()?;
		let anchor = self.id(first)?;
		let ids = rest.iter().map(|text| self.id(text)).collect::<Option<Vec<_>>>()?;
		self.edge(anchor, &ids)
	}

	/// Occurrences of `path`, zero if it was never observed.
	pub fn count(&self, path: &[&str]) -> usize {
		self.path(path).map_or(0, ProbabilityEdge::count)
	}

	/// Walks the trie from `anchor` through `context`.
	///
	/// Returns `None` for an empty context or a context never observed.
	pub fn edge(&self, anchor: TokenId, context: &[TokenId]) -> Option<&ProbabilityEdge> {
		let (first, rest) = context.split_first()?;
		let mut edge = self.nodes.get(anchor)?.edge(*first)?;
		for target in rest {
			edge = edge.child(*target)?;
		}
		Some(edge)
	}

	/// Returns the id of `text`, creating its node on first use.
	pub(crate) fn intern(&mut self, text: &str) -> TokenId {
		if let Some(id) = self.index.get(text) {
			return *id;
		}
		let id = self.nodes.len();
		self.nodes.push(Node::new(text));
		self.index.insert(text.to_owned(), id);
		id
	}

	/// Feeds raw text to the chain.
	///
	/// The text is normalized and split into sentences; each complete sentence
	/// is trained, a trailing incomplete one is ignored.
	///
	/// Returns the number of sentences learned.
	pub fn feed(&mut self, text: &str) -> usize {
		let sentences = tokenizer::sentences(text);
		for sentence in &sentences {
			self.train(sentence);
		}
		info!("learned {} sentences, {} tokens known", sentences.len(), self.len());
		sentences.len()
	}

	/// Trains one tokenized sentence.
	///
	/// Every contiguous n-gram of length 2 to `depth + 1`, from every start
	/// offset, is counted once. Tokens are taken as-is (no normalization).
	pub fn train<S: AsRef<str>>(&mut self, sentence: &[S]) {
		let ids: Vec<TokenId> = sentence.iter().map(|token| self.intern(token.as_ref())).collect();
		let max_len = self.depth + 1;

		for start in 0..ids.len().saturating_sub(1) {
			let longest = max_len.min(ids.len() - start);
			for len in 2..=longest {
				if let Err(e) = self.insert(&ids[start..start + len], 1) {
					warn!("sentence skipped: {e}");
					return;
				}
			}
		}
	}

	/// Adds `count` occurrences of one n-gram.
	///
	/// This is the primitive behind training and import. Missing intermediate
	/// edges are created with `count` occurrences.
	///
	/// # Errors
	/// Returns [`MarkovError::MalformedDocument`] if the path is shorter than 2
	/// tokens, longer than `depth + 1` tokens, `count` is zero, or a count
	/// along the path would overflow.
	pub fn add_path<S: AsRef<str>>(&mut self, path: &[S], count: usize) -> Result<()> {
		if path.len() < 2 || path.len() > self.depth + 1 {
			return Err(MarkovError::MalformedDocument(format!(
				"path of {} tokens is outside 2..={}",
				path.len(),
				self.depth + 1
			)));
		}
		if count == 0 {
			return Err(MarkovError::MalformedDocument("path count must be positive".to_owned()));
		}
		let ids: Vec<TokenId> = path.iter().map(|token| self.intern(token.as_ref())).collect();
		self.insert(&ids, count)
	}

	/// Inserts a path of ids; `path.len()` is within `2..=depth + 1`.
	///
	/// Fails with [`MarkovError::MalformedDocument`] when a count would
	/// overflow; the overflowing count is left unchanged.
	pub(crate) fn insert(&mut self, path: &[TokenId], count: usize) -> Result<()> {
		debug_assert!(path.len() >= 2 && path.len() <= self.depth + 1);
		let overflow = || {
			MarkovError::MalformedDocument(format!("count overflow on a path of {} tokens", path.len()))
		};
		let Some((&anchor, rest)) = path.split_first() else { return Ok(()) };
		let Some((&last, middle)) = rest.split_last() else { return Ok(()) };
		let node = &mut self.nodes[anchor];

		let Some((&first, deeper)) = middle.split_first() else {
			return node.add_edge(last, count).ok_or_else(overflow);
		};

		let (mut edge, _) = node.edge_or_insert(first, count).ok_or_else(overflow)?;
		for &target in deeper {
			edge = edge.child_or_insert(target, count).0;
		}

		let (leaf, created) = edge.child_or_insert(last, count);
		if !created {
			leaf.add(count).ok_or_else(overflow)?;
		}
		Ok(())
	}

	/// Adds everything `other` learned to this chain.
	///
	/// # Errors
	/// Returns [`MarkovError::DepthMismatch`] if the depths differ.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		debug!("merging chain of {} tokens into chain of {} tokens", other.len(), self.len());
		self.import_document(&other.export_document())
	}
}
