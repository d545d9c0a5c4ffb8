//! Tree document: the persisted form of a [`MarkovChain`].
//!
//! The document mirrors the context trie. The root carries the chain depth,
//! each node element carries its token, and each edge element carries its
//! target token, its count and the edges one level deeper.
//!
//! ```json
//! { "depth": 3, "nodes": [
//!   { "text": "[]", "edges": [
//!     { "text": "i", "count": 2, "edges": [ ... ] } ] } ] }
//! ```

use std::collections::VecDeque;

use log::{debug, info};

use serde::{Deserialize, Serialize};

use crate::error::{MarkovError, Result};
use super::chain::MarkovChain;
use super::edge::ProbabilityEdge;
use super::tokenizer::SENTINEL;
use super::TokenId;

/// Root of a serialized chain.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TreeDocument {
	/// Depth of the chain that produced the document.
	pub depth: usize,
	/// One element per known token, sentinel first.
	pub nodes: Vec<NodeElement>,
}

/// A token and the paths starting with it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NodeElement {
	pub text: String,
	#[serde(default)]
	pub edges: Vec<EdgeElement>,
}

/// One edge of the trie and its continuations.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EdgeElement {
	pub text: String,
	pub count: usize,
	#[serde(default)]
	pub edges: Vec<EdgeElement>,
}

impl TreeDocument {
	/// Encodes the document as pretty-printed JSON.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}

	/// Decodes a JSON document. Missing `text`, `count` or `depth` fields fail.
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Encodes the document in the compact binary format.
	pub fn to_bytes(&self) -> Result<Vec<u8>> {
		Ok(postcard::to_stdvec(self)?)
	}

	/// Decodes a binary document.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
		Ok(postcard::from_bytes(bytes)?)
	}

	/// Checks the structure against what a chain of the document depth can hold.
	///
	/// # Errors
	/// Returns [`MarkovError::MalformedDocument`] on an empty token, a zero
	/// count, an edge toward the sentinel, edges nested deeper than `depth`,
	/// or sibling edges whose counts overflow once summed.
	pub fn validate(&self) -> Result<()> {
		for node in &self.nodes {
			if node.text.is_empty() {
				return Err(MarkovError::MalformedDocument("node with empty text".to_owned()));
			}
			if weight(&node.edges).is_none() {
				return Err(MarkovError::MalformedDocument(format!(
					"edge counts of '{}' overflow",
					node.text
				)));
			}
			for edge in &node.edges {
				edge.validate(&node.text, 1, self.depth)?;
			}
		}
		Ok(())
	}
}

impl EdgeElement {
	fn validate(&self, owner: &str, level: usize, depth: usize) -> Result<()> {
		let malformed = |reason: &str| {
			MarkovError::MalformedDocument(format!("edge '{}' under '{}': {}", self.text, owner, reason))
		};

		if level > depth {
			return Err(malformed(&format!("nested deeper than {depth} levels")));
		}
		if self.text.is_empty() {
			return Err(malformed("empty text"));
		}
		if self.text == SENTINEL {
			return Err(malformed("the sentence start cannot be a transition target"));
		}
		if self.count == 0 {
			return Err(malformed("count must be positive"));
		}
		if weight(&self.edges).is_none() {
			return Err(malformed("children counts overflow"));
		}

		self.edges
			.iter()
			.try_for_each(|edge| edge.validate(owner, level + 1, depth))
	}
}

/// Sum of sibling counts, `None` on overflow.
fn weight(edges: &[EdgeElement]) -> Option<usize> {
	edges.iter().try_fold(0usize, |total, edge| total.checked_add(edge.count))
}

impl MarkovChain {
	/// Exports everything learned to a tree document.
	///
	/// Nodes come in creation order and edges in map order, so exporting an
	/// unchanged chain twice yields identical documents.
	pub fn export_document(&self) -> TreeDocument {
		let nodes = self
			.nodes()
			.map(|node| NodeElement {
				text: node.text().to_owned(),
				edges: node.edges().values().map(|edge| self.export_edge(edge)).collect(),
			})
			.collect();

		TreeDocument { depth: self.depth(), nodes }
	}

	fn export_edge(&self, edge: &ProbabilityEdge) -> EdgeElement {
		EdgeElement {
			text: self.text(edge.target()).to_owned(),
			count: edge.count(),
			edges: edge.children().values().map(|child| self.export_edge(child)).collect(),
		}
	}

	/// Loads a tree document into the chain.
	///
	/// Every node element is created first, then each edge element is
	/// replayed breadth-first through the training primitive with its stored
	/// count. The full path of an edge is carried along the traversal.
	/// Counts add up with what the chain already knows.
	///
	/// # Errors
	/// - [`MarkovError::DepthMismatch`] if the document depth differs
	/// - [`MarkovError::MalformedDocument`] if the structure is invalid
	/// - [`MarkovError::MalformedDocument`] if adding the counts to what the
	///   chain already holds would overflow
	///
	/// On error the chain is left untouched.
	pub fn import_document(&mut self, document: &TreeDocument) -> Result<()> {
		if document.depth != self.depth() {
			return Err(MarkovError::DepthMismatch {
				expected: self.depth(),
				found: document.depth,
			});
		}
		document.validate()?;

		let mut staged = self.clone();
		staged.replay(document)?;
		*self = staged;
		Ok(())
	}

	fn replay(&mut self, document: &TreeDocument) -> Result<()> {
		for node in &document.nodes {
			self.intern(&node.text);
		}

		let mut replayed = 0usize;
		for node in &document.nodes {
			let anchor = self.intern(&node.text);
			let mut queue: VecDeque<(Vec<TokenId>, &EdgeElement)> = node
				.edges
				.iter()
				.map(|edge| (vec![anchor], edge))
				.collect();

			while let Some((mut path, element)) = queue.pop_front() {
				path.push(self.intern(&element.text));
				self.insert(&path, element.count)?;
				replayed += 1;

				for child in &element.edges {
					queue.push_back((path.clone(), child));
				}
			}
			debug!("imported paths of '{}'", node.text);
		}

		info!("imported {} nodes and {} edges", document.nodes.len(), replayed);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn trained(depth: usize, text: &str) -> MarkovChain {
		let mut chain = MarkovChain::new(depth).unwrap();
		chain.feed(text);
		chain
	}

	#[test]
	fn export_mirrors_the_trie() {
		let chain = trained(3, "I am here. I am there.");
		let document = chain.export_document();
		assert_eq!(document.depth, 3);
		assert_eq!(document.nodes.len(), chain.len());

		let sentinel = &document.nodes[0];
		assert_eq!(sentinel.text, "[]");
		assert_eq!(sentinel.edges.len(), 1);
		let i = &sentinel.edges[0];
		assert_eq!((i.text.as_str(), i.count), ("i", 2));
		let am = &i.edges[0];
		assert_eq!((am.text.as_str(), am.count), ("am", 2));
		let leaves: Vec<_> = am.edges.iter().map(|e| (e.text.as_str(), e.count, e.edges.len())).collect();
		assert_eq!(leaves, vec![("here", 1, 0), ("there", 1, 0)]);
	}

	#[test]
	fn export_is_idempotent() {
		let chain = trained(4, "One two three. Two three four! Three four five?");
		assert_eq!(chain.export_document(), chain.export_document());
	}

	#[test]
	fn import_reproduces_counts() {
		let chain = trained(4, "A b c d e. A b x y! B c d?");
		let document = chain.export_document();

		let mut copy = MarkovChain::new(4).unwrap();
		copy.import_document(&document).unwrap();

		assert_eq!(copy.export_document(), document);
		assert_eq!(copy.count(&["[]", "a", "b"]), 2);
		assert_eq!(copy.count(&["b", "c", "d"]), 2);
		assert_eq!(copy.total_weight("[]"), chain.total_weight("[]"));
	}

	#[test]
	fn depth_mismatch_leaves_chain_untouched() {
		let document = trained(3, "Hello there.").export_document();
		let mut chain = trained(5, "Something else.");
		let before = chain.export_document();

		let err = chain.import_document(&document).unwrap_err();
		assert!(matches!(err, MarkovError::DepthMismatch { expected: 5, found: 3 }));
		assert!(err.is_configuration());
		assert_eq!(chain.export_document(), before);
	}

	#[test]
	fn malformed_documents_are_rejected_before_mutation() {
		let mut chain = MarkovChain::new(3).unwrap();
		let leaf = |text: &str, count| EdgeElement { text: text.to_owned(), count, edges: vec![] };

		let zero = TreeDocument {
			depth: 3,
			nodes: vec![NodeElement { text: "a".to_owned(), edges: vec![leaf("b", 0)] }],
		};
		assert!(matches!(chain.import_document(&zero), Err(MarkovError::MalformedDocument(_))));

		let to_sentinel = TreeDocument {
			depth: 3,
			nodes: vec![NodeElement { text: "a".to_owned(), edges: vec![leaf("[]", 1)] }],
		};
		assert!(chain.import_document(&to_sentinel).is_err());

		let mut deep = leaf("e", 1);
		for text in ["d", "c", "b"] {
			deep = EdgeElement { text: text.to_owned(), count: 1, edges: vec![deep] };
		}
		let too_deep = TreeDocument {
			depth: 3,
			nodes: vec![NodeElement { text: "a".to_owned(), edges: vec![deep] }],
		};
		assert!(chain.import_document(&too_deep).is_err());

		assert_eq!(chain.len(), 1);
	}

	#[test]
	fn overflowing_counts_are_rejected() {
		let leaf = |text: &str, count| EdgeElement { text: text.to_owned(), count, edges: vec![] };
		let siblings = TreeDocument {
			depth: 3,
			nodes: vec![NodeElement { text: "a".to_owned(), edges: vec![leaf("b", usize::MAX), leaf("c", 1)] }],
		};
		let mut chain = MarkovChain::new(3).unwrap();
		assert!(matches!(chain.import_document(&siblings), Err(MarkovError::MalformedDocument(_))));
		assert_eq!(chain.len(), 1);

		let children = TreeDocument {
			depth: 3,
			nodes: vec![NodeElement {
				text: "a".to_owned(),
				edges: vec![EdgeElement {
					text: "b".to_owned(),
					count: 1,
					edges: vec![leaf("c", usize::MAX), leaf("d", 1)],
				}],
			}],
		};
		assert!(chain.import_document(&children).is_err());
		assert_eq!(chain.len(), 1);
	}

	#[test]
	fn overflow_against_existing_counts_leaves_chain_untouched() {
		let mut chain = trained(3, "A b c. A b d.");
		let before = chain.export_document();

		let huge = TreeDocument {
			depth: 3,
			nodes: vec![NodeElement {
				text: "a".to_owned(),
				edges: vec![EdgeElement { text: "b".to_owned(), count: usize::MAX, edges: vec![] }],
			}],
		};
		let err = chain.import_document(&huge).unwrap_err();
		assert!(matches!(err, MarkovError::MalformedDocument(_)));
		assert_eq!(chain.export_document(), before);
		assert_eq!(chain.total_weight("a"), 2);
	}

	#[test]
	fn text_rebuilding_the_sentinel_round_trips() {
		let chain = trained(3, "hello [,] world. again [[]] here. and [\r] there!");
		assert_eq!(chain.count(&["hello", "[]"]), 0);
		assert!(chain.nodes().skip(1).all(|node| node.text() != "[]"));

		let document = chain.export_document();
		let mut copy = MarkovChain::new(3).unwrap();
		copy.import_document(&document).unwrap();
		assert_eq!(copy.export_document(), document);

		let mut generator = crate::Generator::from_seed(12);
		for sentence in generator.generate_many(&chain, 20).unwrap() {
			assert!(!sentence.contains("[]"), "{sentence}");
		}
	}

	#[test]
	fn json_missing_count_fails() {
		let json = r#"{ "depth": 3, "nodes": [ { "text": "a", "edges": [ { "text": "b" } ] } ] }"#;
		assert!(matches!(TreeDocument::from_json(json), Err(MarkovError::Json(_))));
	}

	#[test]
	fn json_without_edges_is_accepted() {
		let json = r#"{ "depth": 3, "nodes": [ { "text": "[]" }, { "text": "." } ] }"#;
		let document = TreeDocument::from_json(json).unwrap();
		let mut chain = MarkovChain::new(3).unwrap();
		chain.import_document(&document).unwrap();
		assert_eq!(chain.len(), 2);
		assert!(!chain.is_ready());
	}

	#[test]
	fn encodings_preserve_the_document() {
		let document = trained(3, "Round and round we go. We go home!").export_document();

		let json = document.to_json().unwrap();
		assert_eq!(TreeDocument::from_json(&json).unwrap(), document);

		let bytes = document.to_bytes().unwrap();
		assert_eq!(TreeDocument::from_bytes(&bytes).unwrap(), document);
	}
}
