use log::debug;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{MarkovError, Result};
use super::chain::MarkovChain;
use super::tokenizer::is_terminal;
use super::{SENTINEL_ID, TokenId};

/// Upper bound on the number of tokens of one generated sentence.
pub const MAX_TOKENS: usize = 50;

/// Sentence generator reading a [`MarkovChain`].
///
/// The generator owns its random source, so a seeded generator replays the
/// same sentences for the same chain.
///
/// # Behavior
/// - The first `depth` tokens are drawn from the sentinel, each one walking
///   the sentinel path through every token generated so far
/// - Then the window rolls: the oldest of the last `depth - 1` tokens anchors
///   the walk, the others form the context
/// - Generation stops on `.`, `!` or `?`, on a context never seen during
///   training, or after `max_tokens` tokens
#[derive(Debug)]
pub struct Generator<R = StdRng> {
	rng: R,

	/// Maximum number of tokens emitted for one sentence.
	pub max_tokens: usize,
}

impl Generator<StdRng> {
	/// Creates a reproducible generator.
	pub fn from_seed(seed: u64) -> Self {
		Self::new(StdRng::seed_from_u64(seed))
	}

	/// Creates a generator seeded by the operating system.
	pub fn from_os_rng() -> Self {
		Self::new(StdRng::from_os_rng())
	}
}

impl<R: Rng> Generator<R> {
	/// Creates a generator drawing from `rng`.
	pub fn new(rng: R) -> Self {
		Self {
			rng,
			max_tokens: MAX_TOKENS,
		}
	}

	/// Generates the token ids of one sentence.
	///
	/// # Errors
	/// Returns [`MarkovError::NotReady`] if the chain never learned a sentence.
	pub fn generate_tokens(&mut self, chain: &MarkovChain) -> Result<Vec<TokenId>> {
		if !chain.is_ready() {
			return Err(MarkovError::NotReady);
		}

		let depth = chain.depth();
		let mut emitted: Vec<TokenId> = Vec::new();

		while emitted.len() < self.max_tokens {
			let next = if emitted.is_empty() {
				chain.sentinel().draw(&mut self.rng)
			} else if emitted.len() < depth {
				chain
					.edge(SENTINEL_ID, &emitted)
					.and_then(|edge| edge.draw(&mut self.rng))
			} else {
				let window = &emitted[emitted.len() - (depth - 1)..];
				window
					.split_first()
					.and_then(|(&anchor, context)| chain.edge(anchor, context))
					.and_then(|edge| edge.draw(&mut self.rng))
			};

			let Some(token) = next else {
				debug!("context never observed, stopping after {} tokens", emitted.len());
				break;
			};

			emitted.push(token);
			if is_terminal(chain.text(token)) {
				break;
			}
		}

		Ok(emitted)
	}

	/// Generates one sentence.
	///
	/// Tokens are joined by single spaces, without a space before the final
	/// punctuation, and the first character is uppercased.
	///
	/// # Errors
	/// Returns [`MarkovError::NotReady`] if the chain never learned a sentence.
	pub fn generate(&mut self, chain: &MarkovChain) -> Result<String> {
		let tokens = self.generate_tokens(chain)?;
		Ok(render(tokens.iter().map(|&id| chain.text(id))))
	}

	/// Generates `count` sentences.
	pub fn generate_many(&mut self, chain: &MarkovChain, count: usize) -> Result<Vec<String>> {
		(0..count).map(|_| self.generate(chain)).collect()
	}
}

/// Joins tokens into a sentence and capitalizes it.
pub fn render<'a, I: IntoIterator<Item = &'a str>>(tokens: I) -> String {
	let mut sentence = String::new();
	for token in tokens {
		if !sentence.is_empty() && !is_terminal(token) {
			sentence.push(' ');
		}
		sentence.push_str(token);
	}

	let mut chars = sentence.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => sentence,
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
	fn render_joins_and_capitalizes() {
		assert_eq!(render(["i", "am", "here", "."]), "I am here.");
		assert_eq!(render(["élan", "vital", "!"]), "Élan vital!");
		assert_eq!(render(["unfinished", "thought"]), "Unfinished thought");
		assert_eq!(render(Vec::<&str>::new()), "");
	}

	#[test]
	fn not_ready_is_an_error() {
		let chain = MarkovChain::new(3).unwrap();
		let mut generator = Generator::from_seed(0);
		assert!(matches!(generator.generate(&chain), Err(MarkovError::NotReady)));
	}

	#[test]
	fn single_sentence_is_replayed() {
		let chain = trained(3, "The quick brown fox jumps over the lazy dog.");
		let mut generator = Generator::from_seed(11);
		assert_eq!(generator.generate(&chain).unwrap(), "The quick brown fox jumps over the lazy dog.");
	}

	#[test]
	fn output_comes_from_trained_sentences() {
		let chain = trained(3, "I am here. I am there.");
		let mut generator = Generator::from_seed(5);
		for sentence in generator.generate_many(&chain, 30).unwrap() {
			assert!(sentence == "I am here." || sentence == "I am there.", "got {sentence}");
		}
	}

	#[test]
	fn same_seed_same_sentences() {
		let text = "A cat sat on a mat. A dog sat on a log. A cat ran to a dog! Is a dog on a mat?";
		let chain = trained(4, text);
		let left = Generator::from_seed(99).generate_many(&chain, 20).unwrap();
		let right = Generator::from_seed(99).generate_many(&chain, 20).unwrap();
		assert_eq!(left, right);
	}

	#[test]
	fn looping_chain_is_bounded() {
		let mut chain = MarkovChain::new(3).unwrap();
		// A cycle with no way out: "go" always follows "go".
		chain.train(&["[]", "go", "go", "go", "go"]);
		let mut generator = Generator::from_seed(1);
		let tokens = generator.generate_tokens(&chain).unwrap();
		assert_eq!(tokens.len(), MAX_TOKENS);

		let sentence = generator.generate(&chain).unwrap();
		assert_eq!(sentence.split(' ').count(), MAX_TOKENS);
		assert!(sentence.starts_with("Go"));
	}

	#[test]
	fn unseen_context_stops_early() {
		let mut chain = MarkovChain::new(3).unwrap();
		chain.train(&["[]", "hello", "world"]);
		let mut generator = Generator::from_seed(8);
		assert_eq!(generator.generate(&chain).unwrap(), "Hello world");
	}

	#[test]
	fn max_tokens_is_configurable() {
		let mut chain = MarkovChain::new(3).unwrap();
		chain.train(&["[]", "la", "la", "la", "la"]);
		let mut generator = Generator::from_seed(2);
		generator.max_tokens = 5;
		assert_eq!(generator.generate(&chain).unwrap(), "La la la la la");
	}
}
