/// Reserved token marking the start of a sentence.
///
/// It is stripped from any fed text, so it can never be learned as a word
/// and is never produced by generation.
pub const SENTINEL: &str = "[]";

/// Punctuation marks closing a sentence.
pub const TERMINALS: [&str; 3] = [".", "!", "?"];

/// Returns `true` if `token` ends a sentence.
pub fn is_terminal(token: &str) -> bool {
	TERMINALS.contains(&token)
}

/// Applies the fixed normalization to raw text.
///
/// - lowercases everything
/// - strips `/` and `\`
/// - turns a blank line into a space, drops `\r`, turns `\n` into a space
/// - removes commas
/// - strips the sentinel string, repeatedly, since the deletions above can
///   bring its two halves together (`[,]`, `[[]]`)
/// - detaches `.`, `!` and `?` so they become standalone tokens
pub fn normalize(text: &str) -> String {
	let mut text = text
		.to_lowercase()
		.replace(['/', '\\'], "")
		.replace("\r\n\r\n", " ")
		.replace('\r', "")
		.replace('\n', " ")
		.replace(',', "");

	while text.contains(SENTINEL) {
		text = text.replace(SENTINEL, "");
	}

	text.replace('.', " .")
		.replace('!', " ! ")
		.replace('?', " ?")
}

/// Normalizes `text` and splits it into a flat token sequence.
///
/// Empty fragments produced by repeated spaces are discarded, and no token
/// ever equals [`SENTINEL`].
pub fn tokenize(text: &str) -> Vec<String> {
	normalize(text)
		.split(' ')
		.filter(|token| !token.is_empty() && *token != SENTINEL)
		.map(str::to_owned)
		.collect()
}

/// Splits `text` into complete sentences.
///
/// Each sentence starts with [`SENTINEL`] and ends with one of [`TERMINALS`].
/// A trailing fragment without terminal punctuation is dropped: incomplete
/// sentences are never used for training.
pub fn sentences(text: &str) -> Vec<Vec<String>> {
	let mut sentences = Vec::new();
	let mut current = vec![SENTINEL.to_owned()];

	for token in tokenize(text) {
		let closes = is_terminal(&token);
		current.push(token);
		if closes {
			sentences.push(std::mem::replace(&mut current, vec![SENTINEL.to_owned()]));
		}
	}

	sentences
}
