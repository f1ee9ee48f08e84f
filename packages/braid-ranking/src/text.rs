use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Lowercases `text` and strips accents by dropping combining marks after NFKD.
pub fn fold(text: &str) -> String {
	text.nfkd().filter(|ch| !is_combining_mark(*ch)).flat_map(char::to_lowercase).collect()
}

/// Splits folded text into word tokens of at least two word characters.
///
/// Query text keeps duplicate tokens so repeated query terms weigh more.
pub fn tokenize(text: &str) -> Vec<String> {
	let folded = fold(text);
	let mut tokens = Vec::new();
	let mut current = String::new();
	let mut current_chars = 0_usize;

	for ch in folded.chars() {
		if is_word_char(ch) {
			current.push(ch);

			current_chars += 1;

			continue;
		}
		if current_chars >= 2 {
			tokens.push(std::mem::take(&mut current));
		} else {
			current.clear();
		}

		current_chars = 0;
	}

	if current_chars >= 2 {
		tokens.push(current);
	}

	tokens
}

/// Unigrams followed by the bigrams of adjacent tokens.
pub fn terms_with_bigrams(text: &str) -> Vec<String> {
	let tokens = tokenize(text);
	let mut terms = Vec::with_capacity(tokens.len() * 2);

	for pair in tokens.windows(2) {
		terms.push(format!("{} {}", pair[0], pair[1]));
	}

	let mut out = tokens;

	out.append(&mut terms);

	out
}

fn is_word_char(ch: char) -> bool {
	ch.is_alphanumeric() || ch == '_'
}
