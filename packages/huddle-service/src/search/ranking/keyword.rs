use huddle_config::SearchKeyword;

/// Which lexical rule matched first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordMatch {
	Substring,
	Token,
	Stem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordRules {
	/// Query tokens shorter than this are ignored by the token rule.
	pub min_token_chars: usize,
	/// Both tokens must be at least this long for the stem rule, and this many leading
	/// characters are compared.
	pub stem_prefix_chars: usize,
}
impl Default for KeywordRules {
	fn default() -> Self {
		Self { min_token_chars: 3, stem_prefix_chars: 4 }
	}
}

impl From<&SearchKeyword> for KeywordRules {
	fn from(cfg: &SearchKeyword) -> Self {
		Self {
			min_token_chars: cfg.min_token_chars as usize,
			stem_prefix_chars: cfg.stem_prefix_chars as usize,
		}
	}
}

/// Case-insensitive lexical match of `query` against `text`. Rules are tried in order and the
/// first hit wins. Lengths are counted in chars.
pub fn keyword_match(query: &str, text: &str, rules: &KeywordRules) -> Option<KeywordMatch> {
	let query = query.trim().to_lowercase();

	if query.is_empty() {
		return None;
	}

	let text = text.to_lowercase();

	if text.contains(&query) {
		return Some(KeywordMatch::Substring);
	}

	let query_tokens: Vec<&str> = query.split_whitespace().collect();
	let text_tokens: Vec<&str> = text.split_whitespace().collect();

	if query_tokens
		.iter()
		.filter(|token| token.chars().count() >= rules.min_token_chars)
		.any(|query_token| text_tokens.iter().any(|text_token| text_token.contains(query_token)))
	{
		return Some(KeywordMatch::Token);
	}

	let text_stems: Vec<&str> =
		text_tokens.iter().filter_map(|token| stem(token, rules.stem_prefix_chars)).collect();

	if query_tokens
		.iter()
		.filter_map(|token| stem(token, rules.stem_prefix_chars))
		.any(|query_stem| text_stems.contains(&query_stem))
	{
		return Some(KeywordMatch::Stem);
	}

	None
}

/// Plain case-insensitive substring check.
pub fn contains_ignore_case(text: &str, needle: &str) -> bool {
	text.to_lowercase().contains(&needle.to_lowercase())
}

// Leading `prefix_chars` chars, or `None` when the token is shorter.
fn stem(token: &str, prefix_chars: usize) -> Option<&str> {
	if prefix_chars == 0 {
		return None;
	}

	match token.char_indices().nth(prefix_chars) {
		Some((end, _)) => Some(&token[..end]),
		None if token.chars().count() == prefix_chars => Some(token),
		None => None,
	}
}
