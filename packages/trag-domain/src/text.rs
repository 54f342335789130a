use unicode_normalization::UnicodeNormalization;

/// Case- and accent-insensitive form used for every similarity and containment comparison.
///
/// NFKD first so accented letters decompose, then combining marks drop, then lowercase.
pub fn fold(input: &str) -> String {
	input
		.nfkd()
		.filter(|ch| !unicode_normalization::char::is_combining_mark(*ch))
		.flat_map(char::to_lowercase)
		.collect()
}

/// Splits folded text into the alphanumeric words trigram extraction runs over.
pub fn words(folded: &str) -> impl Iterator<Item = &str> {
	folded.split(|ch: char| !ch.is_alphanumeric()).filter(|word| !word.is_empty())
}

/// True when `haystack` contains `needle` ignoring case and accents.
pub fn contains_fold(haystack: &str, needle: &str) -> bool {
	fold(haystack).contains(&fold(needle))
}
