use std::collections::HashSet;

use crate::text;

/// A single trigram over `char`s, word padding included.
pub type Trigram = [char; 3];

/// Trigram set of `input`: folded, split into words, each word padded with two leading and one
/// trailing space. Matches what `pg_trgm`'s `show_trgm` extracts, so in-process similarity agrees
/// with the SQL prefilter.
pub fn trigrams(input: &str) -> HashSet<Trigram> {
	let folded = text::fold(input);
	let mut set = HashSet::new();

	for word in text::words(&folded) {
		let padded: Vec<char> = [' ', ' '].into_iter().chain(word.chars()).chain([' ']).collect();

		for window in padded.windows(3) {
			set.insert([window[0], window[1], window[2]]);
		}
	}

	set
}

/// Jaccard similarity of the two trigram sets, in `[0, 1]`.
///
/// `1.0` exactly when both sides produce the same non-empty set; `0.0` when either side produces
/// no trigrams at all.
pub fn similarity(a: &str, b: &str) -> f32 {
	let ta = trigrams(a);
	let tb = trigrams(b);
	let shared = ta.intersection(&tb).count();
	let union = ta.len() + tb.len() - shared;

	if union == 0 { 0.0 } else { shared as f32 / union as f32 }
}
