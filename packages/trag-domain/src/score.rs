use crate::{Candidate, trigram};

/// Weight of the name similarity in the combined relevance score.
pub const NAME_WEIGHT: f32 = 0.7;
/// Weight of the catalog-number similarity in the combined relevance score.
pub const CATALOG_WEIGHT: f32 = 0.3;
/// Relevance floor. Candidates scoring below this are dropped from results entirely.
pub const SIMILARITY_THRESHOLD: f32 = 0.1;
/// Name-similarity bar a candidate must clear when fuzzy matching is requested.
pub const FUZZY_NAME_THRESHOLD: f32 = 0.7;

/// Combined relevance of a candidate for `query`, in `[0, 1]`.
pub fn score(query: &str, name: &str, catalog_number: &str) -> f32 {
	NAME_WEIGHT * trigram::similarity(query, name)
		+ CATALOG_WEIGHT * trigram::similarity(query, catalog_number)
}

/// Reference-number form used for exact-match detection: alphanumerics only, uppercased.
pub fn normalize_reference(input: &str) -> String {
	input.chars().filter(|ch| ch.is_alphanumeric()).flat_map(char::to_uppercase).collect()
}

/// True when the query names this candidate exactly: by catalog number, or by any
/// slash/comma/pipe-separated segment of a reference number.
pub fn is_exact_match(query: &str, candidate: &Candidate) -> bool {
	let normalized = normalize_reference(query);

	if normalized.is_empty() {
		return false;
	}
	if normalize_reference(&candidate.catalog_number) == normalized {
		return true;
	}

	candidate.references().any(|(_, number)| {
		number.split(['/', ',', '|']).any(|part| normalize_reference(part) == normalized)
	})
}
