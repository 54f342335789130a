use std::{collections::HashMap, time::Duration};

use trag_domain::Candidate;
use trag_service::{BoxFuture, CandidateSource, Pushdown};

/// In-process candidate source backed by a plain vector, for engine tests without a database.
///
/// It deliberately ignores the pushdown and over-fetches, so tests exercise the engine's own
/// re-checking of every predicate.
pub struct MemorySource {
	candidates: Vec<Candidate>,
	parents: HashMap<String, Option<String>>,
	delay: Option<Duration>,
	fail: bool,
}
impl MemorySource {
	pub fn new(candidates: Vec<Candidate>) -> Self {
		Self { candidates, parents: HashMap::new(), delay: None, fail: false }
	}

	/// Registers a category and its parent, so subtree lookups can walk the tree.
	pub fn with_category(mut self, id: &str, parent: Option<&str>) -> Self {
		self.parents.insert(id.to_string(), parent.map(str::to_string));

		self
	}

	/// Delays every fetch, for timeout tests.
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);

		self
	}

	/// Makes every fetch fail, for retrieval-failure tests.
	pub fn failing() -> Self {
		Self { candidates: Vec::new(), parents: HashMap::new(), delay: None, fail: true }
	}
}
impl CandidateSource for MemorySource {
	fn fetch<'a>(
		&'a self,
		_pushdown: &'a Pushdown,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Candidate>>> {
		Box::pin(async move {
			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}
			if self.fail {
				color_eyre::eyre::bail!("injected source failure");
			}

			Ok(self.candidates.clone())
		})
	}

	fn category_subtree<'a>(
		&'a self,
		root: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>> {
		Box::pin(async move {
			if self.fail {
				color_eyre::eyre::bail!("injected source failure");
			}

			let mut ids = vec![root.to_string()];
			let mut index = 0;

			while index < ids.len() {
				for (id, parent) in &self.parents {
					if parent.as_deref() == Some(ids[index].as_str()) && !ids.contains(id) {
						ids.push(id.clone());
					}
				}

				index += 1;
			}

			Ok(ids)
		})
	}
}
