use rand::Rng;
use rand::seq::IndexedRandom;

use serde::{Deserialize, Serialize};


/// Represents a state in the word-level Markov model.
///
/// A `State` corresponds to one word token (`key`) and stores every word
/// observed immediately after it, in training order.
///
/// Conceptually, this is a node in a Markov chain. Duplicates are kept on
/// purpose: a successor recorded `k` times is `k` times as likely to be
/// drawn as one recorded once.
///
/// ## Responsibilities:
/// - Accumulate successors during learning
/// - Predict the next word by uniform sampling over the successor list
/// - Merge with another state having the same key (parallel learning support)
///
/// ## Invariants
/// - Every successor was observed right after `key`
/// - Successor order is the observation order
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct State {
	/// Identifier of the state (a word, possibly with trailing punctuation).
	key: String,
	/// Observed next words, duplicates retained.
	/// Example: ["brown", "lazy", "brown"]
	successors: Vec<String>
}

impl State {
	/// Creates a new empty state for the given word.
	pub fn new(key: &str) -> Self {
		Self {
			key: key.to_owned(),
			successors: Vec::new(),
		}
	}

	/// Builds a state from an already ordered successor list.
	pub(crate) fn with_successors(key: &str, successors: Vec<String>) -> Self {
		Self {
			key: key.to_owned(),
			successors,
		}
	}

	/// Records one occurrence of `next_word` following this state.
	pub fn add_transition(&mut self, next_word: &str) {
		self.successors.push(next_word.to_owned());
	}

	/// Ordered successor list.
	pub fn successors(&self) -> &[String] {
		&self.successors
	}

	/// Picks the next word uniformly from the successor list.
	///
	/// Returns `None` if the state has no successors (dead end).
	pub fn predict<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
		self.successors.choose(rng).map(String::as_str)
	}

	/// Merges another state into this one.
	///
	/// Both states must represent the same word (`key`). The other
	/// successors are appended after the existing ones, which is exactly
	/// what training on the other phrases afterwards would have produced.
	///
	/// # Errors
	/// Returns an error if the state keys do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), String> {
		if self.key != other.key {
			return Err("Key mismatch".to_owned());
		}

		self.successors.extend(other.successors.iter().cloned());

		Ok(())
	}
}
