use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::LazyLock;
use std::sync::mpsc;
use std::thread;

use log::debug;
use rand::Rng;
use rand::seq::IteratorRandom;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::state::State;
use crate::error::{GenError, Result};
use crate::io::{build_output_path, read_file};

/// Smallest bound on the number of words in one walk.
///
/// A closed cycle of non-terminal states (e.g. `"x ?"` and `"?. x ?"`)
/// would otherwise never end; reaching the bound stops the walk like a
/// dead end does. The actual bound grows with the model, see `walk_limit`.
pub const MAX_WALK_LENGTH: usize = 512;

/// A word followed by terminal punctuation: `fox.`, `why?!`, `note:`, `well-`.
///
/// Anchored at the start only, so `fox.jpg` is terminal too.
static TERMINAL_WORD: LazyLock<Regex> = LazyLock::new(|| {
	// Should not panic, the pattern is a constant
	Regex::new(r"^\w+[:.?!*\-]+").unwrap()
});

/// Returns `true` if `word` ends a sentence.
pub fn is_terminal(word: &str) -> bool {
	TERMINAL_WORD.is_match(word)
}

/// Word-level Markov chain used to synthesize sentences.
///
/// The model maps every word seen during training to the ordered list of
/// words seen right after it.
///
/// # Responsibilities
/// - Learn transitions from phrases (incremental, additive)
/// - Generate a sentence by random walk from a seed or a random state
/// - Load a corpus file, using a binary cache when available
/// - Merge with another model and export a JSON snapshot
///
/// # Invariants
/// - Every successor of a state was observed right after it in training
/// - Successor order is the training order, so snapshots are exact
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MarkovModel {
	/// Mapping from a word to its state
	states: HashMap<String, State>,
}

impl MarkovModel {
	/// Loads a `MarkovModel` from a corpus file (one phrase per line) if a
	/// binary exists next to it, otherwise builds the model from the raw
	/// file with multithreaded training.
	///
	/// - `filepath` is the input text file, e.g. `data/phrases.dat`.
	/// - The binary cache is `data/phrases.bin` (`postcard` encoded).
	pub fn new<P: AsRef<Path>>(filepath: P) -> Result<Self> {
		let binary_data_path = build_output_path(&filepath, "bin")?;
		let model: Self = if binary_data_path.exists() {
			debug!("Loading cached model from {}", binary_data_path.display());
			let bytes = std::fs::read(binary_data_path)?;
			postcard::from_bytes(&bytes)?
		} else {
			Self::read_database_file(&filepath, binary_data_path)?
		};
		Ok(model)
	}

	/// Reads a corpus, splits its lines into chunks, trains partial models
	/// in parallel, merges them in chunk order and serializes the result.
	///
	/// # Behavior
	/// - Splits input lines into chunks (based on CPU cores * factor).
	/// - Spawns one thread per chunk, each training a private model.
	/// - Partial models come back tagged with their chunk index and are
	///   merged in that order, so successor lists match sequential training.
	/// - Serializes the final model to `binary_data_path` for future fast loading.
	fn read_database_file<PF, PB>(filename: PF, binary_data_path: PB) -> Result<MarkovModel>
	where
		PF: AsRef<Path>,
		PB: AsRef<Path>,
	{
		let lines = read_file(&filename)?;
		debug!("Training model on {} phrases from {}", lines.len(), filename.as_ref().display());

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = lines.len().div_ceil(chunks).max(1);

		let (tx, rx) = mpsc::channel();
		let mut spawned = 0;
		for (index, chunk) in lines.chunks(chunk_size).enumerate() {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();
			spawned += 1;

			thread::spawn(move || {
				let mut partial_model = MarkovModel::default();
				for phrase in &chunk {
					partial_model.train(phrase);
				}
				// The receiver outlives every worker
				let _ = tx.send((index, partial_model));
			});
		}
		drop(tx);

		let mut partial_models: Vec<(usize, MarkovModel)> = rx.iter().collect();
		if partial_models.len() != spawned {
			return Err(GenError::Io(std::io::Error::other("A training thread stopped before sending its model")));
		}
		partial_models.sort_by_key(|(index, _)| *index);

		let mut final_model = MarkovModel::default();
		for (_, partial_model) in &partial_models {
			final_model.merge(partial_model).map_err(GenError::InvalidInput)?;
		}

		let bytes = postcard::to_stdvec(&final_model)?;
		std::fs::write(binary_data_path, bytes)?;

		Ok(final_model)
	}

	/// Writes the binary cache that `new` would read for `filepath`.
	///
	/// Used after incremental training so the next load sees the new
	/// phrases without re-reading the corpus.
	pub fn save_cache<P: AsRef<Path>>(&self, filepath: P) -> Result<()> {
		let binary_data_path = build_output_path(&filepath, "bin")?;
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(binary_data_path, bytes)?;
		Ok(())
	}

	/// Adds a phrase to the model.
	///
	/// # Behavior
	/// - Splits on whitespace.
	/// - Appends `.` to the last word if it is not terminal, so every phrase
	///   ends on a terminal state.
	/// - Records each adjacent pair `(a, b)` as a transition from `a` to `b`.
	///
	/// # Notes
	/// - Empty and single-word phrases add nothing.
	/// - Training twice on the same phrase doubles its weight.
	pub fn train(&mut self, phrase: &str) {
		debug!("Training generator on '{}'", phrase);

		let mut words: Vec<String> = phrase.split_whitespace().map(str::to_owned).collect();
		if let Some(last) = words.last_mut() {
			if !is_terminal(last) {
				last.push('.');
			}
		}

		for pair in words.windows(2) {
			let (word, next_word) = (&pair[0], &pair[1]);
			let state = self.states.entry(word.clone()).or_insert_with(|| State::new(word));
			state.add_transition(next_word);
		}
	}

	/// Generates one candidate sentence with the thread-local RNG.
	///
	/// See `generate_with_rng`.
	pub fn generate(&self, initial_state: Option<&str>) -> Result<String> {
		self.generate_with_rng(initial_state, &mut rand::rng())
	}

	/// Generates one candidate sentence by random walk.
	///
	/// # Parameters
	/// - `initial_state`: first word of the sentence; a random state when `None`.
	/// - `rng`: random source used for the start state and every step.
	///
	/// # Returns
	/// - `Ok(String)`: visited words joined by single spaces
	/// - `Err(GenError::UnknownInitialState)`: the seed is not a state
	/// - `Err(GenError::EmptyModel)`: no seed and nothing trained
	///
	/// # Notes
	/// - The walk stops on a terminal word or on a dead end (a word with no
	///   recorded successor). A dead end is not an error.
	/// - A walk caught in a cycle of non-terminal words is cut at `walk_limit`.
	pub fn generate_with_rng<R: Rng + ?Sized>(&self, initial_state: Option<&str>, rng: &mut R) -> Result<String> {
		let mut current: &str = match initial_state {
			Some(word) => match self.states.get_key_value(word) {
				Some((key, _)) => key,
				None => return Err(GenError::UnknownInitialState(word.to_owned())),
			},
			None => match self.states.keys().choose(rng) {
				Some(key) => key,
				None => return Err(GenError::EmptyModel),
			},
		};

		let limit = self.walk_limit();
		let mut sentence = vec![current];
		while !is_terminal(current) && sentence.len() < limit {
			let next_word = match self.states.get(current).and_then(|state| state.predict(rng)) {
				Some(word) => word,
				None => break,
			};
			current = next_word;
			sentence.push(current);
		}

		Ok(sentence.join(" "))
	}

	/// Longest walk `generate` produces.
	///
	/// A walk visiting each state at most once has at most `len() + 1`
	/// words, so only a walk stuck in a cycle is ever cut.
	fn walk_limit(&self) -> usize {
		MAX_WALK_LENGTH.max(self.states.len() + 1)
	}

	/// Deletes the binary cache next to `filepath`, if any.
	///
	/// The next `new` then rebuilds the model from the corpus.
	pub fn clear_cache<P: AsRef<Path>>(filepath: P) -> Result<()> {
		let binary_data_path = build_output_path(&filepath, "bin")?;
		match std::fs::remove_file(binary_data_path) {
			Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
			_ => Ok(()),
		}
	}

	/// Merges another `MarkovModel` into this one.
	///
	/// Successors of shared states are appended after the existing ones;
	/// other states are cloned.
	pub fn merge(&mut self, other: &Self) -> std::result::Result<(), String> {
		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				existing.merge(state)?;
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}
		Ok(())
	}

	/// Number of states (words with at least one recorded transition).
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	pub fn contains_state(&self, word: &str) -> bool {
		self.states.contains_key(word)
	}

	/// Ordered successors of `word`, `None` if it is not a state.
	pub fn successors(&self, word: &str) -> Option<&[String]> {
		self.states.get(word).map(State::successors)
	}

	/// Structural view of the model: word → ordered successors.
	///
	/// Keys are sorted so that two equal models give equal snapshots.
	pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
		self.states
			.iter()
			.map(|(key, state)| (key.clone(), state.successors().to_vec()))
			.collect()
	}

	/// Rebuilds a model from a snapshot, keeping successor order.
	pub fn from_snapshot(snapshot: BTreeMap<String, Vec<String>>) -> Self {
		let states = snapshot
			.into_iter()
			.map(|(key, successors)| {
				let state = State::with_successors(&key, successors);
				(key, state)
			})
			.collect();
		Self { states }
	}

	/// JSON form of `snapshot`, e.g. `{"The":["brown"],"brown":["fox."]}`.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(&self.snapshot())?)
	}

	/// Parses the output of `to_json`.
	pub fn from_json(json: &str) -> Result<Self> {
		let snapshot: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
		Ok(Self::from_snapshot(snapshot))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;
	use tempfile::tempdir;

	fn snapshot_of(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
			.collect()
	}

	#[test]
	fn terminal_words() {
		assert!(is_terminal("fox."));
		assert!(is_terminal("why?!"));
		assert!(is_terminal("note:"));
		assert!(is_terminal("wait-"));
		assert!(is_terminal("bold*"));
		assert!(is_terminal("fox.jpg"));
		assert!(!is_terminal("fox"));
		assert!(!is_terminal("..."));
		assert!(!is_terminal("'fox."));
		assert!(!is_terminal(""));
	}

	#[test]
	fn train_single_words() {
		let mut model = MarkovModel::default();
		model.train("The brown fox.");
		assert_eq!(model.snapshot(), snapshot_of(&[("The", &["brown"]), ("brown", &["fox."])]));
	}

	#[test]
	fn train_multi_words() {
		let mut model = MarkovModel::default();
		model.train("The brown brown fox.");
		assert_eq!(
			model.snapshot(),
			snapshot_of(&[("The", &["brown"]), ("brown", &["brown", "fox."])])
		);
	}

	#[test]
	fn train_appends_missing_end_punctuation() {
		let mut model = MarkovModel::default();
		model.train("The brown fox");
		assert_eq!(model.snapshot(), snapshot_of(&[("The", &["brown"]), ("brown", &["fox."])]));
	}

	#[test]
	fn train_empty_and_single_word_inputs() {
		let mut model = MarkovModel::default();
		model.train("");
		model.train("   ");
		model.train("Hello");
		assert!(model.is_empty());
	}

	#[test]
	fn repeated_training_accumulates() {
		let mut model = MarkovModel::default();
		model.train("A B.");
		model.train("C D.");
		model.train("A B.");
		assert_eq!(model.successors("A").unwrap(), ["B.", "B."]);
		assert_eq!(model.successors("C").unwrap(), ["D."]);
	}

	#[test]
	fn successor_multiplicity_matches_pair_counts() {
		let phrases = ["the cat sat on the mat", "the cat ran", "a cat sat."];
		let mut model = MarkovModel::default();
		for phrase in phrases {
			model.train(phrase);
		}
		let count = |word: &str, next: &str| {
			model.successors(word).unwrap().iter().filter(|s| *s == next).count()
		};
		assert_eq!(count("the", "cat"), 2);
		assert_eq!(count("the", "mat."), 1);
		assert_eq!(count("cat", "sat"), 2);
		assert_eq!(count("cat", "ran."), 1);
	}

	#[test]
	fn unknown_seed_fails() {
		let mut model = MarkovModel::default();
		model.train("The brown fox.");
		match model.generate(Some("wolf")) {
			Err(GenError::UnknownInitialState(word)) => assert_eq!(word, "wolf"),
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn empty_model_fails() {
		let model = MarkovModel::default();
		assert!(matches!(model.generate(None), Err(GenError::EmptyModel)));
		assert!(matches!(model.generate(Some("The")), Err(GenError::UnknownInitialState(_))));
	}

	#[test]
	fn deterministic_chain() {
		let mut model = MarkovModel::default();
		model.train("The brown fox.");
		assert_eq!(model.generate(Some("The")).unwrap(), "The brown fox.");
		assert_eq!(model.generate(Some("brown")).unwrap(), "brown fox.");
	}

	#[test]
	fn seeded_sentences_start_with_the_seed() {
		let mut model = MarkovModel::default();
		model.train("The brown fox jumped over the lazy fat dog and the big log.");
		let mut rng = StdRng::seed_from_u64(3);
		for _ in 0..100 {
			let sentence = model.generate_with_rng(Some("The"), &mut rng).unwrap();
			assert_eq!(sentence.split(' ').next(), Some("The"));
			assert!(is_terminal(sentence.rsplit(' ').next().unwrap()));
		}
	}

	#[test]
	fn walk_stops_on_terminal_even_if_it_has_successors() {
		let mut model = MarkovModel::default();
		model.train("Stop. now please");
		assert_eq!(model.generate(Some("Stop.")).unwrap(), "Stop.");
	}

	#[test]
	fn closed_cycles_are_bounded() {
		let mut model = MarkovModel::default();
		model.train("x ?");
		model.train("?. x ?");
		let sentence = model.generate(Some("x")).unwrap();
		assert_eq!(sentence.split(' ').count(), MAX_WALK_LENGTH);
	}

	#[test]
	fn long_chains_are_not_cut() {
		let phrase: Vec<String> = (0..600).map(|i| format!("w{i}")).collect();
		let mut model = MarkovModel::default();
		model.train(&phrase.join(" "));

		let sentence = model.generate(Some("w0")).unwrap();
		let words: Vec<&str> = sentence.split(' ').collect();
		assert_eq!(words.len(), 600);
		assert_eq!(words.last(), Some(&"w599."));
	}

	#[test]
	fn random_start_uses_known_states() {
		let mut model = MarkovModel::default();
		model.train("one two three.");
		let mut rng = StdRng::seed_from_u64(11);
		for _ in 0..20 {
			let sentence = model.generate_with_rng(None, &mut rng).unwrap();
			assert!(sentence == "one two three." || sentence == "two three.");
		}
	}

	#[test]
	fn merge_matches_sequential_training() {
		let mut sequential = MarkovModel::default();
		sequential.train("the cat sat.");
		sequential.train("the dog ran.");

		let mut left = MarkovModel::default();
		left.train("the cat sat.");
		let mut right = MarkovModel::default();
		right.train("the dog ran.");
		left.merge(&right).unwrap();

		assert_eq!(left, sequential);
	}

	#[test]
	fn json_snapshot() {
		let mut model = MarkovModel::default();
		model.train("The brown fox.");
		let json = model.to_json().unwrap();
		assert_eq!(json, r#"{"The":["brown"],"brown":["fox."]}"#);

		let mut weighted = MarkovModel::default();
		weighted.train("a b a c a b");
		let restored = MarkovModel::from_json(&weighted.to_json().unwrap()).unwrap();
		assert_eq!(restored, weighted);
		assert_eq!(restored.successors("a").unwrap(), ["b", "c", "b."]);
	}

	#[test]
	fn invalid_json_is_a_snapshot_error() {
		assert!(matches!(MarkovModel::from_json("[1, 2]"), Err(GenError::Snapshot(_))));
	}

	#[test]
	fn corpus_file_is_loaded_then_cached() {
		let dir = tempdir().unwrap();
		let corpus = dir.path().join("phrases.dat");
		let lines: Vec<String> = (0..200).map(|i| format!("word{} next{} end", i % 7, i)).collect();
		std::fs::write(&corpus, lines.join("\n")).unwrap();

		let mut sequential = MarkovModel::default();
		for line in &lines {
			sequential.train(line);
		}

		let loaded = MarkovModel::new(&corpus).unwrap();
		assert_eq!(loaded, sequential);
		assert!(dir.path().join("phrases.bin").exists());

		// Second load comes from the cache, even once the corpus is gone.
		std::fs::remove_file(&corpus).unwrap();
		let cached = MarkovModel::new(&corpus).unwrap();
		assert_eq!(cached, sequential);
	}

	#[test]
	fn empty_corpus_gives_empty_model() {
		let dir = tempdir().unwrap();
		let corpus = dir.path().join("empty.dat");
		std::fs::write(&corpus, "").unwrap();
		assert!(MarkovModel::new(&corpus).unwrap().is_empty());
	}

	#[test]
	fn missing_corpus_is_an_io_error() {
		let dir = tempdir().unwrap();
		let result = MarkovModel::new(dir.path().join("missing.dat"));
		assert!(matches!(result, Err(GenError::Io(_))));
	}

	#[test]
	fn saved_cache_is_preferred_over_corpus() {
		let dir = tempdir().unwrap();
		let corpus = dir.path().join("phrases.dat");
		std::fs::write(&corpus, "the cat sat.\n").unwrap();

		let mut model = MarkovModel::new(&corpus).unwrap();
		model.train("the dog ran.");
		model.save_cache(&corpus).unwrap();

		let reloaded = MarkovModel::new(&corpus).unwrap();
		assert_eq!(reloaded.successors("the").unwrap(), ["cat", "dog"]);
	}

	#[test]
	fn cleared_cache_reloads_from_corpus() {
		let dir = tempdir().unwrap();
		let corpus = dir.path().join("phrases.dat");
		std::fs::write(&corpus, "the cat sat.\n").unwrap();

		let mut model = MarkovModel::new(&corpus).unwrap();
		model.train("the dog ran.");
		model.save_cache(&corpus).unwrap();

		MarkovModel::clear_cache(&corpus).unwrap();
		assert!(!dir.path().join("phrases.bin").exists());
		let reloaded = MarkovModel::new(&corpus).unwrap();
		assert_eq!(reloaded.successors("the").unwrap(), ["cat"]);

		// Nothing to clear is fine
		std::fs::remove_file(dir.path().join("phrases.bin")).unwrap();
		MarkovModel::clear_cache(&corpus).unwrap();
	}
}
