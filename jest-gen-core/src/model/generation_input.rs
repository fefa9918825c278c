use crate::error::{GenError, Result};

/// Default number of candidates tried before giving up.
pub const DEFAULT_NB_TRY: usize = 10_000;

/// Strategy used to select the first word of a generated sentence.
///
/// # Variants
/// - `Random`: start from a uniformly random state, drawn again for
///   every candidate.
/// - `Custom(String)`: every candidate starts with the given word.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StartSeed {
	#[default]
	Random,
	Custom(String),
}

impl StartSeed {
	/// The seed word, if any, in the form `MarkovModel::generate` expects.
	pub fn initial_state(&self) -> Option<&str> {
		match self {
			StartSeed::Random => None,
			StartSeed::Custom(word) => Some(word.as_str()),
		}
	}
}

/// Input parameters for generating accepted sentences.
///
/// # Invariants
/// - `nb_try` is always >= 1
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationInput {
	/// Maximum number of candidates generated for one accepted sentence.
	nb_try: usize,

	/// Starting word strategy.
	pub start_seed: StartSeed,
}

impl Default for GenerationInput {
	fn default() -> Self {
		Self {
			nb_try: DEFAULT_NB_TRY,
			start_seed: StartSeed::Random,
		}
	}
}

impl GenerationInput {
	/// Creates an input with the default retry budget and a random start.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an input whose candidates all start with `word`.
	pub fn with_seed(word: &str) -> Self {
		Self {
			start_seed: StartSeed::Custom(word.to_owned()),
			..Self::default()
		}
	}

	/// Returns the retry budget.
	pub fn nb_try(&self) -> usize {
		self.nb_try
	}

	/// Sets the retry budget.
	///
	/// # Errors
	/// Returns an error if `nb_try` is 0.
	pub fn set_nb_try(&mut self, nb_try: usize) -> Result<()> {
		if nb_try == 0 {
			return Err(GenError::InvalidInput("nb_try must be at least 1".to_owned()));
		}
		self.nb_try = nb_try;
		Ok(())
	}
}
