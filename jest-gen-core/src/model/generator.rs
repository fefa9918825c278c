use log::{debug, trace};
use rand::Rng;

use crate::classifier::Classify;
use crate::error::{GenError, Result};
use crate::model::generation_input::GenerationInput;
use crate::model::markov_model::MarkovModel;

/// Generate-and-filter loop over a Markov model and a classifier.
///
/// # Responsibilities
/// - Draw candidate sentences from the `MarkovModel`
/// - Keep the first candidate the classifier accepts
/// - Give up with `GenError::GenerationExhausted` after `nb_try` candidates
///
/// The generator only borrows both components; it never trains them.
#[derive(Debug)]
pub struct Generator<'a, C: Classify> {
	model: &'a MarkovModel,
	classifier: &'a C,
}

impl<'a, C: Classify> Generator<'a, C> {
	pub fn new(model: &'a MarkovModel, classifier: &'a C) -> Self {
		Self { model, classifier }
	}

	/// Generates one accepted sentence with the thread-local RNG.
	pub fn predict(&self, input: &GenerationInput) -> Result<String> {
		self.predict_with_rng(input, &mut rand::rng())
	}

	/// Generates one accepted sentence.
	///
	/// # Behavior
	/// - Generates up to `input.nb_try()` candidates, each with a fresh start
	///   state when the seed is `StartSeed::Random`.
	/// - Returns the first candidate classified as positive.
	///
	/// # Errors
	/// - Generation errors (`UnknownInitialState`, `EmptyModel`) and
	///   classification errors (`Untrained`) are returned at once, since
	///   retrying cannot fix them.
	/// - `GenerationExhausted` if no candidate was accepted.
	pub fn predict_with_rng<R: Rng + ?Sized>(&self, input: &GenerationInput, rng: &mut R) -> Result<String> {
		let initial_state = input.start_seed.initial_state();

		for attempt in 1..=input.nb_try() {
			let candidate = self.model.generate_with_rng(initial_state, rng)?;
			if self.classifier.classify(&candidate)? {
				debug!("Successfully generated a sentence after {} attempt(s)", attempt);
				return Ok(candidate);
			}
			trace!("Rejected candidate '{}'", candidate);
		}

		Err(GenError::GenerationExhausted(input.nb_try()))
	}

	/// Generates `count` accepted sentences, each from an independent loop.
	pub fn predict_many(&self, input: &GenerationInput, count: usize) -> Result<Vec<String>> {
		let mut rng = rand::rng();
		(0..count)
			.map(|_| self.predict_with_rng(input, &mut rng))
			.collect()
	}
}
