use thiserror::Error;

/// Errors raised by generation, classification and model I/O.
///
/// Training never fails; every variant comes from a read path or from
/// loading/saving a model, so a returned error never leaves a model
/// partially updated.
#[derive(Error, Debug)]
pub enum GenError {
	/// The requested seed word has never been seen as a state.
	#[error("'{0}' was not found")]
	UnknownInitialState(String),

	/// Generation without a seed on a model that holds no states.
	#[error("No states available for generation")]
	EmptyModel,

	/// Classification before both classes received at least one example.
	#[error("Classifier has not been trained yet")]
	Untrained,

	/// No candidate was accepted within the retry budget.
	#[error("Could not generate an accepted sentence after {0} attempts")]
	GenerationExhausted(usize),

	/// Invalid generation parameters.
	#[error("Invalid input: {0}")]
	InvalidInput(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// Binary model cache could not be read or written.
	#[error("Model cache error: {0}")]
	Cache(#[from] postcard::Error),

	/// JSON snapshot could not be produced or parsed.
	#[error("Snapshot error: {0}")]
	Snapshot(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GenError>;
