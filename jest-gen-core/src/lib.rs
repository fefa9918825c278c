//! Markov sentence generation gated by a Naive Bayes classifier.
//!
//! This crate provides the generate-and-filter core including:
//! - A word-level Markov chain trained on free-text phrases
//! - A "funny / not funny" Naive Bayes classifier over unigrams and bigrams
//! - A generator retrying Markov candidates until the classifier accepts one
//! - Flat-file helpers for corpora and labeled examples

/// Sentence generation: Markov model and the generate-and-filter loop.
pub mod model;

/// Feature extraction and Naive Bayes classification.
pub mod classifier;

/// Error type shared by every fallible operation.
pub mod error;

/// I/O utilities (line files, cache paths).
pub(crate) mod io;

pub use classifier::Classify;
pub use classifier::naive_bayes::NaiveBayes;
pub use error::{GenError, Result};
pub use io::append_line;
pub use model::generation_input::{GenerationInput, StartSeed};
pub use model::generator::Generator;
pub use model::markov_model::MarkovModel;
