//! Sentence classification.
//!
//! - Feature extraction (unigrams and bigrams, stop words removed)
//! - A Naive Bayes classifier trained incrementally on labeled sentences
//! - The `Classify` trait used by the generator to accept or reject candidates

use crate::error::Result;

/// Unigram/bigram feature extraction and the `FeatureBag` multiset.
pub mod features;

/// Naive Bayes "funny / not funny" classifier.
pub mod naive_bayes;

/// Decides whether a generated sentence is accepted.
///
/// Implementations must not mutate any state: the generator calls
/// `classify` once per candidate while only holding a shared reference.
pub trait Classify {
	/// Returns `Ok(true)` if the sentence belongs to the positive class.
	fn classify(&self, sentence: &str) -> Result<bool>;
}
