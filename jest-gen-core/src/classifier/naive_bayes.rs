use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::Classify;
use super::features::{extract_features, FeatureBag};
use crate::error::{GenError, Result};
use crate::io::read_file;

/// Naive Bayes classifier deciding whether a sentence is funny.
///
/// Features are the unigrams and bigrams produced by `extract_features`.
/// Counts are kept raw and probabilities are derived on demand, so
/// training is a cheap incremental update.
///
/// # Invariants
/// - `vocab[f] == funny[f] + not_funny[f]` for every feature `f`
/// - `num_funny` / `num_not_funny` count training calls per class
///
/// # Untrained policy
/// Classification fails with `GenError::Untrained` until both classes hold
/// at least one feature. No default answer is ever returned.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct NaiveBayes {
	vocab: FeatureBag,
	funny: FeatureBag,
	not_funny: FeatureBag,
	num_funny: usize,
	num_not_funny: usize,
}

impl NaiveBayes {
	/// Creates an untrained classifier.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds one labeled sentence to the counts.
	pub fn train(&mut self, sentence: &str, funny: bool) {
		let counts = extract_features(sentence);
		debug!("Training classifier on '{}' (funny: {})", sentence.trim(), funny);

		self.vocab.merge(&counts);
		if funny {
			self.funny.merge(&counts);
			self.num_funny += 1;
		} else {
			self.not_funny.merge(&counts);
			self.num_not_funny += 1;
		}
	}

	/// Trains on every line of a text file, all with the same label.
	///
	/// # Errors
	/// Returns `GenError::Io` if the file cannot be read. Nothing is
	/// trained in that case.
	pub fn train_from_file<P: AsRef<Path>>(&mut self, filepath: P, funny: bool) -> Result<()> {
		let lines = read_file(&filepath)?;
		debug!("Training classifier on {} lines from {}", lines.len(), filepath.as_ref().display());
		for sentence in &lines {
			self.train(sentence, funny);
		}
		Ok(())
	}

	/// True once both classes have contributed features.
	pub fn is_trained(&self) -> bool {
		!self.funny.is_empty() && !self.not_funny.is_empty()
	}

	pub fn num_funny(&self) -> usize {
		self.num_funny
	}

	pub fn num_not_funny(&self) -> usize {
		self.num_not_funny
	}

	/// Number of distinct features seen across both classes.
	pub fn vocab_size(&self) -> usize {
		self.vocab.len()
	}

	/// Computes the funny and not-funny log scores of a sentence.
	///
	/// Each score starts at the log prior of its class. For every feature of
	/// the sentence found in the vocabulary, `ln(count * P(f|c) / P(f))` is
	/// added to a class only when `P(f|c)` is strictly positive: an unseen
	/// feature contributes nothing instead of vetoing the class. No smoothing
	/// is applied.
	fn log_scores(&self, sentence: &str) -> Result<(f64, f64)> {
		if !self.is_trained() {
			return Err(GenError::Untrained);
		}

		let counts = extract_features(sentence);

		let total_sentences = (self.num_funny + self.num_not_funny) as f64;
		let mut ll_funny = (self.num_funny as f64 / total_sentences).ln();
		let mut ll_not_funny = (self.num_not_funny as f64 / total_sentences).ln();

		let sum_funny = self.funny.total() as f64;
		let sum_not_funny = self.not_funny.total() as f64;
		let sum_both = sum_funny + sum_not_funny;

		for (feature, count) in counts.iter() {
			if !self.vocab.contains(feature) {
				continue;
			}
			let count = *count as f64;
			let p_given_funny = self.funny.get(feature) as f64 / sum_funny;
			let p_given_not_funny = self.not_funny.get(feature) as f64 / sum_not_funny;
			let p_feature = self.vocab.get(feature) as f64 / sum_both;

			if p_given_funny > 0.0 {
				ll_funny += (count * p_given_funny / p_feature).ln();
			}
			if p_given_not_funny > 0.0 {
				ll_not_funny += (count * p_given_not_funny / p_feature).ln();
			}
		}

		Ok((ll_funny, ll_not_funny))
	}
}

impl Classify for NaiveBayes {
	/// Returns `true` when the funny score is strictly greater; ties are not funny.
	fn classify(&self, sentence: &str) -> Result<bool> {
		let (ll_funny, ll_not_funny) = self.log_scores(sentence)?;
		Ok(ll_funny > ll_not_funny)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::classifier::features::Feature;
	use tempfile::tempdir;

	fn trained() -> NaiveBayes {
		let mut classifier = NaiveBayes::new();
		classifier.train("great", true);
		classifier.train("awful", false);
		classifier
	}

	#[test]
	fn untrained_classifier_fails() {
		let classifier = NaiveBayes::new();
		assert!(matches!(classifier.classify("anything"), Err(GenError::Untrained)));
	}

	#[test]
	fn single_class_classifier_fails() {
		let mut classifier = NaiveBayes::new();
		classifier.train("great", true);
		classifier.train("superb", true);
		assert!(!classifier.is_trained());
		assert!(matches!(classifier.classify("great"), Err(GenError::Untrained)));
	}

	#[test]
	fn stop_word_only_class_is_untrained() {
		let mut classifier = NaiveBayes::new();
		classifier.train("great", true);
		classifier.train("the and of", false);
		assert_eq!(classifier.num_not_funny(), 1);
		assert!(!classifier.is_trained());
		assert!(matches!(classifier.classify("great"), Err(GenError::Untrained)));
	}

	#[test]
	fn separates_positive_and_negative_words() {
		let classifier = trained();
		assert!(classifier.classify("great").unwrap());
		assert!(!classifier.classify("awful").unwrap());
	}

	#[test]
	fn stop_words_and_case_do_not_matter() {
		let classifier = trained();
		assert!(classifier.classify("That was GREAT!").unwrap());
		assert!(!classifier.classify("it is so awful...").unwrap());
	}

	#[test]
	fn ties_resolve_to_not_funny() {
		let classifier = trained();
		// Equal priors and no known feature.
		assert!(!classifier.classify("unknown words only").unwrap());
		assert!(!classifier.classify("").unwrap());
	}

	#[test]
	fn priors_break_ties_on_unknown_features() {
		let mut classifier = trained();
		classifier.train("hilarious", true);
		assert!(classifier.classify("never seen before").unwrap());
	}

	#[test]
	fn counters_and_vocab_follow_training() {
		let mut classifier = trained();
		classifier.train("great show", true);

		assert_eq!(classifier.num_funny(), 2);
		assert_eq!(classifier.num_not_funny(), 1);
		// great, awful, show, (great, show)
		assert_eq!(classifier.vocab_size(), 4);

		let great = Feature::Unigram("great".to_owned());
		assert_eq!(
			classifier.vocab.get(&great),
			classifier.funny.get(&great) + classifier.not_funny.get(&great)
		);
	}

	#[test]
	fn classification_does_not_mutate() {
		let classifier = trained();
		let before = classifier.vocab.clone();
		let _ = classifier.classify("great awful great");
		assert_eq!(classifier.vocab, before);
	}

	#[test]
	fn trains_from_label_files() {
		let dir = tempdir().unwrap();
		let funny = dir.path().join("funny.txt");
		let not_funny = dir.path().join("not_funny.txt");
		std::fs::write(&funny, "a banana slipped\nthe banana laughed\n").unwrap();
		std::fs::write(&not_funny, "tax forms are due\n").unwrap();

		let mut classifier = NaiveBayes::new();
		classifier.train_from_file(&funny, true).unwrap();
		classifier.train_from_file(&not_funny, false).unwrap();

		assert_eq!(classifier.num_funny(), 2);
		assert_eq!(classifier.num_not_funny(), 1);
		assert!(classifier.classify("banana").unwrap());
		assert!(!classifier.classify("tax forms").unwrap());
	}

	#[test]
	fn missing_label_file_is_an_io_error() {
		let dir = tempdir().unwrap();
		let mut classifier = NaiveBayes::new();
		let result = classifier.train_from_file(dir.path().join("missing.txt"), true);
		assert!(matches!(result, Err(GenError::Io(_))));
		assert_eq!(classifier.num_funny(), 0);
	}
}
