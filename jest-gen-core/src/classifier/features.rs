use std::collections::hash_map;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// English stop words, matching the NLTK `stopwords.words("english")` list.
///
/// Entries containing an apostrophe can never match once punctuation is
/// stripped; they are kept so the list stays identical to the reference one.
const STOP_WORDS: &[&str] = &[
	"i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're",
	"you've", "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he",
	"him", "his", "himself", "she", "she's", "her", "hers", "herself", "it", "it's",
	"its", "itself", "they", "them", "their", "theirs", "themselves", "what",
	"which", "who", "whom", "this", "that", "that'll", "these", "those", "am", "is",
	"are", "was", "were", "be", "been", "being", "have", "has", "had", "having",
	"do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
	"because", "as", "until", "while", "of", "at", "by", "for", "with", "about",
	"against", "between", "into", "through", "during", "before", "after", "above",
	"below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
	"again", "further", "then", "once", "here", "there", "when", "where", "why",
	"how", "all", "any", "both", "each", "few", "more", "most", "other", "some",
	"such", "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very",
	"s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
	"d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn",
	"couldn't", "didn", "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn",
	"hasn't", "haven", "haven't", "isn", "isn't", "ma", "mightn", "mightn't",
	"mustn", "mustn't", "needn", "needn't", "shan", "shan't", "shouldn",
	"shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
	"wouldn't",
];

static STOP_WORD_SET: LazyLock<HashSet<&'static str>> =
	LazyLock::new(|| STOP_WORDS.iter().copied().collect());

/// A classifier feature: a single word or an ordered pair of adjacent words.
///
/// Bigrams are kept as pairs so that `("new", "york")` can never be
/// confused with a unigram spelled `"new york"`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
	Unigram(String),
	Bigram(String, String),
}

/// Multiset of features with their occurrence counts.
///
/// # Invariants
/// - Every stored count is >= 1; absent features count as 0.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FeatureBag {
	counts: HashMap<Feature, usize>,
}

impl FeatureBag {
	/// Creates an empty bag.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one occurrence of `feature`.
	pub fn add(&mut self, feature: Feature) {
		*self.counts.entry(feature).or_insert(0) += 1;
	}

	/// Adds every count of `other` into this bag.
	pub fn merge(&mut self, other: &Self) {
		for (feature, count) in &other.counts {
			*self.counts.entry(feature.clone()).or_insert(0) += *count;
		}
	}

	/// Occurrence count of `feature`, 0 when absent.
	pub fn get(&self, feature: &Feature) -> usize {
		self.counts.get(feature).copied().unwrap_or(0)
	}

	pub fn contains(&self, feature: &Feature) -> bool {
		self.counts.contains_key(feature)
	}

	/// Sum of all occurrence counts.
	pub fn total(&self) -> usize {
		self.counts.values().sum()
	}

	/// Number of distinct features.
	pub fn len(&self) -> usize {
		self.counts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}

	pub fn iter(&self) -> hash_map::Iter<'_, Feature, usize> {
		self.counts.iter()
	}
}

/// Lowercases, strips ASCII punctuation and removes stop words.
fn clean_tokens(sentence: &str) -> Vec<String> {
	let cleaned: String = sentence
		.to_lowercase()
		.chars()
		.filter(|c| !c.is_ascii_punctuation())
		.collect();

	cleaned
		.split_whitespace()
		.filter(|token| !STOP_WORD_SET.contains(*token))
		.map(str::to_owned)
		.collect()
}

/// Turns a raw sentence into its unigram and bigram counts.
///
/// Bigrams are formed after stop-word removal, so `"the cat and the hat"`
/// yields the bigram `("cat", "hat")`.
pub fn extract_features(sentence: &str) -> FeatureBag {
	let tokens = clean_tokens(sentence);
	let mut bag = FeatureBag::new();

	for token in &tokens {
		bag.add(Feature::Unigram(token.clone()));
	}
	for pair in tokens.windows(2) {
		bag.add(Feature::Bigram(pair[0].clone(), pair[1].clone()));
	}

	bag
}
