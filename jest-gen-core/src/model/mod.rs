//! Top-level module for sentence generation.
//!
//! This module provides a word-level Markov sentence generator, including:
//! - The Markov chain itself (`MarkovModel`)
//! - Internal state management (`State`)
//! - Generation configuration (`GenerationInput`)
//! - The generate-and-filter loop (`Generator`)

/// Generate-and-filter loop combining a Markov model with a classifier.
///
/// Retries candidates until one is accepted or the retry budget runs out.
pub mod generator;

/// Word-level Markov chain.
///
/// Supports incremental training, random-walk generation, loading a corpus
/// from disk with a binary cache, merging and JSON snapshots.
pub mod markov_model;

/// Internal representation of a single Markov state (one word).
///
/// Tracks the ordered successor list and samples from it.
/// This module is not exposed publicly.
mod state;

/// Generation parameters: retry budget and start seed.
pub mod generation_input;
