use super::graph::{Graph, GraphError};
use rand::prelude::IteratorRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extra steps a walk may take past `approximate_length` before the
/// sentence is force-closed. Guards against corpora whose cycles contain
/// no sentence-terminal word.
const WALK_CEILING_SLACK: usize = 10_000;

/// Errors surfaced by sentence generation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CorpusError {
	/// The corpus has no nodes at all; text must be ingested first.
	#[error("empty corpus")]
	EmptyCorpus,
	/// Nodes exist, but none qualifies as a sentence start.
	#[error("no sentence-start key in corpus")]
	NoEligibleStartKey,
}

/// Two consecutive words from the source text.
///
/// A bigram is the payload of a graph node; `word1 + word2` is the node's
/// own key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bigram {
	pub word1: String,
	pub word2: String,
}

impl Bigram {
	fn new(word1: &str, word2: &str) -> Self {
		Self {
			word1: word1.to_owned(),
			word2: word2.to_owned(),
		}
	}
}

/// A corpus of learned text, represented as a graph of bigrams.
///
/// Every trigram in the ingested text contributes two bigram nodes and a
/// weighted edge between them; sentence generation is a weighted random
/// walk over that graph. The corpus is internally concurrent: one shared
/// instance serves ingestion and generation from any number of threads.
///
/// # Responsibilities
/// - Segment tokenised text into overlapping trigrams
/// - Keep the graph consistent across concurrent ingestion calls
/// - Pick sentence-start keys and drive the random walk
///
/// # Invariants
/// - Node keys are always the concatenation of the payload's two words
/// - Every edge's endpoints exist before the edge does
#[derive(Debug, Default)]
pub struct Corpus {
	trigrams: Graph<Bigram>,
}

impl Corpus {
	/// Creates a new empty corpus.
	pub fn new() -> Self {
		Self {
			trigrams: Graph::new(),
		}
	}

	/// Returns the number of bigram nodes learned so far.
	pub fn size(&self) -> usize {
		self.trigrams.size()
	}

	/// Adds one trigram to the graph: two bigram nodes and an edge between
	/// them. For example, the trigram ["you", "with", "the"] produces the
	/// nodes "youwith" and "withthe" and an edge "youwith" -> "withthe".
	fn add_trigram(&self, w1: &str, w2: &str, w3: &str) -> Result<(), GraphError> {
		let source = format!("{w1}{w2}");
		let target = format!("{w2}{w3}");
		self.trigrams.add_node(&source, Bigram::new(w1, w2));
		self.trigrams.add_node(&target, Bigram::new(w2, w3));
		self.trigrams.add_edge(&source, &target)
	}

	/// Incorporates a new body of text into the existing corpus.
	///
	/// The text is split on single spaces and every consecutive triple of
	/// tokens is added as a trigram; trailing tokens that do not start a
	/// full trigram are left unused. Responsibility is on the caller to
	/// clean and normalise the text before calling `ingest`.
	pub fn ingest(&self, text: &str) {
		let words: Vec<&str> = text.split(' ').collect();
		for window in words.windows(3) {
			if let Err(err) = self.add_trigram(window[0], window[1], window[2]) {
				// Both endpoints were just inserted, so this cannot fire;
				// a dropped trigram is never retried.
				log::debug!("dropping trigram edge: {err}");
			}
		}
	}

	/// Returns an entrypoint into the corpus: a key chosen uniformly at
	/// random among nodes whose first word begins with an uppercase
	/// letter, the sentence-start candidates.
	///
	/// # Errors
	/// - `EmptyCorpus` if the graph has no nodes at all.
	/// - `NoEligibleStartKey` if nodes exist but none starts a sentence.
	pub fn random_start_key(&self) -> Result<String, CorpusError> {
		if self.trigrams.size() == 0 {
			return Err(CorpusError::EmptyCorpus);
		}

		let candidates = self.trigrams.keys_matching(|_, bigram| {
			bigram.word1.chars().next().is_some_and(char::is_uppercase)
		});

		candidates
			.into_iter()
			.choose(&mut rand::rng())
			.ok_or(CorpusError::NoEligibleStartKey)
	}

	/// Generates a sentence from the corpus of learned text.
	///
	/// Starting from a random sentence-start key, the walk appends the
	/// first word of each visited bigram. Once the walk is longer than
	/// `approximate_length` it ends on the first bigram whose second word
	/// closes a sentence (ends with a full stop), appending that word as
	/// well; a node without outgoing edges ends the sentence immediately.
	///
	/// A failed call leaves the corpus fully usable.
	///
	/// # Errors
	/// Propagates the start-key errors of [`Corpus::random_start_key`].
	pub fn generate(&self, approximate_length: usize) -> Result<Vec<String>, CorpusError> {
		let start = self.random_start_key()?;
		Ok(self.sentence_from(&start, approximate_length))
	}

	/// Walks the graph from `start`, accumulating words until the stop
	/// conditions of [`Corpus::generate`] are met or the walk hits a hard
	/// step ceiling.
	fn sentence_from(&self, start: &str, approximate_length: usize) -> Vec<String> {
		let ceiling = approximate_length.saturating_add(WALK_CEILING_SLACK);
		let mut words = Vec::new();

		self.trigrams.random_walk(start, |count, node| {
			let bigram = node.value();
			words.push(bigram.word1.clone());
			if node.total_edges() == 0
				|| (count >= approximate_length && bigram.word2.ends_with('.'))
				|| count >= ceiling
			{
				words.push(bigram.word2.clone());
				return true;
			}

			false
		});

		words
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ingest_builds_bigram_nodes_for_every_trigram() {
		let corpus = Corpus::new();
		corpus.ingest("The cat sat. The dog ran.");

		for key in ["Thecat", "catsat.", "sat.The", "Thedog", "dogran."] {
			assert!(corpus.trigrams.contains(key), "missing node {key}");
		}
		assert_eq!(corpus.size(), 5);

		// The final trigram (The, dog, ran.) is not dropped.
		assert_eq!(corpus.trigrams.edge_weight("Thedog", "dogran."), Some(1));
	}

	#[test]
	fn ingest_tolerates_partial_trigrams() {
		let corpus = Corpus::new();
		corpus.ingest("The cat");
		assert_eq!(corpus.size(), 0);

		corpus.ingest("The cat sat.");
		assert_eq!(corpus.size(), 2);
		assert_eq!(corpus.trigrams.edge_weight("Thecat", "catsat."), Some(1));
	}

	#[test]
	fn start_keys_begin_with_an_uppercase_word() {
		let corpus = Corpus::new();
		corpus.ingest("The cat sat. The dog ran.");

		for _ in 0..50 {
			let key = corpus.random_start_key().unwrap();
			let bigram = corpus.trigrams.value(&key).unwrap();
			assert_eq!(bigram.word1, "The");
		}
	}

	#[test]
	fn generate_walks_to_a_sentence_end() {
		let corpus = Corpus::new();
		corpus.ingest("The cat sat. The dog ran.");

		// "Thecat" has a single outgoing edge, so the walk is forced
		// through "catsat.", whose second word closes the sentence.
		let words = corpus.sentence_from("Thecat", 1);
		assert_eq!(words, vec!["The", "cat", "sat."]);
	}

	#[test]
	fn generate_on_empty_corpus_fails() {
		let corpus = Corpus::new();
		assert_eq!(corpus.random_start_key(), Err(CorpusError::EmptyCorpus));
		assert_eq!(corpus.generate(10), Err(CorpusError::EmptyCorpus));
	}

	#[test]
	fn all_lowercase_corpus_has_no_start_key() {
		let corpus = Corpus::new();
		corpus.ingest("the cat sat. the dog ran.");
		assert_eq!(corpus.generate(10), Err(CorpusError::NoEligibleStartKey));
	}

	#[test]
	fn generation_failure_does_not_poison_the_corpus() {
		let corpus = Corpus::new();
		assert!(corpus.generate(10).is_err());

		corpus.ingest("The cat sat. The dog ran.");
		let words = corpus.generate(1).unwrap();
		assert!(!words.is_empty());
	}

	#[test]
	fn cyclic_corpus_without_full_stops_still_terminates() {
		let corpus = Corpus::new();
		// Builds the two-node cycle "Ab" <-> "bA" with no terminal word.
		corpus.ingest("A b A b A");

		let words = corpus.sentence_from("Ab", 1);
		assert!(words.len() <= 1 + WALK_CEILING_SLACK + 1);
		assert!(!words.is_empty());
	}
}
