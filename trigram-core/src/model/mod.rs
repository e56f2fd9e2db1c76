//! Top-level module for the trigram generation system.
//!
//! This module provides a weighted-graph Markov text generator, including:
//! - A thread-safe adjacency-list graph store (`Graph`)
//! - Weighted random edge selection and iterative random walks
//! - A corpus layer (`Corpus`) mapping trigrams onto the graph and
//!   generating sentences from it

/// Concurrent weighted graph store.
///
/// Exposes node/edge insertion, frequency-proportional edge selection and
/// iterative random walks. Generic over the node payload.
pub mod graph;

/// Corpus of learned text.
///
/// Segments cleaned text into trigrams, feeds them into a `Graph` of
/// bigrams, and generates new sentences by weighted random walk.
pub mod corpus;
