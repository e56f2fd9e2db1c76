//! Trigram-based text generation library.
//!
//! This crate provides a Markov-style sentence generation system including:
//! - A concurrent weighted graph store (adjacency list)
//! - Frequency-proportional random edge selection
//! - Iterative random walks with caller-owned stop predicates
//! - A corpus layer turning cleaned text into graph structure and back
//!   into sentences
//!
//! The graph is safe to mutate and read from many threads at once: callers
//! share a single instance for the process lifetime, and ingestion and
//! generation interleave freely.

/// Core graph and corpus types.
///
/// This module exposes the high-level corpus interface and the underlying
/// graph store it drives.
pub mod model;
