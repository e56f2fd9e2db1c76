use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

/// Errors surfaced by edge insertion.
///
/// Both endpoints of an edge must already exist in the graph; referencing
/// an unknown key is a caller bug (malformed ingestion order) and is
/// reported rather than silently dropped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
	#[error("source node must exist: {0}")]
	SourceNodeMissing(String),
	#[error("destination node must exist: {0}")]
	DestinationNodeMissing(String),
}

/// A weighted edge to another node, identified by the destination key.
/// The weight is the number of times the transition was observed.
#[derive(Debug, Clone)]
struct Edge {
	target: String,
	weight: usize,
}

/// Outgoing edges of a node together with their weight sum.
///
/// Kept behind a single per-node lock so that `total_weight` and the edge
/// weights can never be observed out of step with each other.
#[derive(Debug, Default)]
struct Links {
	total_weight: usize,
	edges: Vec<Edge>,
}

impl Links {
	/// Records one more observation of the transition toward `target`.
	///
	/// - If the edge already exists, its weight is increased.
	/// - Otherwise, a new edge is created with an initial weight of 1.
	///
	/// `total_weight` is updated in the same call, under the same lock.
	fn bump(&mut self, target: &str) {
		self.total_weight += 1;
		if let Some(edge) = self.edges.iter_mut().find(|e| e.target == target) {
			edge.weight += 1;
			return;
		}
		self.edges.push(Edge { target: target.to_owned(), weight: 1 });
	}

	/// Selects an edge using weighted random sampling.
	///
	/// The probability of selecting an edge is proportional to its weight:
	/// draw a uniform point in `[1, total_weight]`, then scan the edges
	/// accumulating weights until the running sum reaches the point.
	/// This is an O(n) scan over the edges.
	///
	/// Returns `None` if the node has no outgoing edges.
	fn random_edge(&self) -> Option<&Edge> {
		if self.edges.is_empty() || self.total_weight == 0 {
			return None;
		}

		let stopping_point = rand::rng().random_range(1..=self.total_weight);
		let mut count = 0;
		for edge in &self.edges {
			count += edge.weight;
			if count >= stopping_point {
				return Some(edge);
			}
		}

		// Unreachable while the weight invariant holds, but kept for safety.
		self.edges.last()
	}
}

/// A node in the graph: an opaque payload plus its outgoing edges.
#[derive(Debug)]
struct Node<T> {
	value: T,
	links: RwLock<Links>,
}

/// Read-only snapshot of a node handed to a walk's stop predicate.
///
/// The view is taken under the node's read lock, so the payload and the
/// edge count are consistent with each other for the duration of the
/// predicate call.
pub struct NodeView<'a, T> {
	value: &'a T,
	total_edges: usize,
}

impl<T> NodeView<'_, T> {
	/// The payload stored at this node.
	pub fn value(&self) -> &T {
		self.value
	}

	/// The number of outgoing edges this node currently has.
	pub fn total_edges(&self) -> usize {
		self.total_edges
	}
}

/// A low-level weighted graph, implemented as an adjacency list.
///
/// The graph is thread-safe: the node map is a concurrent map whose entry
/// API makes insert-if-absent a single atomic operation, each node guards
/// its weight and edge list with its own read/write lock, and the node
/// count is an atomic counter. Ingestion into disjoint nodes proceeds in
/// parallel without contention; a walk spanning several nodes observes
/// each node's state independently rather than a point-in-time snapshot
/// of the whole graph.
///
/// # Responsibilities
/// - Insert nodes exactly once per key (idempotent `add_node`)
/// - Maintain edge weights and each node's weight sum together
/// - Select edges with frequency-proportional probability
/// - Walk the graph iteratively under a caller-owned stop predicate
///
/// # Invariants
/// - For every node, `total_weight` equals the sum of its edge weights
/// - At most one edge exists per (source, target) pair
/// - `size` equals the number of distinct keys ever inserted; nodes and
///   edges are never removed
#[derive(Debug)]
pub struct Graph<T> {
	nodes: DashMap<String, Node<T>>,
	size: AtomicUsize,
}

impl<T> Default for Graph<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Graph<T> {
	/// Creates a new empty graph.
	pub fn new() -> Self {
		Self {
			nodes: DashMap::new(),
			size: AtomicUsize::new(0),
		}
	}

	/// Adds a new node to the graph.
	///
	/// Inserting is idempotent: if the key is already present, the call is
	/// a no-op and the existing payload is kept, even if `value` differs.
	/// Two concurrent inserts of the same new key store exactly one node
	/// and increment the size exactly once; the loser's payload is
	/// discarded, not merged.
	pub fn add_node(&self, key: &str, value: T) {
		match self.nodes.entry(key.to_owned()) {
			Entry::Occupied(_) => (),
			Entry::Vacant(slot) => {
				slot.insert(Node {
					value,
					links: RwLock::new(Links::default()),
				});
				self.size.fetch_add(1, Ordering::Relaxed);
			}
		}
	}

	/// Adds an edge between two existing nodes.
	///
	/// On success the source node's `total_weight` is incremented and the
	/// edge's weight with it, under the source node's write lock, so no
	/// concurrent reader can see one increment without the other. Repeated
	/// (source, target) pairs increment the existing edge instead of
	/// duplicating it.
	///
	/// # Errors
	/// Both nodes must exist in the graph prior to creating an edge.
	/// A dangling edge would break walk termination, so the destination is
	/// validated as well; nodes are never removed, which keeps these
	/// checks valid after they are made.
	pub fn add_edge(&self, source: &str, target: &str) -> Result<(), GraphError> {
		let node = self
			.nodes
			.get(source)
			.ok_or_else(|| GraphError::SourceNodeMissing(source.to_owned()))?;

		if !self.nodes.contains_key(target) {
			return Err(GraphError::DestinationNodeMissing(target.to_owned()));
		}

		let mut links = node.links.write().unwrap_or_else(PoisonError::into_inner);
		links.bump(target);
		Ok(())
	}

	/// Returns the total number of nodes in the graph.
	pub fn size(&self) -> usize {
		self.size.load(Ordering::Relaxed)
	}

	/// Returns true if a node exists for `key`.
	pub fn contains(&self, key: &str) -> bool {
		self.nodes.contains_key(key)
	}

	/// Returns a copy of the payload stored at `key`, if any.
	pub fn value(&self, key: &str) -> Option<T>
	where
		T: Clone,
	{
		self.nodes.get(key).map(|node| node.value.clone())
	}

	/// Returns the number of outgoing edges of the node at `key`.
	pub fn total_edges(&self, key: &str) -> Option<usize> {
		self.nodes.get(key).map(|node| {
			node.links
				.read()
				.unwrap_or_else(PoisonError::into_inner)
				.edges
				.len()
		})
	}

	/// Returns the weight sum of the node at `key`.
	pub fn total_weight(&self, key: &str) -> Option<usize> {
		self.nodes.get(key).map(|node| {
			node.links
				.read()
				.unwrap_or_else(PoisonError::into_inner)
				.total_weight
		})
	}

	/// Returns the weight of the edge from `source` to `target`, if both
	/// the node and the edge exist.
	pub fn edge_weight(&self, source: &str, target: &str) -> Option<usize> {
		let node = self.nodes.get(source)?;
		let links = node.links.read().unwrap_or_else(PoisonError::into_inner);
		links
			.edges
			.iter()
			.find(|e| e.target == target)
			.map(|e| e.weight)
	}

	/// Collects the keys whose (key, payload) pair satisfies `pred`.
	///
	/// The predicate observes each node independently; nodes inserted
	/// concurrently with the scan may or may not be visited.
	pub fn keys_matching<F>(&self, mut pred: F) -> Vec<String>
	where
		F: FnMut(&str, &T) -> bool,
	{
		self.nodes
			.iter()
			.filter(|entry| pred(entry.key(), &entry.value().value))
			.map(|entry| entry.key().clone())
			.collect()
	}

	/// Walks the graph from `start`, testing each visited node with `stop`.
	///
	/// Each step increments a counter, takes a consistent read snapshot of
	/// the current node, and hands both to the predicate. The walk ends
	/// when the predicate returns true (inclusive of the current node),
	/// when the current node has no outgoing edges, or when a key resolves
	/// to no node. Otherwise the next node is chosen by weighted random
	/// sampling over the outgoing edges.
	///
	/// The traversal is an explicit loop: arbitrarily long walks use
	/// constant stack space.
	///
	/// The predicate must not call back into this graph, as the current
	/// node's read lock is held while it runs.
	pub fn random_walk<F>(&self, start: &str, mut stop: F)
	where
		F: FnMut(usize, &NodeView<'_, T>) -> bool,
	{
		let mut count = 0;
		let mut current = start.to_owned();
		loop {
			count += 1;
			let Some(node) = self.nodes.get(&current) else {
				// Unreachable while both edge endpoints are validated on
				// insertion; a missing node ends the walk.
				return;
			};

			let links = node.links.read().unwrap_or_else(PoisonError::into_inner);
			let view = NodeView {
				value: &node.value,
				total_edges: links.edges.len(),
			};
			if stop(count, &view) {
				return;
			}

			let Some(edge) = links.random_edge() else {
				return;
			};
			let next = edge.target.clone();
			drop(links);
			drop(node);
			current = next;
		}
	}
}
