//! Reticulation → lowest stable ancestor resolution.
//!
//! # Algorithm
//!
//! One post-order DFS from the root. Every reticulation `r` owns a
//! [`PathRecord`]: the set of *alive* path tokens (strands of flow that
//! converge into `r`) and, per edge, the subset of those tokens known to
//! cross that edge.
//!
//! 1. Entering a reticulation mints one token per in-edge and records each
//!    token on its own edge.
//! 2. After all children of `v` finish, collect the unresolved
//!    reticulations below `v`.
//! 3. For each such `r`, union `r`'s tokens over `v`'s out-edges. If the
//!    union covers every alive token, every root-to-`r` path runs through
//!    `v`: `v` is the LSA of `r`, and `r` is dropped from further checks.
//! 4. Otherwise the union is pulled up onto `v`'s first in-edge so the
//!    parent can repeat the test.
//! 5. If `v` is itself a reticulation, each of its other in-edges starts an
//!    independent strand: one fresh token per unresolved `r`.
//!
//! Tokens only ever travel up first in-edges, so every token reaches the
//! root, whose out-edges therefore cover every alive set. Each reticulation
//! gets exactly one LSA.
//!
//! All working state lives in one [`Resolver`] owned by a single call and
//! dropped on return.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use fixedbitset::FixedBitSet;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use tracing::{debug, instrument, trace, warn};

use crate::error::NetworkError;
use crate::network::{PhyloNetwork, acyclic::require_rooted_dag};
use crate::timing::timed;

/// Token bookkeeping for one reticulation.
#[derive(Debug, Clone, Default)]
struct PathRecord {
    /// Tokens not yet resolved to an LSA.
    alive: FixedBitSet,
    /// Tokens known to flow across each edge on the active frontier.
    edge_paths: HashMap<EdgeIndex, FixedBitSet>,
    next_token: usize,
}

impl PathRecord {
    /// Start a record for a freshly discovered reticulation.
    fn discover(in_edges: &[EdgeIndex]) -> Self {
        let mut record = Self::default();
        for &edge in in_edges {
            let token = record.mint();
            record.edge_paths.insert(edge, singleton(token));
        }
        record
    }

    /// Allocate a new token and mark it alive.
    fn mint(&mut self) -> usize {
        let token = self.next_token;
        self.next_token += 1;
        self.alive.grow(token + 1);
        self.alive.insert(token);
        token
    }

    /// Union of the tokens recorded on `edges`. Missing entries add nothing.
    fn union_over(&self, edges: &[EdgeIndex]) -> FixedBitSet {
        let mut union = FixedBitSet::with_capacity(self.next_token);
        for edge in edges {
            if let Some(tokens) = self.edge_paths.get(edge) {
                union.union_with(tokens);
            }
        }
        union
    }

    /// Every alive token appears in `union`.
    fn is_covered_by(&self, union: &FixedBitSet) -> bool {
        self.alive.is_subset(union)
    }
}

fn singleton(token: usize) -> FixedBitSet {
    let mut set = FixedBitSet::with_capacity(token + 1);
    set.insert(token);
    set
}

/// Per-call resolver state.
struct Resolver<'a> {
    net: &'a PhyloNetwork,
    records: HashMap<NodeIndex, PathRecord>,
    /// Reticulations strictly below each finished node that were still
    /// unresolved when that node finished.
    below: HashMap<NodeIndex, BTreeSet<NodeIndex>>,
    lsa: BTreeMap<NodeIndex, NodeIndex>,
}

impl<'a> Resolver<'a> {
    fn new(net: &'a PhyloNetwork) -> Self {
        Self {
            net,
            records: HashMap::new(),
            below: HashMap::with_capacity(net.node_count()),
            lsa: BTreeMap::new(),
        }
    }

    fn run(mut self, root: NodeIndex) -> BTreeMap<NodeIndex, NodeIndex> {
        let mut entered: HashSet<NodeIndex> = HashSet::with_capacity(self.net.node_count());
        // Each frame: (node, its children, next child to try).
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();

        entered.insert(root);
        self.enter(root);
        stack.push((root, self.net.children(root).collect(), 0));

        while let Some((node, children, next)) = stack.last_mut() {
            if let Some(&child) = children.get(*next) {
                *next += 1;
                if entered.insert(child) {
                    self.enter(child);
                    stack.push((child, self.net.children(child).collect(), 0));
                }
            } else {
                let finished = *node;
                stack.pop();
                self.finish(finished, finished == root);
            }
        }

        self.lsa
    }

    fn enter(&mut self, v: NodeIndex) {
        if !self.net.is_reticulation(v) {
            return;
        }
        let in_edges = self.net.in_edges(v);
        trace!(
            reticulation = %self.net.display_name(v),
            tokens = in_edges.len(),
            "discovered reticulation"
        );
        self.records.insert(v, PathRecord::discover(&in_edges));
    }

    fn finish(&mut self, v: NodeIndex, is_root: bool) {
        let net = self.net;

        let mut pending: BTreeSet<NodeIndex> = BTreeSet::new();
        for child in net.children(v) {
            if let Some(below_child) = self.below.get(&child) {
                pending.extend(below_child.iter().copied());
            }
            if net.is_reticulation(child) {
                pending.insert(child);
            }
        }
        pending.retain(|r| !self.lsa.contains_key(r));

        let out_edges = net.out_edges(v);
        let in_edges = net.in_edges(v);
        let mut unresolved: BTreeSet<NodeIndex> = BTreeSet::new();

        for r in pending {
            let Some(record) = self.records.get_mut(&r) else {
                continue;
            };
            let union = record.union_over(&out_edges);

            if record.is_covered_by(&union) {
                debug!(
                    reticulation = %net.display_name(r),
                    lsa = %net.display_name(v),
                    "resolved lowest stable ancestor"
                );
                self.lsa.insert(r, v);
            } else if is_root {
                // Unreachable for a single-rooted DAG; keeps the map total.
                warn!(
                    reticulation = %net.display_name(r),
                    "root out-edges do not cover all path tokens; assigning root"
                );
                self.lsa.insert(r, v);
            } else {
                if let Some(&first_in) = in_edges.first() {
                    record.edge_paths.insert(first_in, union);
                }
                unresolved.insert(r);
            }
        }

        if let Some(extra_in_edges) = in_edges.get(1..) {
            for &extra in extra_in_edges {
                for r in &unresolved {
                    if let Some(record) = self.records.get_mut(r) {
                        let token = record.mint();
                        trace!(
                            reticulation = %net.display_name(*r),
                            via = %net.display_name(v),
                            token,
                            "minted strand token"
                        );
                        record.edge_paths.insert(extra, singleton(token));
                    }
                }
            }
        }

        self.below.insert(v, unresolved);
    }
}

/// Compute the lowest stable ancestor of every reticulation.
///
/// The result maps each reticulation (in-degree ≥ 2) to the deepest node
/// through which every directed path from the root to it passes. Every
/// reticulation appears exactly once; networks without reticulations yield
/// an empty map.
///
/// # Errors
///
/// [`NetworkError::NoRoot`], [`NetworkError::MultipleRoots`] or
/// [`NetworkError::NotAcyclic`] when `net` is not a single-rooted DAG. The
/// check runs before any work.
#[instrument(skip(net), fields(nodes = net.node_count(), edges = net.edge_count()))]
pub fn compute_reticulation_to_lsa(
    net: &PhyloNetwork,
) -> Result<BTreeMap<NodeIndex, NodeIndex>, NetworkError> {
    let root = require_rooted_dag(net)?;
    let lsa = timed("lsa.resolve", || Resolver::new(net).run(root));
    debug!(reticulations = lsa.len(), "lsa resolution finished");
    Ok(lsa)
}

/// Compute the LSA-children map of `net`.
///
/// See [`lsa_children_from`] for the construction.
///
/// # Errors
///
/// Same preconditions as [`compute_reticulation_to_lsa`].
pub fn compute_lsa_children(
    net: &PhyloNetwork,
) -> Result<BTreeMap<NodeIndex, Vec<NodeIndex>>, NetworkError> {
    let lsa = compute_reticulation_to_lsa(net)?;
    Ok(lsa_children_from(net, &lsa))
}

/// Build the LSA-children map from an already computed LSA map.
///
/// For every node `v` the entry lists, in order:
/// 1. the targets of `v`'s out-edges that are not reticulations (tree
///    children, in edge insertion order), then
/// 2. every reticulation whose LSA is `v`, in index order.
///
/// Each non-root node appears under exactly one parent, so together with
/// the root the map is a spanning tree of the network. Every node has an
/// entry, leaves map to an empty list.
#[must_use]
pub fn lsa_children_from(
    net: &PhyloNetwork,
    lsa: &BTreeMap<NodeIndex, NodeIndex>,
) -> BTreeMap<NodeIndex, Vec<NodeIndex>> {
    let mut attached: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
    for (&reticulation, &ancestor) in lsa {
        attached.entry(ancestor).or_default().push(reticulation);
    }

    net.nodes()
        .map(|v| {
            let mut children: Vec<NodeIndex> = net
                .children(v)
                .filter(|&child| !net.is_reticulation(child))
                .collect();
            if let Some(reticulations) = attached.remove(&v) {
                children.extend(reticulations);
            }
            (v, children)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn node(net: &PhyloNetwork, label: &str) -> NodeIndex {
        net.node_by_label(label).expect("labelled node")
    }

    /// R → A, R → B, A → C, A → H, B → H, H → D.
    fn single_reticulation() -> PhyloNetwork {
        PhyloNetwork::from_edges(&[
            ("R", "A"),
            ("R", "B"),
            ("A", "C"),
            ("A", "H"),
            ("B", "H"),
            ("H", "D"),
        ])
    }

    #[test]
    fn path_record_tokens_are_fresh() {
        let mut record = PathRecord::discover(&[EdgeIndex::new(3), EdgeIndex::new(7)]);
        assert_eq!(record.alive.count_ones(..), 2);
        assert_eq!(record.mint(), 2);
        assert_eq!(record.alive.count_ones(..), 3);

        let partial = record.union_over(&[EdgeIndex::new(3)]);
        assert!(!record.is_covered_by(&partial));
    }

    #[test]
    fn path_record_coverage_ignores_missing_edges() {
        let record = PathRecord::discover(&[EdgeIndex::new(0), EdgeIndex::new(1)]);
        let edges = [EdgeIndex::new(0), EdgeIndex::new(1), EdgeIndex::new(9)];
        let union = record.union_over(&edges);
        assert!(record.is_covered_by(&union));
    }

    #[test]
    fn tree_has_no_reticulations() {
        let net = PhyloNetwork::from_edges(&[("R", "A"), ("R", "B"), ("A", "C")]);
        let lsa = compute_reticulation_to_lsa(&net).expect("rooted dag");
        assert!(lsa.is_empty());
    }

    #[test]
    fn worked_example_resolves_to_root() {
        let net = single_reticulation();
        let lsa = compute_reticulation_to_lsa(&net).expect("rooted dag");

        assert_eq!(lsa.len(), 1);
        assert_eq!(lsa.get(&node(&net, "H")), Some(&node(&net, "R")));
    }

    #[test]
    fn worked_example_partial_union_at_a() {
        // Replay the test at A by hand: only the A → H strand reaches A.
        let net = single_reticulation();
        let h = node(&net, "H");
        let a = node(&net, "A");
        let record = PathRecord::discover(&net.in_edges(h));

        let at_a = record.union_over(&net.out_edges(a));
        assert_eq!(at_a.count_ones(..), 1);
        assert!(!record.is_covered_by(&at_a));
    }

    #[test]
    fn lsa_below_root_when_paths_meet_early() {
        // R → X, R → L1, X → A, X → B, A → H, B → H, H → L2
        let net = PhyloNetwork::from_edges(&[
            ("R", "X"),
            ("R", "L1"),
            ("X", "A"),
            ("X", "B"),
            ("A", "H"),
            ("B", "H"),
            ("H", "L2"),
        ]);
        let lsa = compute_reticulation_to_lsa(&net).expect("rooted dag");
        assert_eq!(lsa.get(&node(&net, "H")), Some(&node(&net, "X")));
    }

    #[test]
    fn parallel_edges_make_parent_the_lsa() {
        let mut net = PhyloNetwork::from_edges(&[("R", "P"), ("R", "L1")]);
        let p = node(&net, "P");
        let h = net.add_labelled_node("H");
        net.add_edge(p, h);
        net.add_edge(p, h);

        let lsa = compute_reticulation_to_lsa(&net).expect("rooted dag");
        assert_eq!(lsa.get(&h), Some(&p));
    }

    #[test]
    fn stacked_reticulations_mint_independent_strands() {
        // V is a reticulation (parents R, P) sitting above reticulation H
        // (parents V, Q). Only R sees every strand into H.
        let net = PhyloNetwork::from_edges(&[
            ("R", "V"),
            ("R", "P"),
            ("R", "Q"),
            ("P", "V"),
            ("V", "H"),
            ("Q", "H"),
            ("H", "L"),
            ("P", "L2"),
            ("Q", "L3"),
        ]);
        let lsa = compute_reticulation_to_lsa(&net).expect("rooted dag");
        let r = node(&net, "R");

        assert_eq!(lsa.get(&node(&net, "V")), Some(&r));
        assert_eq!(lsa.get(&node(&net, "H")), Some(&r));
    }

    #[test]
    fn nested_reticulation_resolves_inside_gadget() {
        // X → A, X → B, A → V, B → V (V's LSA is X); V → H, V → K, K → H.
        // H's paths all pass through V.
        let net = PhyloNetwork::from_edges(&[
            ("R", "X"),
            ("R", "L0"),
            ("X", "A"),
            ("X", "B"),
            ("A", "V"),
            ("B", "V"),
            ("V", "H"),
            ("V", "K"),
            ("K", "H"),
            ("K", "L1"),
            ("H", "L2"),
        ]);
        let lsa = compute_reticulation_to_lsa(&net).expect("rooted dag");

        assert_eq!(lsa.get(&node(&net, "V")), Some(&node(&net, "X")));
        assert_eq!(lsa.get(&node(&net, "H")), Some(&node(&net, "V")));
    }

    #[test]
    fn rejects_missing_or_multiple_roots() {
        assert_eq!(
            compute_reticulation_to_lsa(&PhyloNetwork::new()),
            Err(NetworkError::NoRoot)
        );

        let forest = PhyloNetwork::from_edges(&[("R1", "H"), ("R2", "H")]);
        assert_eq!(
            compute_reticulation_to_lsa(&forest),
            Err(NetworkError::MultipleRoots { count: 2 })
        );
    }

    #[test]
    fn rejects_cycles() {
        let net = PhyloNetwork::from_edges(&[("R", "A"), ("A", "B"), ("B", "A")]);
        assert_eq!(
            compute_reticulation_to_lsa(&net),
            Err(NetworkError::NotAcyclic)
        );
    }

    #[test]
    fn lsa_children_attach_reticulation_to_lsa() {
        let net = single_reticulation();
        let children = compute_lsa_children(&net).expect("rooted dag");
        let n = |label| node(&net, label);

        assert_eq!(children[&n("R")], vec![n("A"), n("B"), n("H")]);
        assert_eq!(children[&n("A")], vec![n("C")]);
        assert_eq!(children[&n("B")], Vec::<NodeIndex>::new());
        assert_eq!(children[&n("H")], vec![n("D")]);
        assert_eq!(children.len(), net.node_count());
    }

    #[test]
    fn lsa_children_cover_every_non_root_once() {
        let net = PhyloNetwork::from_edges(&[
            ("R", "X"),
            ("R", "L0"),
            ("X", "A"),
            ("X", "B"),
            ("A", "V"),
            ("B", "V"),
            ("V", "H"),
            ("V", "K"),
            ("K", "H"),
            ("K", "L1"),
            ("H", "L2"),
        ]);
        let children = compute_lsa_children(&net).expect("rooted dag");

        let mut seen: Vec<NodeIndex> = children.values().flatten().copied().collect();
        seen.sort_unstable();
        let mut expected: Vec<NodeIndex> = net
            .nodes()
            .filter(|&v| v != node(&net, "R"))
            .collect();
        expected.sort_unstable();
        assert_eq!(seen, expected);
    }
}
