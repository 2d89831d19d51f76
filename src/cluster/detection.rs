//! Quasi-clique cluster detection
//!
//! Clusters are grown greedily from the heaviest edge whose endpoints are
//! both still free. A node joins a cluster only when its heaviest incident
//! edges are exactly the edges tying it to every current member.
//!
//! Candidates are always drawn from the neighbourhood of the cluster's seed
//! node, never from the neighbourhood of later members. A candidate must be
//! adjacent to every member, so the seed's neighbourhood already holds every
//! node that could ever join.

use std::collections::HashMap;

use itertools::Itertools;

use crate::cluster::metrics::calculate_cluster_metrics;
use crate::cluster::ranking::{EdgeRanking, WeightQueue};
use crate::cluster::{Cluster, Partition};
use crate::graph::CompressedGraph;

/// Nodes already committed to a finished cluster
#[derive(Debug, Clone)]
pub struct AssignedSet {
    flags: Vec<bool>,
    count: usize,
}

impl AssignedSet {
    /// Create an empty set for a graph with `node_count` nodes
    pub fn new(node_count: usize) -> Self {
        Self {
            flags: vec![false; node_count],
            count: 0,
        }
    }

    /// Mark a node as assigned; returns false if it already was
    pub fn insert(&mut self, node: u32) -> bool {
        let flag = &mut self.flags[node as usize];
        if *flag {
            return false;
        }
        *flag = true;
        self.count += 1;
        true
    }

    pub fn contains(&self, node: u32) -> bool {
        self.flags[node as usize]
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Nodes not yet assigned, in node order
    pub fn unassigned(&self) -> impl Iterator<Item = u32> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, assigned)| !**assigned)
            .map(|(node, _)| node as u32)
    }
}

/// Pick the seed endpoint of an edge: the lower-degree one, the source on a tie
pub fn choose_seed(graph: &CompressedGraph, edge: u32) -> u32 {
    let edge = graph.edge(edge);
    if graph.degree(edge.source) > graph.degree(edge.target) {
        edge.target
    } else {
        edge.source
    }
}

/// Outcome of walking a candidate's edges heaviest first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Admission {
    /// Edges visited before the walk stopped
    pub examined: usize,

    /// Visited edges that lead into the cluster
    pub matched: usize,

    /// Total number of edges incident to the candidate
    pub neighbour_count: usize,

    /// Weight of the last edge that led into the cluster
    pub matched_weight: f64,

    /// Weight of the last edge visited
    pub last_weight: f64,

    /// Cluster size the candidate was tested against
    pub cluster_size: usize,
}

impl Admission {
    /// True when the cluster's edges are the candidate's heaviest edges
    pub fn accepted(&self) -> bool {
        self.matched == self.cluster_size
            && (self.matched_weight > self.last_weight
                || (self.matched_weight == self.last_weight
                    && self.neighbour_count == self.cluster_size))
    }
}

/// Greedy quasi-clique growth over one graph.
///
/// Owns all scratch state for a run: the edge ranking, the assigned set,
/// the membership flags of the cluster in progress and the candidate weights.
pub struct ClusterGrowthEngine<'g> {
    graph: &'g CompressedGraph,
    ranking: EdgeRanking,
    assigned: AssignedSet,
    in_cluster: Vec<bool>,
    candidate_weight: HashMap<u32, f64>,
    clusters: Vec<Cluster>,
}

impl<'g> ClusterGrowthEngine<'g> {
    pub fn new(graph: &'g CompressedGraph) -> Self {
        Self {
            graph,
            ranking: EdgeRanking::new(graph),
            assigned: AssignedSet::new(graph.node_count),
            in_cluster: vec![false; graph.node_count],
            candidate_weight: HashMap::new(),
            clusters: Vec::new(),
        }
    }

    pub fn assigned(&self) -> &AssignedSet {
        &self.assigned
    }

    /// Heaviest weight of any edge from `node` into the current cluster, as
    /// recorded by the latest candidate scan
    pub fn candidate_weight(&self, node: u32) -> Option<f64> {
        self.candidate_weight.get(&node).copied()
    }

    /// Scan the seed's neighbours for nodes adjacent to every member
    pub fn discover_candidates(&mut self, seed: u32, cluster: &[u32]) -> WeightQueue<u32> {
        let graph = self.graph;
        let mut candidates = WeightQueue::default();
        self.candidate_weight.clear();

        for adjacent in graph.neighbours(seed) {
            let node = adjacent.node;
            if self.in_cluster[node as usize] {
                continue;
            }

            let mut max_weight = 0.0_f64;
            let mut count = 0;
            for &member in cluster {
                if let Some(edge) = graph.find_edge(member, node) {
                    max_weight = max_weight.max(graph.weight(edge));
                    count += 1;
                }
            }
            debug_assert!(count <= cluster.len(), "candidate linked to more members than exist");

            self.candidate_weight.insert(node, max_weight);
            if count == cluster.len() {
                candidates.push(node, max_weight);
            }
        }

        candidates
    }

    /// Walk the candidate's edges heaviest first until one leaves the cluster
    pub fn admission(&self, candidate: u32, cluster_size: usize) -> Admission {
        let graph = self.graph;
        let adjacent = graph.neighbours(candidate);
        let mut edges = WeightQueue::with_capacity(adjacent.len());
        for entry in adjacent {
            edges.push(entry.edge, graph.weight(entry.edge));
        }

        let mut admission = Admission {
            examined: 0,
            matched: 0,
            neighbour_count: edges.len(),
            matched_weight: 0.0,
            last_weight: 0.0,
            cluster_size,
        };

        while admission.examined == admission.matched {
            let Some((edge, weight)) = edges.pop_weighted() else {
                break;
            };
            admission.examined += 1;
            admission.last_weight = weight;

            // An assigned candidate never matches, whichever edge is visited.
            if self.assigned.contains(candidate) {
                continue;
            }
            let other = graph.edge(edge).opposite(candidate);
            let inside = self.in_cluster[other as usize];
            log::trace!(
                "         {} -- {} {} {}",
                graph.label(candidate),
                graph.label(other),
                weight,
                if inside { "yes" } else { "no" }
            );
            if inside {
                admission.matched += 1;
                admission.matched_weight = weight;
            }
        }

        admission
    }

    /// Grow a cluster from a seed until no candidate passes admission
    pub fn grow(&mut self, seed: u32) -> Vec<u32> {
        let graph = self.graph;
        let mut cluster = vec![seed];
        self.in_cluster[seed as usize] = true;

        'growth: loop {
            log::trace!(
                "   Current cluster = {{{}}}",
                cluster.iter().map(|&n| graph.label(n)).join("} {")
            );

            let mut candidates = self.discover_candidates(seed, &cluster);
            while let Some(candidate) = candidates.pop() {
                log::trace!("      Candidate node {:?}", graph.label(candidate));
                let admission = self.admission(candidate, cluster.len());
                if admission.accepted() {
                    log::trace!("      add to cluster");
                    cluster.push(candidate);
                    self.in_cluster[candidate as usize] = true;
                    continue 'growth;
                }
                log::trace!("      candidate connected to heavy edges not in cluster");
            }
            break;
        }

        cluster
    }

    /// Commit a grown cluster and mark its members assigned
    fn finalize(&mut self, members: Vec<u32>, seed_edge: Option<u32>) {
        for &node in &members {
            self.in_cluster[node as usize] = false;
            let fresh = self.assigned.insert(node);
            debug_assert!(fresh, "node {node} assigned to two clusters");
        }

        if log::log_enabled!(log::Level::Debug) {
            let metrics = calculate_cluster_metrics(self.graph, &members);
            log::debug!(
                "Cluster {}: {} members, density {:.3}, mean weight {:.3}",
                self.clusters.len(),
                metrics.size,
                metrics.density,
                metrics.mean_weight
            );
        }

        self.clusters.push(Cluster {
            id: self.clusters.len() as u32,
            members,
            seed_edge,
        });
    }

    /// Grow the next cluster from the heaviest usable edge.
    ///
    /// Returns `false` once no usable edge is left.
    pub fn step(&mut self) -> bool {
        let graph = self.graph;
        let Some(edge) = self.ranking.pop_next_usable(graph, &self.assigned) else {
            return false;
        };

        let seed = choose_seed(graph, edge);
        let e = graph.edge(edge);
        log::trace!(
            "Heaviest edge: {} -- {}, weight={}, seed={} (degrees {} {})",
            graph.label(e.source),
            graph.label(e.target),
            e.weight,
            graph.label(seed),
            graph.degree(e.source),
            graph.degree(e.target)
        );

        let members = self.grow(seed);
        log::trace!(
            "   Final cluster = {{{}}}",
            members.iter().map(|&n| graph.label(n)).join("} {")
        );
        self.finalize(members, Some(edge));
        true
    }

    /// Grow clusters until the ranking is exhausted, then sweep up singletons
    pub fn run(mut self) -> Partition {
        while self.step() {}

        let grown = self.clusters.len();
        let leftovers: Vec<u32> = self.assigned.unassigned().collect();
        for node in leftovers {
            self.finalize(vec![node], None);
        }

        log::info!(
            "Found {} grown clusters and {} singletons",
            grown,
            self.clusters.len() - grown
        );
        debug_assert_eq!(self.assigned.len(), self.graph.node_count);

        Partition {
            clusters: self.clusters,
        }
    }
}

/// Partition a weighted graph into greedily grown quasi-cliques
pub fn find_quasi_cliques(graph: &CompressedGraph) -> Partition {
    log::info!(
        "Finding quasi-cliques in graph with {} nodes and {} edges",
        graph.node_count,
        graph.edge_count()
    );
    ClusterGrowthEngine::new(graph).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use rstest::rstest;

    /// Build a graph from labels and `(a, b, weight)` triples over label positions
    fn graph(labels: &[&str], edges: &[(u32, u32, f64)]) -> CompressedGraph {
        let mut builder = GraphBuilder::with_capacity(labels.len());
        for (id, label) in labels.iter().enumerate() {
            builder.add_node(id as i64, Some(label.to_string())).unwrap();
        }
        for &(a, b, w) in edges {
            builder.add_edge(a, b, w).unwrap();
        }
        builder.build()
    }

    fn labels(graph: &CompressedGraph) -> Vec<Vec<String>> {
        find_quasi_cliques(graph).labels(graph)
    }

    fn assert_partitions(graph: &CompressedGraph, partition: &Partition) {
        let mut seen = vec![0; graph.node_count];
        for cluster in &partition.clusters {
            assert!(!cluster.members.is_empty());
            for &node in &cluster.members {
                seen[node as usize] += 1;
            }
        }
        assert!(seen.iter().all(|&count| count == 1), "{seen:?}");
    }

    #[test]
    fn triangle_plus_isolated_node() {
        let g = graph(
            &["A", "B", "C", "D"],
            &[(0, 1, 5.0), (0, 2, 4.0), (1, 2, 4.0)],
        );
        assert_eq!(labels(&g), vec![vec!["A", "B", "C"], vec!["D"]]);
    }

    #[test]
    fn disjoint_triangles_stay_apart() {
        let g = graph(
            &["a1", "a2", "a3", "b1", "b2", "b3"],
            &[
                (0, 1, 10.0),
                (1, 2, 9.0),
                (0, 2, 8.0),
                (3, 4, 3.0),
                (4, 5, 2.0),
                (3, 5, 1.0),
            ],
        );
        let partition = find_quasi_cliques(&g);
        assert_partitions(&g, &partition);
        assert_eq!(
            partition.labels(&g),
            vec![vec!["a1", "a2", "a3"], vec!["b1", "b2", "b3"]]
        );
        assert_eq!(partition.grown().count(), 2);
    }

    #[test]
    fn single_edge_makes_one_pair() {
        let g = graph(&["x", "y"], &[(0, 1, 1.0)]);
        assert_eq!(labels(&g), vec![vec!["x", "y"]]);
    }

    #[test]
    fn edgeless_graph_is_all_singletons() {
        let g = graph(&["p", "q", "r"], &[]);
        assert_eq!(labels(&g), vec![vec!["p"], vec!["q"], vec!["r"]]);
    }

    #[test]
    fn empty_graph_gives_empty_partition() {
        let g = graph(&[], &[]);
        assert!(find_quasi_cliques(&g).is_empty());
    }

    #[rstest]
    #[case::lower_degree_target(&[(0, 1, 9.0), (0, 2, 1.0)], 1)]
    #[case::equal_degree_source(&[(0, 1, 9.0)], 0)]
    #[case::lower_degree_source(&[(1, 0, 9.0), (0, 2, 1.0)], 1)]
    fn seed_prefers_lower_degree_then_source(#[case] edges: &[(u32, u32, f64)], #[case] seed: u32) {
        let g = graph(&["n0", "n1", "n2"], edges);
        assert_eq!(choose_seed(&g, 0), seed);
    }

    #[test]
    fn heavy_outside_edge_blocks_admission() {
        // C is tied to A and B by 4, but its edge to D outweighs them.
        let g = graph(
            &["A", "B", "C", "D"],
            &[(0, 1, 10.0), (0, 2, 4.0), (1, 2, 4.0), (2, 3, 6.0)],
        );
        let partition = find_quasi_cliques(&g);
        assert_partitions(&g, &partition);
        assert_eq!(partition.labels(&g), vec![vec!["A", "B"], vec!["D", "C"]]);
    }

    #[test]
    fn tied_outside_edge_blocks_admission() {
        let g = graph(
            &["A", "B", "C"],
            &[(0, 1, 5.0), (1, 2, 5.0)],
        );
        // A seeds (degree 1). B's edges tie at 5 and one leaves the cluster.
        let mut engine = ClusterGrowthEngine::new(&g);
        engine.in_cluster[0] = true;
        let admission = engine.admission(1, 1);
        assert_eq!(admission.matched, 1);
        assert_eq!(admission.matched_weight, admission.last_weight);
        assert!(!admission.accepted());
        assert_eq!(labels(&g), vec![vec!["A"], vec!["C"], vec!["B"]]);
    }

    #[test]
    fn uniform_weights_stall_growth() {
        // A 4-clique with equal weights: every candidate has edges outside
        // the cluster at the same weight, so only the exhaustive case admits.
        let g = graph(
            &["a", "b", "c", "d"],
            &[
                (0, 1, 1.0),
                (0, 2, 1.0),
                (0, 3, 1.0),
                (1, 2, 1.0),
                (1, 3, 1.0),
                (2, 3, 1.0),
            ],
        );
        let partition = find_quasi_cliques(&g);
        assert_partitions(&g, &partition);
        assert_eq!(
            partition.labels(&g),
            vec![vec!["a"], vec!["b"], vec!["c"], vec!["d"]]
        );
    }

    #[test]
    fn admitted_candidates_have_their_heaviest_edges_inside() {
        let g = graph(
            &["A", "B", "C", "D", "E", "F"],
            &[
                (0, 1, 9.0),
                (0, 2, 8.0),
                (1, 2, 7.0),
                (2, 3, 2.0),
                (0, 3, 1.0),
                (3, 4, 6.0),
                (4, 5, 5.0),
                (3, 5, 4.0),
            ],
        );
        let partition = find_quasi_cliques(&g);
        assert_partitions(&g, &partition);

        for cluster in partition.grown() {
            for (k, &node) in cluster.members.iter().enumerate().skip(1) {
                let before = &cluster.members[..k];
                let mut inside: Vec<f64> = before
                    .iter()
                    .map(|&m| g.weight(g.find_edge(m, node).unwrap()))
                    .collect();
                inside.sort_by(|a, b| a.total_cmp(b));
                let lightest_inside = inside[0];
                let heaviest_outside = g
                    .neighbours(node)
                    .iter()
                    .filter(|adj| !before.contains(&adj.node))
                    .map(|adj| g.weight(adj.edge))
                    .fold(f64::NEG_INFINITY, f64::max);
                assert!(lightest_inside > heaviest_outside);
            }
        }
        assert_eq!(
            partition.labels(&g),
            vec![vec!["B", "A", "C"], vec!["E", "D", "F"]]
        );
    }

    #[test]
    fn growth_rescans_candidates_after_each_admission() {
        // u fails against {s, t} but passes once v has joined, so it is only
        // admitted if discovery reruns on the larger cluster.
        let g = graph(
            &["s", "t", "u", "v"],
            &[
                (0, 1, 10.0),
                (0, 2, 5.0),
                (1, 2, 3.0),
                (2, 3, 4.0),
                (0, 3, 4.5),
                (1, 3, 6.0),
            ],
        );
        let mut engine = ClusterGrowthEngine::new(&g);
        engine.in_cluster[0] = true;
        engine.in_cluster[1] = true;
        assert!(!engine.admission(2, 2).accepted());

        assert_eq!(labels(&g), vec![vec!["s", "t", "v", "u"]]);
    }

    #[test]
    fn candidates_must_neighbour_the_seed() {
        // B seeds (degree 1) and pulls in A; C hangs off A only, so it never
        // neighbours the seed and is never considered.
        let g = graph(&["A", "B", "C"], &[(1, 0, 9.0), (0, 2, 1.0)]);
        let mut engine = ClusterGrowthEngine::new(&g);
        assert_eq!(choose_seed(&g, 0), 1);
        let members = engine.grow(1);
        assert_eq!(members, vec![1, 0]);
    }

    #[test]
    fn candidate_weights_track_the_heaviest_link() {
        let g = graph(
            &["A", "B", "C"],
            &[(0, 1, 5.0), (0, 2, 2.0), (1, 2, 3.0)],
        );
        let mut engine = ClusterGrowthEngine::new(&g);
        engine.in_cluster[0] = true;
        engine.in_cluster[1] = true;
        let mut queue = engine.discover_candidates(0, &[0, 1]);
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(engine.candidate_weight(2), Some(3.0));
    }

    #[test]
    fn assigned_candidates_never_match() {
        let g = graph(&["A", "B"], &[(0, 1, 5.0)]);
        let mut engine = ClusterGrowthEngine::new(&g);
        engine.assigned.insert(1);
        engine.in_cluster[0] = true;
        let admission = engine.admission(1, 1);
        assert_eq!(admission.examined, 1);
        assert_eq!(admission.matched, 0);
        assert!(!admission.accepted());
    }

    #[test]
    fn step_commits_members_and_reports_exhaustion() {
        let g = graph(&["x", "y", "z"], &[(0, 1, 1.0)]);
        let mut engine = ClusterGrowthEngine::new(&g);
        assert!(engine.assigned().is_empty());
        assert!(engine.step());
        assert_eq!(engine.assigned().len(), 2);
        assert!(!engine.assigned().contains(2));
        assert!(!engine.step());
    }

    #[test]
    fn reruns_are_deterministic() {
        let g = graph(
            &["a", "b", "c", "d", "e"],
            &[
                (0, 1, 2.0),
                (1, 2, 2.0),
                (2, 3, 2.0),
                (3, 4, 2.0),
                (0, 4, 2.0),
                (0, 2, 3.0),
            ],
        );
        let first = find_quasi_cliques(&g);
        let second = find_quasi_cliques(&g);
        assert_eq!(first, second);
        assert_partitions(&g, &first);
    }
}
