//! Per-particle neighbor graphs: the cutoff-distance graph and the symmetrized Voronoi graph.

use log::debug;
use nalgebra::Point3;

use crate::points_searcher::PointsSearcher;

/// Undirected neighbor graph stored as sorted adjacency lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborGraph {
    neighbors: Vec<Vec<usize>>,
}

impl NeighborGraph {
    /// Graph with `n` particles and no edges
    #[must_use]
    pub fn empty(n: usize) -> Self {
        Self {
            neighbors: vec![Vec::new(); n],
        }
    }

    /// Build from unordered pairs; self-loops and duplicates are dropped.
    #[must_use]
    pub fn from_pairs(n: usize, pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut graph = Self::empty(n);
        for (a, b) in pairs {
            if a != b && a < n && b < n {
                graph.neighbors[a].push(b);
                graph.neighbors[b].push(a);
            }
        }
        graph.normalize();
        graph
    }

    /// Symmetrize possibly one-sided adjacency lists by union: an edge exists
    /// whenever either endpoint reports it.
    #[must_use]
    pub fn symmetrized(directed: &[Vec<usize>]) -> Self {
        let n = directed.len();
        let pairs = directed
            .iter()
            .enumerate()
            .flat_map(|(a, list)| list.iter().map(move |&b| (a, b)));
        let graph = Self::from_pairs(n, pairs);

        let one_sided = directed
            .iter()
            .enumerate()
            .flat_map(|(a, list)| list.iter().map(move |&b| (a, b)))
            .filter(|&(a, b)| b < n && !directed[b].contains(&a))
            .count();
        if one_sided > 0 {
            debug!("Symmetrization added {one_sided} one-sided edges");
        }

        graph
    }

    fn normalize(&mut self) {
        for list in &mut self.neighbors {
            list.sort_unstable();
            list.dedup();
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.neighbors[i]
    }

    #[inline]
    #[must_use]
    pub fn degree(&self, i: usize) -> usize {
        self.neighbors[i].len()
    }

    #[must_use]
    pub fn contains_edge(&self, a: usize, b: usize) -> bool {
        self.neighbors[a].binary_search(&b).is_ok()
    }

    /// Unordered edges `(a, b)` with `a < b`
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.neighbors
            .iter()
            .enumerate()
            .flat_map(|(a, list)| list.iter().filter(move |&&b| b > a).map(move |&b| (a, b)))
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Every edge is reachable from both endpoints
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.neighbors
            .iter()
            .enumerate()
            .all(|(a, list)| list.iter().all(|&b| self.contains_edge(b, a)))
    }
}

/// Cutoff-distance graph with the center-neighbor distance paired to each edge.
#[derive(Debug, Clone)]
pub struct CutoffGraph {
    graph: NeighborGraph,
    distances: Vec<Vec<f64>>,
}

impl CutoffGraph {
    #[inline]
    #[must_use]
    pub const fn graph(&self) -> &NeighborGraph {
        &self.graph
    }

    /// Distances aligned with `graph().neighbors(i)`
    #[inline]
    #[must_use]
    pub fn distances(&self, i: usize) -> &[f64] {
        &self.distances[i]
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }
}

/// Build the graph of all pairs closer than or equal to `cutoff`.
#[must_use]
pub fn build_cutoff_graph(positions: &[Point3<f64>], cutoff: f64) -> CutoffGraph {
    let searcher = PointsSearcher::new(positions, cutoff);
    let pairs = searcher.find_pairs_within(cutoff);
    debug!("Cutoff {cutoff:.4}: {} pairs", pairs.len());

    let graph = NeighborGraph::from_pairs(positions.len(), pairs.iter().map(|&(a, b, _)| (a, b)));
    let distances = (0..positions.len())
        .map(|i| {
            graph
                .neighbors(i)
                .iter()
                .map(|&j| (positions[j] - positions[i]).norm())
                .collect()
        })
        .collect();

    CutoffGraph { graph, distances }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetrized_union() {
        // 0 reports 1, 1 does not report 0; 2 reports 1 and 1 reports 2.
        let directed = vec![vec![1], vec![2], vec![1]];
        let graph = NeighborGraph::symmetrized(&directed);
        assert!(graph.is_symmetric());
        assert_eq!(graph.neighbors(0), &[1]);
        assert_eq!(graph.neighbors(1), &[0, 2]);
        assert_eq!(graph.neighbors(2), &[1]);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_edges_are_ordered() {
        let graph = NeighborGraph::from_pairs(4, [(3, 0), (1, 2), (0, 3), (2, 2)]);
        let edges: Vec<_> = graph.edges().collect();
        assert_eq!(edges, vec![(0, 3), (1, 2)]);
    }

    #[test]
    fn test_cutoff_graph_on_a_line() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.1, 0.0, 0.0),
            Point3::new(4.2, 0.0, 0.0),
        ];
        let cutoff = build_cutoff_graph(&positions, 2.5);
        assert_eq!(cutoff.graph().degree(0), 1);
        assert_eq!(cutoff.graph().degree(1), 2);
        assert_eq!(cutoff.graph().degree(2), 1);
        assert!((cutoff.distances(1)[0] - 2.1).abs() < 1e-12);
    }

    #[test]
    fn test_isolated_particle_has_no_neighbors() {
        let positions = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)];
        let cutoff = build_cutoff_graph(&positions, 5.0);
        assert!(cutoff.graph().neighbors(0).is_empty());
        assert!(cutoff.distances(1).is_empty());
    }
}
