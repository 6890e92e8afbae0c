//! Recursive spectral partitioning.
//!
//! Subsets are bisected by their Fiedler vector until they are small enough,
//! deep enough, or cannot be split. Work is kept on an explicit stack of
//! `(subset, depth)` pairs, so an unbalanced split chain grows a `Vec`, not
//! the call stack. Halves are processed depth-first, negative half first, and
//! cluster ids are handed out in the order leaves are reached.

use log::debug;

use super::{ClusterAssignment, LeafReason};
use crate::algo::eigen::SymmetricEigensolver;
use crate::algo::graph::GraphBuilder;
use crate::algo::spectral::SpectralBisector;

/// Recursive bisection driver.
#[derive(Debug, Clone)]
pub struct RecursivePartitioner<S> {
    bisector: SpectralBisector<S>,
    max_depth: usize,
    max_cluster_size: usize,
}

impl<S: SymmetricEigensolver> RecursivePartitioner<S> {
    /// Create a partitioner.
    ///
    /// A subset becomes a leaf once its size is at most `max_cluster_size` or
    /// its depth reaches `max_depth`.
    pub fn new(solver: S, max_depth: usize, max_cluster_size: usize) -> Self {
        Self {
            bisector: SpectralBisector::new(solver),
            max_depth,
            max_cluster_size,
        }
    }

    /// Partition `subset` at depth 0, appending its leaves to `assignment`.
    ///
    /// Every vertex of `subset` receives a cluster id, including those of
    /// subsets the solver could not split. An empty subset consumes no id.
    pub fn partition(
        &self,
        graph: &mut GraphBuilder<'_>,
        subset: Vec<usize>,
        assignment: &mut ClusterAssignment,
    ) {
        let mut stack: Vec<(Vec<usize>, usize)> = vec![(subset, 0)];

        while let Some((vertices, depth)) = stack.pop() {
            if vertices.is_empty() {
                continue;
            }

            if vertices.len() <= self.max_cluster_size {
                assignment.push_leaf(&vertices, depth, LeafReason::SizeLimit);
                continue;
            }

            if depth >= self.max_depth {
                assignment.push_leaf(&vertices, depth, LeafReason::DepthLimit);
                continue;
            }

            let laplacian = graph.induced_laplacian(&vertices);
            match self.bisector.bisect(&laplacian) {
                Ok(split) => {
                    stack.push((split.non_negative, depth + 1));
                    stack.push((split.negative, depth + 1));
                }
                Err(err) => {
                    debug!(
                        "keeping {} vertices at depth {} as one cluster: {}",
                        vertices.len(),
                        depth,
                        err
                    );
                    assignment.push_leaf(&vertices, depth, LeafReason::Unsplittable(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::eigen::LobpcgSolver;
    use crate::error::SpectralError;

    fn strip_faces(n: usize) -> Vec<[usize; 3]> {
        (0..n - 2).map(|i| [i, i + 1, i + 2]).collect()
    }

    fn solver() -> LobpcgSolver {
        LobpcgSolver::default().with_tolerance(1e-8)
    }

    fn run(
        faces: &[[usize; 3]],
        n: usize,
        max_depth: usize,
        max_cluster_size: usize,
    ) -> ClusterAssignment {
        let mut graph = GraphBuilder::new(faces, n);
        let mut assignment = ClusterAssignment::new(n);
        let partitioner = RecursivePartitioner::new(solver(), max_depth, max_cluster_size);
        partitioner.partition(&mut graph, (0..n).collect(), &mut assignment);
        assignment
    }

    #[test]
    fn test_quad_is_single_cluster() {
        let faces = vec![[0, 1, 2], [0, 2, 3]];
        let assignment = run(&faces, 4, 10, 4);

        assert_eq!(assignment.num_clusters(), 1);
        assert_eq!(assignment.cluster_ids(), &[0, 0, 0, 0]);
        assert_eq!(assignment.leaves()[0].reason, LeafReason::SizeLimit);
    }

    #[test]
    fn test_strip_respects_limits() {
        let n = 100;
        let assignment = run(&strip_faces(n), n, 6, 10);

        assert!(assignment.is_complete());
        assert!(assignment.num_clusters() >= 10);
        for leaf in assignment.leaves() {
            assert!(!matches!(leaf.reason, LeafReason::Unsplittable(_)));
            assert!(leaf.size <= 10 || leaf.depth >= 6, "leaf {:?}", leaf);
        }
    }

    #[test]
    fn test_strip_clusters_are_contiguous() {
        let n = 64;
        let assignment = run(&strip_faces(n), n, 10, 8);

        for cluster in assignment.clusters() {
            let min = cluster[0];
            let max = *cluster.last().unwrap();
            assert_eq!(max - min + 1, cluster.len(), "cluster {:?}", cluster);
        }
    }

    #[test]
    fn test_depth_zero_keeps_everything() {
        let n = 30;
        let assignment = run(&strip_faces(n), n, 0, 4);

        assert_eq!(assignment.num_clusters(), 1);
        assert_eq!(assignment.leaves()[0].reason, LeafReason::DepthLimit);
        assert_eq!(assignment.leaves()[0].size, n);
    }

    #[test]
    fn test_disconnected_subset_becomes_one_leaf() {
        let faces = vec![[0, 1, 2], [3, 4, 5]];
        let assignment = run(&faces, 6, 10, 2);

        assert_eq!(assignment.num_clusters(), 1);
        assert!(assignment.is_complete());
        assert!(matches!(
            assignment.leaves()[0].reason,
            LeafReason::Unsplittable(SpectralError::DisconnectedSubgraph { .. })
        ));
        assert_eq!(assignment.leaves()[0].size, 6);
    }

    #[test]
    fn test_solver_failure_still_covers_vertices() {
        let n = 200;
        let faces = strip_faces(n);
        let mut graph = GraphBuilder::new(&faces, n);
        let mut assignment = ClusterAssignment::new(n);
        let failing = LobpcgSolver::default()
            .with_max_iterations(0)
            .with_dense_limit(0);
        RecursivePartitioner::new(failing, 10, 10).partition(
            &mut graph,
            (0..n).collect(),
            &mut assignment,
        );

        assert_eq!(assignment.num_clusters(), 1);
        assert!(assignment.is_complete());
        assert!(matches!(
            assignment.leaves()[0].reason,
            LeafReason::Unsplittable(SpectralError::NotConverged { iterations: 0 })
        ));
    }

    #[test]
    fn test_empty_subset_consumes_no_id() {
        let faces = vec![[0, 1, 2]];
        let mut graph = GraphBuilder::new(&faces, 3);
        let mut assignment = ClusterAssignment::new(3);
        let partitioner = RecursivePartitioner::new(solver(), 10, 1);

        partitioner.partition(&mut graph, Vec::new(), &mut assignment);
        assert_eq!(assignment.num_clusters(), 0);
        assert!(!assignment.is_complete());
    }

    #[test]
    fn test_deterministic() {
        let n = 150;
        let a = run(&strip_faces(n), n, 8, 12);
        let b = run(&strip_faces(n), n, 8, 12);
        assert_eq!(a.cluster_ids(), b.cluster_ids());
    }
}
