//! Participant selection.
//!
//! Keygen always runs across the whole directory. Signing runs across a
//! uniformly random subset of exactly `t` nodes. Selection never reorders
//! or otherwise touches the directory itself; it returns node indices.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tessera_types::wire::Party;
use tessera_types::{ClusterConfig, NodeConfig, PARTY_RANK};

use crate::{CeremonyError, Result};

/// Indices of every node, in directory order.
pub fn keygen_participants(cluster: &ClusterConfig) -> Vec<usize> {
    (0..cluster.node_count()).collect()
}

/// Select a signing quorum.
///
/// Shuffles the indices of all nodes not in `excluded` and keeps the first
/// `threshold` of them.
///
/// # Arguments
///
/// * `cluster` - The cluster directory.
/// * `excluded` - Indices of nodes that must not take part.
/// * `rng` - Source of randomness for the shuffle.
///
/// # Returns
///
/// Exactly `threshold` distinct node indices.
pub fn select_signers<R: Rng + ?Sized>(
    cluster: &ClusterConfig,
    excluded: &HashSet<usize>,
    rng: &mut R,
) -> Result<Vec<usize>> {
    let required = cluster.threshold();
    let mut candidates: Vec<usize> = (0..cluster.node_count())
        .filter(|i| !excluded.contains(i))
        .collect();
    if candidates.len() < required {
        return Err(CeremonyError::QuorumFailure {
            required,
            available: candidates.len(),
        });
    }

    let eligible = candidates.len();
    candidates.shuffle(rng);
    candidates.truncate(required);

    tracing::debug!(
        selected = candidates.len(),
        eligible,
        "selected signing quorum"
    );
    Ok(candidates)
}

/// Resolve indices to node configurations.
pub fn nodes_at(cluster: &ClusterConfig, indices: &[usize]) -> Vec<NodeConfig> {
    indices
        .iter()
        .filter_map(|&i| cluster.node(i).cloned())
        .collect()
}

/// Ceremony party list for a set of nodes.
pub fn parties(nodes: &[NodeConfig]) -> Vec<Party> {
    nodes
        .iter()
        .map(|node| Party {
            rank: PARTY_RANK,
            public_key: node.verifying_key.to_hex(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::testutil::cluster;

    #[test]
    fn test_keygen_uses_every_node() {
        let cluster = cluster(5, 3);
        assert_eq!(keygen_participants(&cluster), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_selects_exactly_threshold() {
        let cluster = cluster(5, 3);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let chosen = select_signers(&cluster, &HashSet::new(), &mut rng).expect("select");
            assert_eq!(chosen.len(), 3);
            let distinct: HashSet<_> = chosen.iter().collect();
            assert_eq!(distinct.len(), 3);
            assert!(chosen.iter().all(|&i| i < 5));
        }
    }

    #[test]
    fn test_directory_untouched() {
        let cluster = cluster(5, 3);
        let before = cluster.nodes().to_vec();
        let mut rng = StdRng::seed_from_u64(1);
        let _ = select_signers(&cluster, &HashSet::new(), &mut rng).expect("select");
        assert_eq!(cluster.nodes(), before.as_slice());
    }

    #[test]
    fn test_every_node_eventually_selected() {
        let cluster = cluster(5, 2);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.extend(select_signers(&cluster, &HashSet::new(), &mut rng).expect("select"));
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_excluded_nodes_skipped() {
        let cluster = cluster(5, 3);
        let excluded: HashSet<usize> = [0, 1].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(3);
        let mut chosen = select_signers(&cluster, &excluded, &mut rng).expect("select");
        chosen.sort_unstable();
        assert_eq!(chosen, vec![2, 3, 4]);

        let excluded: HashSet<usize> = [0, 1, 2].into_iter().collect();
        assert!(matches!(
            select_signers(&cluster, &excluded, &mut rng),
            Err(CeremonyError::QuorumFailure {
                required: 3,
                available: 2
            })
        ));
    }

    #[test]
    fn test_parties_carry_node_keys() {
        let cluster = cluster(3, 2);
        let nodes = nodes_at(&cluster, &[2, 0]);
        let parties = parties(&nodes);
        assert_eq!(parties.len(), 2);
        assert_eq!(parties[0].rank, 0);
        assert_eq!(parties[0].public_key, cluster.nodes()[2].verifying_key.to_hex());
    }
}
