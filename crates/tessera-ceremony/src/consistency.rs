//! Aggregation of per-node ceremony outputs.
//!
//! Every participant of a ceremony reports the same logical result (the
//! group public key, or the combined signature). The policy decides what
//! happens when they do not.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::{CeremonyError, Result};

/// How to reduce the outputs of all participants to one value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyPolicy {
    /// All outputs must be identical.
    #[default]
    Strict,
    /// Return one output chosen uniformly at random, without comparing.
    PickRandom,
}

impl FromStr for ConsistencyPolicy {
    type Err = CeremonyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "strict" => Ok(ConsistencyPolicy::Strict),
            "pick_random" => Ok(ConsistencyPolicy::PickRandom),
            other => Err(CeremonyError::Configuration(format!(
                "unknown consistency policy: {other}"
            ))),
        }
    }
}

impl fmt::Display for ConsistencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyPolicy::Strict => f.write_str("strict"),
            ConsistencyPolicy::PickRandom => f.write_str("pick_random"),
        }
    }
}

/// Outputs are hex; case and a `0x` prefix are not significant.
fn canonical(value: &str) -> String {
    let trimmed = value.trim();
    trimmed
        .strip_prefix("0x")
        .unwrap_or(trimmed)
        .to_ascii_lowercase()
}

impl ConsistencyPolicy {
    /// Reduce `outputs` to a single value.
    ///
    /// `kind` names the output in errors ("public key", "signature").
    pub fn aggregate(self, kind: &'static str, outputs: Vec<String>) -> Result<String> {
        if outputs.is_empty() {
            return Err(CeremonyError::QuorumFailure {
                required: 1,
                available: 0,
            });
        }
        match self {
            ConsistencyPolicy::Strict => {
                let distinct: BTreeSet<String> = outputs.iter().map(|o| canonical(o)).collect();
                if distinct.len() != 1 {
                    return Err(CeremonyError::DivergentOutput {
                        kind,
                        distinct: distinct.len(),
                    });
                }
                outputs
                    .into_iter()
                    .next()
                    .ok_or(CeremonyError::QuorumFailure {
                        required: 1,
                        available: 0,
                    })
            }
            ConsistencyPolicy::PickRandom => outputs
                .choose(&mut rand::thread_rng())
                .cloned()
                .ok_or(CeremonyError::QuorumFailure {
                    required: 1,
                    available: 0,
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_strict_accepts_identical() {
        let out = ConsistencyPolicy::Strict
            .aggregate("public key", outputs(&["ab", "0xAB", "ab"]))
            .expect("agree");
        assert_eq!(out, "ab");
    }

    #[test]
    fn test_strict_rejects_divergent() {
        let err = ConsistencyPolicy::Strict
            .aggregate("signature", outputs(&["aa", "bb", "aa"]))
            .expect_err("diverge");
        assert!(matches!(
            err,
            CeremonyError::DivergentOutput {
                kind: "signature",
                distinct: 2
            }
        ));
    }

    #[test]
    fn test_pick_random_returns_a_member() {
        let values = outputs(&["aa", "bb", "cc"]);
        for _ in 0..20 {
            let out = ConsistencyPolicy::PickRandom
                .aggregate("signature", values.clone())
                .expect("pick");
            assert!(values.contains(&out));
        }
    }

    #[test]
    fn test_empty_outputs() {
        assert!(ConsistencyPolicy::Strict.aggregate("x", Vec::new()).is_err());
        assert!(ConsistencyPolicy::PickRandom.aggregate("x", Vec::new()).is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "strict".parse::<ConsistencyPolicy>().expect("strict"),
            ConsistencyPolicy::Strict
        );
        assert_eq!(
            " Pick-Random ".parse::<ConsistencyPolicy>().expect("pick random"),
            ConsistencyPolicy::PickRandom
        );
        let err = "majority"
            .parse::<ConsistencyPolicy>()
            .expect_err("unknown policy");
        assert!(matches!(err, CeremonyError::Configuration(_)));
        assert!(err.to_string().contains("majority"));
    }
}
