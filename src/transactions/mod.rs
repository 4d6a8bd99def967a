mod api;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::units::{RewardAmount, StampsNewtype};

pub use api::fetch_all;
pub use api::MockTransactionsApi;
pub use api::TransactionsApi;
pub use api::TransactionsApiHttp;
pub use api::PAGE_SIZE;

/// Reward buckets as they appear on chain: a bucket key mapping addresses to amounts. The key set
/// is chain-defined and open, so unknown keys must stay representable.
pub type RewardBreakdown = BTreeMap<String, BTreeMap<String, RewardAmount>>;

/// A successful transaction as returned by the block data service. Owned by the refresh that
/// fetched it and dropped once aggregated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub created: DateTime<Utc>,
    pub stamps: StampsNewtype,
    pub rewards: Option<RewardBreakdown>,
}

/// The reward bucket kinds we account for. Everything else the chain may invent is ignored,
/// keeping us forward compatible with new bucket keys.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RewardKind {
    Developer,
    Validator,
    Foundation,
}

impl RewardKind {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "developer_reward" => Some(RewardKind::Developer),
            // The chain renamed masternodes to validators, old records carry the old key.
            "validator_reward" | "masternode_reward" => Some(RewardKind::Validator),
            "foundation_reward" => Some(RewardKind::Foundation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_kind_from_key_test() {
        assert_eq!(
            RewardKind::from_key("developer_reward"),
            Some(RewardKind::Developer)
        );
        assert_eq!(
            RewardKind::from_key("validator_reward"),
            Some(RewardKind::Validator)
        );
        assert_eq!(
            RewardKind::from_key("masternode_reward"),
            Some(RewardKind::Validator)
        );
        assert_eq!(
            RewardKind::from_key("foundation_reward"),
            Some(RewardKind::Foundation)
        );
        assert_eq!(RewardKind::from_key("burn_reward"), None);
    }

    #[test]
    fn transaction_deserialize_test() {
        let src = r#"{
            "created": "2026-08-29T12:00:00Z",
            "stamps": 40,
            "rewards": {
                "developer_reward": { "dev_addr": "1.25" },
                "foundation_reward": { "fnd_addr": "0.05" }
            }
        }"#;
        let transaction = serde_json::from_str::<Transaction>(src).unwrap();
        assert_eq!(transaction.stamps.0, 40);
        let rewards = transaction.rewards.unwrap();
        assert_eq!(rewards["developer_reward"]["dev_addr"].0, 1.25);
        assert_eq!(rewards["foundation_reward"]["fnd_addr"].0, 0.05);
    }

    #[test]
    fn transaction_without_rewards_deserialize_test() {
        let src = r#"{ "created": "2026-08-29T12:00:00Z", "stamps": 40, "rewards": null }"#;
        let transaction = serde_json::from_str::<Transaction>(src).unwrap();
        assert!(transaction.rewards.is_none());
    }
}
