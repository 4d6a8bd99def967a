//! # Burn Stats
//! The crunch at the center of the pipeline. Takes one window's worth of transactions plus the
//! stamp rate and produces the burned-vs-distributed totals, per-address reward maps, and the
//! bucketed burn-over-time series. Recomputed from scratch on every refresh, no state carries
//! over between refreshes.

use std::collections::HashMap;

use chrono::{DateTime, DurationRound, Utc};
use serde::Serialize;

use crate::{
    time_frames::TimeFrame,
    transactions::{RewardKind, Transaction},
    units::{StampRate, XianNewtype},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct FeeTotals {
    pub dev: XianNewtype,
    pub val: XianNewtype,
    pub fnd: XianNewtype,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct AggregateResult {
    pub burn_total: XianNewtype,
    pub fee_totals: FeeTotals,
    pub avg_fee: XianNewtype,
    /// Burn per time bucket, oldest to newest. Always `bucket_count` entries.
    pub bucketed_burn: Vec<XianNewtype>,
    pub dev_rewards_by_address: HashMap<String, f64>,
    pub val_rewards_by_address: HashMap<String, f64>,
    pub top_developer: Option<String>,
    /// Upper edge of the newest bucket.
    pub anchor: DateTime<Utc>,
}

/// What the presentation layer receives: the stats plus the time frame echoed back for labeling.
#[derive(Debug, PartialEq, Serialize)]
pub struct AggregateEnvelope {
    pub time_frame: TimeFrame,
    pub burn_stats: AggregateResult,
    pub timestamp: DateTime<Utc>,
}

/// The newest bucket's upper edge: now truncated to the start of the current bucket unit, in UTC.
fn bucket_anchor(now: DateTime<Utc>, time_frame: TimeFrame) -> DateTime<Utc> {
    now.duration_trunc(time_frame.bucket_unit())
        .expect("bucket units are well within duration_trunc limits")
}

pub fn aggregate(
    transactions: &[Transaction],
    stamp_rate: StampRate,
    time_frame: TimeFrame,
    now: DateTime<Utc>,
) -> AggregateResult {
    let anchor = bucket_anchor(now, time_frame);
    let bucket_count = time_frame.bucket_count();
    let unit_ms = time_frame.bucket_unit().num_milliseconds();

    let mut burn_total = XianNewtype(0.0);
    let mut fee_totals = FeeTotals::default();
    let mut fee_sum = XianNewtype(0.0);
    let mut bucketed_burn = vec![XianNewtype(0.0); bucket_count];
    let mut dev_rewards_by_address: HashMap<String, f64> = HashMap::new();
    let mut val_rewards_by_address: HashMap<String, f64> = HashMap::new();
    let mut top_developer: Option<(String, f64)> = None;

    for transaction in transactions {
        // Reward-less transactions contribute nothing, not even burn. They still count toward the
        // average fee denominator below.
        let rewards = match &transaction.rewards {
            Some(rewards) => rewards,
            None => continue,
        };

        let used = transaction.stamps.to_xian(stamp_rate);

        let mut reward_dev = 0.0;
        let mut reward_val = 0.0;
        let mut reward_fnd = 0.0;

        for (key, by_address) in rewards {
            match RewardKind::from_key(key) {
                Some(RewardKind::Developer) => {
                    for (address, amount) in by_address {
                        reward_dev += amount.0;
                        let total = dev_rewards_by_address
                            .entry(address.clone())
                            .or_insert(0.0);
                        *total += amount.0;
                        // Strictly greater, so the first address to reach an amount keeps the top
                        // spot over later ties.
                        match &top_developer {
                            Some((_, top_amount)) if *total <= *top_amount => {}
                            _ => top_developer = Some((address.clone(), *total)),
                        }
                    }
                }
                Some(RewardKind::Validator) => {
                    for (address, amount) in by_address {
                        reward_val += amount.0;
                        *val_rewards_by_address.entry(address.clone()).or_insert(0.0) += amount.0;
                    }
                }
                Some(RewardKind::Foundation) => {
                    // Subtotal only, no per-address detail retained.
                    reward_fnd += by_address.values().map(|amount| amount.0).sum::<f64>();
                }
                // Chain-defined bucket we don't account for.
                None => {}
            }
        }

        // Whatever the fee did not distribute was burned. Inconsistent reward data can push this
        // negative, which is a real signal and must not be clamped.
        let burned = used - XianNewtype(reward_dev + reward_val + reward_fnd);

        burn_total += burned;
        fee_totals.dev += XianNewtype(reward_dev);
        fee_totals.val += XianNewtype(reward_val);
        fee_totals.fnd += XianNewtype(reward_fnd);
        fee_sum += used;

        // Floor division keeps transactions created between the anchor and now out of range, same
        // as transactions older than the window.
        let age_ms = (anchor - transaction.created).num_milliseconds();
        let buckets_from_newest = age_ms.div_euclid(unit_ms);
        let index = bucket_count as i64 - 1 - buckets_from_newest;
        if (0..bucket_count as i64).contains(&index) {
            bucketed_burn[index as usize] += burned;
        }
    }

    let avg_fee = XianNewtype(fee_sum.0 / transactions.len().max(1) as f64);

    AggregateResult {
        burn_total,
        fee_totals,
        avg_fee,
        bucketed_burn,
        dev_rewards_by_address,
        val_rewards_by_address,
        top_developer: top_developer.map(|(address, _)| address),
        anchor,
    }
}
