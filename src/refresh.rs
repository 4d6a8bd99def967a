//! Drives one refresh cycle: fetch the stamp rate and the window's transactions concurrently,
//! then crunch them into burn stats. The `Refresher` replaces the dashboard's old global
//! in-flight and selection flags with an explicit context object. At most one cycle runs at a
//! time, a request arriving while one is active is dropped, not queued. A generation counter
//! makes sure a cycle that was invalidated mid-flight never gets its result applied.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::Result;
use chrono::Utc;
use futures::join;
use tracing::debug;

use crate::{
    aggregate::{aggregate, AggregateEnvelope},
    performance::TimedExt,
    stamp_rate::StampRateApi,
    time_frames::TimeFrame,
    transactions::{fetch_all, TransactionsApi},
};

#[derive(Debug)]
pub enum RefreshOutcome {
    Completed(AggregateEnvelope),
    /// Another cycle was active, this request was dropped.
    AlreadyInFlight,
    /// The cycle finished but was invalidated while its fetches were in flight. Its result must
    /// not overwrite newer data.
    Superseded,
}

#[derive(Debug, Default)]
pub struct Refresher {
    generation: AtomicU64,
    in_flight: AtomicBool,
}

impl Refresher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark any in-flight cycle stale. Called when the selected time frame changes under a
    /// running refresh.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn refresh(
        &self,
        rate_api: &(impl StampRateApi + Sync),
        transactions_api: &(impl TransactionsApi + Sync),
        time_frame: TimeFrame,
    ) -> Result<RefreshOutcome> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!(%time_frame, "refresh already in flight, dropping request");
            return Ok(RefreshOutcome::AlreadyInFlight);
        }

        let outcome = self.run(rate_api, transactions_api, time_frame).await;
        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    async fn run(
        &self,
        rate_api: &(impl StampRateApi + Sync),
        transactions_api: &(impl TransactionsApi + Sync),
        time_frame: TimeFrame,
    ) -> Result<RefreshOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();

        // The two fetches are independent. Pages inside fetch_all stay sequential.
        let (stamp_rate, transactions) = join!(
            rate_api.stamp_rate(),
            fetch_all(transactions_api, time_frame, now).timed("fetch_all_transactions"),
        );
        let transactions = transactions?;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(%time_frame, "refresh superseded mid-flight, dropping result");
            return Ok(RefreshOutcome::Superseded);
        }

        let burn_stats = aggregate(&transactions, stamp_rate, time_frame, now);

        Ok(RefreshOutcome::Completed(AggregateEnvelope {
            time_frame,
            burn_stats,
            timestamp: now,
        }))
    }
}
