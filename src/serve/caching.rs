use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::Duration,
};

use axum::{
    extract::Query,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Duration as ChronoDuration;
use enum_iterator::all;
use lazy_static::lazy_static;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::{
    aggregate::AggregateEnvelope,
    refresh::{RefreshOutcome, Refresher},
    stamp_rate::StampRateApi,
    time_frames::TimeFrame,
    transactions::TransactionsApi,
};

use super::{State, StateExtension};

/// The dashboard's refresh cadence.
const REFRESH_INTERVAL: Duration = Duration::from_secs(10);

lazy_static! {
    static ref SIX_SECONDS: ChronoDuration = ChronoDuration::seconds(6);
    static ref TWO_MINUTES: ChronoDuration = ChronoDuration::seconds(120);
}

/// The last successfully crunched stats per time frame. Memory only, nothing survives a restart,
/// the first refresh cycle repopulates it.
#[derive(Debug, Default)]
pub struct Cache(RwLock<HashMap<TimeFrame, Value>>);

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, time_frame: TimeFrame, envelope: &AggregateEnvelope) {
        let value = serde_json::to_value(envelope)
            .expect("aggregate envelopes always serialize to JSON");
        self.0.write().unwrap().insert(time_frame, value);
    }

    fn get(&self, time_frame: TimeFrame) -> Option<Value> {
        self.0.read().unwrap().get(&time_frame).cloned()
    }
}

pub async fn cached_get(state: StateExtension, time_frame: TimeFrame) -> impl IntoResponse {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_str(&format!(
            "public, max-age={}, stale-while-revalidate={}",
            SIX_SECONDS.num_seconds(),
            TWO_MINUTES.num_seconds()
        ))
        .unwrap(),
    );

    match state.cache.get(time_frame) {
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        Some(cached_value) => (headers, Json(cached_value).into_response()).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct BurnStatsParams {
    time_frame: Option<String>,
}

pub async fn burn_stats_handler(
    state: StateExtension,
    Query(params): Query<BurnStatsParams>,
) -> impl IntoResponse {
    let time_frame = params.time_frame.as_deref().unwrap_or("day");
    match time_frame.parse::<TimeFrame>() {
        Ok(time_frame) => cached_get(state, time_frame).await.into_response(),
        Err(error) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": error.to_string() })),
        )
            .into_response(),
    }
}

/// Spins forever, refreshing every time frame's stats on the dashboard cadence. A failed refresh
/// keeps the previous cache entry in place, the next tick is the retry.
pub fn update_cache_periodically(
    state: Arc<State>,
    rate_api: impl StampRateApi + Send + Sync + 'static,
    transactions_api: impl TransactionsApi + Send + Sync + 'static,
    refresher: Refresher,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REFRESH_INTERVAL);
        loop {
            interval.tick().await;
            for time_frame in all::<TimeFrame>() {
                match refresher
                    .refresh(&rate_api, &transactions_api, time_frame)
                    .await
                {
                    Ok(RefreshOutcome::Completed(envelope)) => {
                        state.cache.insert(time_frame, &envelope);
                        state.health.set_cache_updated();
                        debug!(%time_frame, "cache update");
                    }
                    Ok(RefreshOutcome::AlreadyInFlight) => {
                        warn!(%time_frame, "refresh already in flight, request dropped");
                    }
                    Ok(RefreshOutcome::Superseded) => {
                        debug!(%time_frame, "refresh superseded, result dropped");
                    }
                    Err(error) => {
                        error!(%time_frame, %error, "refresh failed, serving last good stats");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::{
        aggregate::{aggregate, AggregateEnvelope},
        units::StampRate,
    };

    use super::*;

    fn envelope(time_frame: TimeFrame) -> AggregateEnvelope {
        let now = Utc::now();
        AggregateEnvelope {
            time_frame,
            burn_stats: aggregate(&[], StampRate(20), time_frame, now),
            timestamp: now,
        }
    }

    #[test]
    fn cache_insert_get_test() {
        let cache = Cache::new();
        assert!(cache.get(TimeFrame::Day1).is_none());

        cache.insert(TimeFrame::Day1, &envelope(TimeFrame::Day1));

        let value = cache.get(TimeFrame::Day1).unwrap();
        assert_eq!(value["time_frame"], "day");
        assert!(cache.get(TimeFrame::Day7).is_none());
    }

    #[test]
    fn cache_overwrite_test() {
        let cache = Cache::new();
        cache.insert(TimeFrame::Day7, &envelope(TimeFrame::Day7));
        let first = cache.get(TimeFrame::Day7).unwrap();

        cache.insert(TimeFrame::Day7, &envelope(TimeFrame::Day7));
        let second = cache.get(TimeFrame::Day7).unwrap();

        assert_ne!(
            first["timestamp"], Value::Null,
            "envelope timestamp must serialize"
        );
        assert_eq!(first["time_frame"], second["time_frame"]);
    }
}
