//! Fetches the chain-wide stamp cost, the conversion factor from stamps to whole XIAN. The node
//! serves it base64-wrapped through its key value query endpoint. A missing or garbled value
//! degrades to a zero rate instead of failing the refresh, conversion then collapses to zero.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use mockall::automock;
use serde::Deserialize;
use tracing::warn;

use crate::{env::ENV_CONFIG, units::StampRate};

const STAMP_COST_PATH: &str = "\"/get/stamp_cost.S:value\"";

#[automock]
#[async_trait]
pub trait StampRateApi {
    async fn stamp_rate(&self) -> StampRate;
}

pub struct StampRateApiHttp {
    server_url: String,
    client: reqwest::Client,
}

impl StampRateApiHttp {
    pub fn new() -> Self {
        Self::new_with_url(&ENV_CONFIG.node_url)
    }

    pub fn new_with_url(server_url: &str) -> Self {
        Self {
            server_url: server_url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_stamp_rate(&self) -> Result<StampRate> {
        let url = format!("{}/abci_query", self.server_url);
        let response = self
            .client
            .get(url)
            .query(&[("path", STAMP_COST_PATH)])
            .send()
            .await?
            .error_for_status()?
            .json::<AbciQueryResponse>()
            .await?;

        match response.result.response.value {
            // The node encodes an unset variable as an empty value.
            None => Ok(StampRate::NONE),
            Some(value) => decode_stamp_rate(&value),
        }
    }
}

impl Default for StampRateApiHttp {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct AbciQueryResponse {
    result: AbciQueryResult,
}

#[derive(Debug, Deserialize)]
struct AbciQueryResult {
    response: AbciQueryValue,
}

#[derive(Debug, Deserialize)]
struct AbciQueryValue {
    #[serde(default)]
    value: Option<String>,
}

/// The value arrives base64-wrapped around the ASCII digits of the rate.
fn decode_stamp_rate(value: &str) -> Result<StampRate> {
    let bytes = STANDARD
        .decode(value)
        .context("failed to base64 decode stamp cost value")?;
    let digits = String::from_utf8(bytes).context("stamp cost value is not valid UTF-8")?;
    let rate = digits
        .trim()
        .parse::<i64>()
        .map_err(|error| anyhow!("failed to parse stamp cost {digits} as i64: {error}"))?;
    Ok(StampRate(rate))
}

#[async_trait]
impl StampRateApi for StampRateApiHttp {
    async fn stamp_rate(&self) -> StampRate {
        match self.fetch_stamp_rate().await {
            Ok(stamp_rate) => stamp_rate,
            Err(error) => {
                warn!(%error, "failed to fetch stamp rate, degrading to zero rate");
                StampRate::NONE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rate_body(value: serde_json::Value) -> String {
        json!({ "result": { "response": { "value": value } } }).to_string()
    }

    #[test]
    fn decode_stamp_rate_test() {
        // "20" base64 encoded.
        assert_eq!(decode_stamp_rate("MjA=").unwrap(), StampRate(20));
    }

    #[test]
    fn decode_stamp_rate_garbage_test() {
        assert!(decode_stamp_rate("!!not-base64!!").is_err());
        // "abc" base64 encoded, decodes but does not parse as digits.
        assert!(decode_stamp_rate("YWJj").is_err());
    }

    #[tokio::test]
    async fn stamp_rate_http_test() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/abci_query")
            .match_query(mockito::Matcher::UrlEncoded(
                "path".into(),
                STAMP_COST_PATH.into(),
            ))
            .with_status(200)
            .with_body(rate_body(json!("MjA=")))
            .create_async()
            .await;

        let api = StampRateApiHttp::new_with_url(&server.url());
        assert_eq!(api.stamp_rate().await, StampRate(20));
    }

    #[tokio::test]
    async fn stamp_rate_absent_value_test() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/abci_query")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(rate_body(json!(null)))
            .create_async()
            .await;

        let api = StampRateApiHttp::new_with_url(&server.url());
        assert_eq!(api.stamp_rate().await, StampRate::NONE);
    }

    #[tokio::test]
    async fn stamp_rate_unparsable_value_test() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/abci_query")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(rate_body(json!("YWJj")))
            .create_async()
            .await;

        let api = StampRateApiHttp::new_with_url(&server.url());
        assert_eq!(api.stamp_rate().await, StampRate::NONE);
    }

    #[tokio::test]
    async fn stamp_rate_transport_failure_degrades_test() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/abci_query")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let api = StampRateApiHttp::new_with_url(&server.url());
        assert_eq!(api.stamp_rate().await, StampRate::NONE);
    }
}
