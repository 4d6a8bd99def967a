use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{env::ENV_CONFIG, time_frames::TimeFrame};

use super::Transaction;

/// How many transactions we ask for per page. The block data service treats this as an upper
/// bound, a shorter page means we reached the end of the window.
pub const PAGE_SIZE: usize = 500;

/// One page of successful transactions, newest first.
#[automock]
#[async_trait]
pub trait TransactionsApi {
    async fn transactions_page(
        &self,
        created_after: DateTime<Utc>,
        created_before: Option<DateTime<Utc>>,
        page_size: usize,
    ) -> Result<Vec<Transaction>>;
}

pub struct TransactionsApiHttp {
    server_url: String,
    client: reqwest::Client,
}

impl TransactionsApiHttp {
    pub fn new() -> Self {
        Self::new_with_url(&ENV_CONFIG.graphql_url)
    }

    pub fn new_with_url(server_url: &str) -> Self {
        Self {
            server_url: server_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for TransactionsApiHttp {
    fn default() -> Self {
        Self::new()
    }
}

// Generated from the block data service GraphQL schema.
#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: TransactionsData,
}

#[derive(Debug, Deserialize)]
struct TransactionsData {
    #[serde(rename = "allTransactions")]
    all_transactions: TransactionNodes,
}

#[derive(Debug, Deserialize)]
struct TransactionNodes {
    nodes: Vec<Transaction>,
}

fn page_query(
    created_after: DateTime<Utc>,
    created_before: Option<DateTime<Utc>>,
    page_size: usize,
) -> String {
    let created_filter = match created_before {
        Some(created_before) => format!(
            r#"{{ greaterThan: "{}", lessThan: "{}" }}"#,
            created_after.to_rfc3339(),
            created_before.to_rfc3339()
        ),
        None => format!(r#"{{ greaterThan: "{}" }}"#, created_after.to_rfc3339()),
    };
    format!(
        "{{ allTransactions( filter: {{ success: {{ equalTo: true }}, created: {created_filter} }}, orderBy: CREATED_DESC, first: {page_size} ) {{ nodes {{ created stamps rewards }} }} }}"
    )
}

#[async_trait]
impl TransactionsApi for TransactionsApiHttp {
    async fn transactions_page(
        &self,
        created_after: DateTime<Utc>,
        created_before: Option<DateTime<Utc>>,
        page_size: usize,
    ) -> Result<Vec<Transaction>> {
        let query = page_query(created_after, created_before, page_size);
        let transactions = self
            .client
            .post(&self.server_url)
            .json(&json!({ "query": query }))
            .send()
            .await?
            .error_for_status()?
            .json::<GraphQlResponse>()
            .await
            .map(|body| body.data.all_transactions.nodes)?;
        Ok(transactions)
    }
}

/// Fetch every successful transaction created within the time frame's window, walking pages
/// newest to oldest. Pages are strictly sequential, each cursor comes from the previous page's
/// last record. Any page failure aborts the whole fetch, partial windows are worse than none.
pub async fn fetch_all(
    api: &impl TransactionsApi,
    time_frame: TimeFrame,
    now: DateTime<Utc>,
) -> Result<Vec<Transaction>> {
    let cutoff = now - time_frame.duration();
    let mut transactions = Vec::new();
    let mut created_before = None;

    loop {
        let page = api
            .transactions_page(cutoff, created_before, PAGE_SIZE)
            .await?;
        let page_len = page.len();
        created_before = page.last().map(|transaction| transaction.created);
        transactions.extend(page);

        // A short page is the last page. This covers the empty page too.
        if page_len < PAGE_SIZE {
            break;
        }
    }

    debug!(
        count = transactions.len(),
        %time_frame,
        "fetched transactions in window"
    );

    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use anyhow::anyhow;
    use chrono::Duration;

    use crate::units::StampsNewtype;

    use super::*;

    fn timestamp(seconds_ago: i64) -> DateTime<Utc> {
        "2026-08-29T12:00:00Z".parse::<DateTime<Utc>>().unwrap() - Duration::seconds(seconds_ago)
    }

    fn page_of(len: usize, newest_seconds_ago: i64) -> Vec<Transaction> {
        (0..len)
            .map(|i| Transaction {
                created: timestamp(newest_seconds_ago + i as i64),
                stamps: StampsNewtype(10),
                rewards: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn fetch_all_pages_until_short_page_test() {
        let mut api = MockTransactionsApi::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_mock = calls.clone();

        api.expect_transactions_page()
            .times(3)
            .returning(move |_created_after, created_before, page_size| {
                assert_eq!(page_size, PAGE_SIZE);
                let call = calls_in_mock.fetch_add(1, Ordering::SeqCst);
                match call {
                    0 => {
                        assert!(created_before.is_none());
                        Ok(page_of(PAGE_SIZE, 0))
                    }
                    1 => {
                        // Cursor is the previous page's oldest record.
                        assert_eq!(created_before, Some(timestamp(PAGE_SIZE as i64 - 1)));
                        Ok(page_of(PAGE_SIZE, PAGE_SIZE as i64))
                    }
                    _ => Ok(page_of(200, 2 * PAGE_SIZE as i64)),
                }
            });

        let transactions = fetch_all(&api, TimeFrame::Day1, timestamp(0)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(transactions.len(), 2 * PAGE_SIZE + 200);
    }

    #[tokio::test]
    async fn fetch_all_single_short_page_test() {
        let mut api = MockTransactionsApi::new();
        api.expect_transactions_page()
            .times(1)
            .returning(|_, _, _| Ok(page_of(3, 0)));

        let transactions = fetch_all(&api, TimeFrame::Day7, timestamp(0)).await.unwrap();
        assert_eq!(transactions.len(), 3);
    }

    #[tokio::test]
    async fn fetch_all_empty_window_test() {
        let mut api = MockTransactionsApi::new();
        api.expect_transactions_page()
            .times(1)
            .returning(|_, _, _| Ok(Vec::new()));

        let transactions = fetch_all(&api, TimeFrame::Day30, timestamp(0)).await.unwrap();
        assert!(transactions.is_empty());
    }

    #[tokio::test]
    async fn fetch_all_propagates_page_error_test() {
        let mut api = MockTransactionsApi::new();
        api.expect_transactions_page()
            .times(1)
            .returning(|_, _, _| Err(anyhow!("connection reset")));

        let result = fetch_all(&api, TimeFrame::Day1, timestamp(0)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn transactions_page_http_test() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(
                json!({
                    "data": {
                        "allTransactions": {
                            "nodes": [{
                                "created": "2026-08-29T11:59:00Z",
                                "stamps": 40,
                                "rewards": {
                                    "developer_reward": { "dev_addr": "1.25" }
                                }
                            }]
                        }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let api = TransactionsApiHttp::new_with_url(&server.url());
        let transactions = api
            .transactions_page(timestamp(3600), None, PAGE_SIZE)
            .await
            .unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].stamps, StampsNewtype(40));
        let rewards = transactions[0].rewards.as_ref().unwrap();
        assert_eq!(rewards["developer_reward"]["dev_addr"].0, 1.25);
    }

    #[tokio::test]
    async fn transactions_page_http_error_test() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(502)
            .create_async()
            .await;

        let api = TransactionsApiHttp::new_with_url(&server.url());
        let result = api.transactions_page(timestamp(3600), None, PAGE_SIZE).await;
        assert!(result.is_err());
    }

    #[test]
    fn page_query_includes_cursor_test() {
        let query = page_query(timestamp(3600), Some(timestamp(60)), PAGE_SIZE);
        assert!(query.contains("lessThan"));
        assert!(query.contains("success: { equalTo: true }"));
        assert!(query.contains("first: 500"));

        let query = page_query(timestamp(3600), None, PAGE_SIZE);
        assert!(!query.contains("lessThan"));
    }
}
