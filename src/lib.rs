mod aggregate;
mod env;
mod health;
mod log;
mod performance;
mod refresh;
mod serve;
mod stamp_rate;
mod time_frames;
mod transactions;
mod units;

pub use aggregate::aggregate;
pub use aggregate::AggregateEnvelope;
pub use aggregate::AggregateResult;
pub use aggregate::FeeTotals;
pub use refresh::RefreshOutcome;
pub use refresh::Refresher;
pub use serve::start_server;
pub use stamp_rate::MockStampRateApi;
pub use stamp_rate::StampRateApi;
pub use stamp_rate::StampRateApiHttp;
pub use time_frames::TimeFrame;
pub use transactions::fetch_all;
pub use transactions::MockTransactionsApi;
pub use transactions::RewardKind;
pub use transactions::Transaction;
pub use transactions::TransactionsApi;
pub use transactions::TransactionsApiHttp;
pub use units::RewardAmount;
pub use units::StampRate;
pub use units::StampsNewtype;
pub use units::XianNewtype;
