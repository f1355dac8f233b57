pub mod api;
pub mod clock;
pub mod config;
mod dto;
mod engine;
mod error;
pub mod logging;
pub mod rate_limit;
mod statistics;
mod stores;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dto::{CreateTransaction, ErrorResponse, HealthResponse, MessageResponse, StatisticsRow};
pub use engine::Engine;
pub use error::Error;
pub use statistics::{Statistics, StatisticsEngine, Total, WINDOW_SECS};
pub use stores::{Transaction, TransactionsStore};
