pub mod feed;
pub mod league;
pub mod metrics;
pub mod percentage;

pub use feed::{FeedMessage, RawPerformanceRecord};
pub use league::{LeagueSnapshot, LeagueTableEntry, OperatorRecord};
pub use metrics::{AggregateSnapshot, OperatorPerformance, PerformanceMetrics};
pub use percentage::Percentage;
