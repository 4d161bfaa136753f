pub mod aggregator;
pub mod domains;
pub mod parser;
pub mod ranking;

pub use aggregator::DomainAggregator;
pub use domains::{DomainFold, LeagueFold, NationalFold, NetworkFold};
