pub mod league_sink;
pub mod snapshot_store;

pub use league_sink::{InMemoryLeagueSink, LeagueSink, RedisLeagueSink};
pub use snapshot_store::{snapshot_store, SnapshotPublisher, SnapshotReader};
