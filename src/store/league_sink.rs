use std::collections::BTreeMap;
use std::sync::Mutex;
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use crate::error::{Error, Result};
use crate::types::{LeagueSnapshot, LeagueTableEntry, OperatorRecord};

pub const OPERATOR_KEY_PREFIX: &str = "operator:";
pub const LEAGUE_TABLE_KEY: &str = "leagueTable";

pub fn operator_key(name: &str) -> String {
    format!("{}{}", OPERATOR_KEY_PREFIX, name)
}

/// Key/value plus sorted-set store behind the operators league table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeagueSink: Send + Sync {
    /// `SET operator:<name>` to the JSON record.
    async fn put_operator(&self, record: &OperatorRecord) -> Result<()>;

    /// `ZADD leagueTable <score> <name>`.
    async fn add_to_league(&self, name: &str, score: f64) -> Result<()>;

    /// Every stored operator record.
    async fn operators(&self) -> Result<Vec<OperatorRecord>>;

    /// League table, highest score first.
    async fn league_table(&self) -> Result<Vec<LeagueTableEntry>>;
}

/// Store the record, then rank it.
pub async fn record_operator(sink: &dyn LeagueSink, record: &OperatorRecord) -> Result<()> {
    sink.put_operator(record).await?;
    sink.add_to_league(&record.name, record.percentage as f64).await
}

/// Read back the full league view.
pub async fn load_league(sink: &dyn LeagueSink) -> Result<LeagueSnapshot> {
    let current_data = sink
        .operators()
        .await?
        .into_iter()
        .map(|record| (record.name.clone(), record))
        .collect();

    Ok(LeagueSnapshot {
        current_data,
        league_table: sink.league_table().await?,
    })
}

pub struct RedisLeagueSink {
    conn: ConnectionManager,
}

impl RedisLeagueSink {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!("Connected to league table store at {}", url);
        Ok(RedisLeagueSink { conn })
    }
}

#[async_trait]
impl LeagueSink for RedisLeagueSink {
    async fn put_operator(&self, record: &OperatorRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        let mut conn = self.conn.clone();
        let _: () = conn.set(operator_key(&record.name), json).await?;
        Ok(())
    }

    async fn add_to_league(&self, name: &str, score: f64) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.zadd(LEAGUE_TABLE_KEY, name, score).await?;
        Ok(())
    }

    async fn operators(&self) -> Result<Vec<OperatorRecord>> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(format!("{}*", OPERATOR_KEY_PREFIX)).await?;

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            let json: Option<String> = match conn.get(&key).await {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", key, e);
                    continue;
                }
            };
            let Some(json) = json else { continue };

            match serde_json::from_str::<OperatorRecord>(&json) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Discarding malformed record at {}: {}", key, e),
            }
        }
        Ok(records)
    }

    async fn league_table(&self) -> Result<Vec<LeagueTableEntry>> {
        let mut conn = self.conn.clone();
        let ranked: Vec<(String, f64)> = conn.zrevrange_withscores(LEAGUE_TABLE_KEY, 0, -1).await?;

        Ok(ranked
            .into_iter()
            .map(|(name, percentage)| LeagueTableEntry { name, percentage })
            .collect())
    }
}

/// Process-local stand-in used when no Redis URL is configured.
#[derive(Default)]
pub struct InMemoryLeagueSink {
    records: Mutex<BTreeMap<String, String>>,
    scores: Mutex<BTreeMap<String, f64>>,
}

impl InMemoryLeagueSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeagueSink for InMemoryLeagueSink {
    async fn put_operator(&self, record: &OperatorRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.records
            .lock()
            .map_err(|_| Error::Persistence("record store poisoned".to_string()))?
            .insert(operator_key(&record.name), json);
        Ok(())
    }

    async fn add_to_league(&self, name: &str, score: f64) -> Result<()> {
        self.scores
            .lock()
            .map_err(|_| Error::Persistence("league store poisoned".to_string()))?
            .insert(name.to_string(), score);
        Ok(())
    }

    async fn operators(&self) -> Result<Vec<OperatorRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|_| Error::Persistence("record store poisoned".to_string()))?;

        records
            .values()
            .map(|json| serde_json::from_str(json).map_err(Error::from))
            .collect()
    }

    async fn league_table(&self) -> Result<Vec<LeagueTableEntry>> {
        let scores = self
            .scores
            .lock()
            .map_err(|_| Error::Persistence("league store poisoned".to_string()))?;

        // Same order as ZREVRANGE: score descending, then member descending.
        let mut ranked: Vec<LeagueTableEntry> = scores
            .iter()
            .map(|(name, score)| LeagueTableEntry {
                name: name.clone(),
                percentage: *score,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.percentage
                .total_cmp(&a.percentage)
                .then_with(|| b.name.cmp(&a.name))
        });
        Ok(ranked)
    }
}
