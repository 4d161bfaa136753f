use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrafficKind {
    Freight,
    Passenger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorCatalogEntry {
    pub code: String,
    pub name: String,
    pub traffic_kind: TrafficKind,
}

/// Static operator reference data, built once at startup and shared read-only.
#[derive(Clone, Debug, Default)]
pub struct OperatorCatalog {
    entries: HashMap<String, OperatorCatalogEntry>,
}

impl OperatorCatalog {
    pub fn new(entries: Vec<OperatorCatalogEntry>) -> Self {
        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries {
            if map.contains_key(&entry.code) {
                tracing::warn!("Duplicate operator code {} in catalog, keeping first entry", entry.code);
                continue;
            }
            map.insert(entry.code.clone(), entry);
        }
        OperatorCatalog { entries: map }
    }

    pub fn get(&self, code: &str) -> Option<&OperatorCatalogEntry> {
        self.entries.get(code)
    }

    /// Operators the catalog does not know are treated as passenger operators.
    pub fn traffic_kind(&self, code: Option<&str>) -> TrafficKind {
        code.and_then(|c| self.get(c))
            .map(|e| e.traffic_kind)
            .unwrap_or(TrafficKind::Passenger)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
