//! Core types for Factcast

use serde::{Deserialize, Serialize};

/// Format of the timestamp key a fact is stored under (UTC)
pub const KEY_FORMAT: &str = "%d/%m/%y %H:%M:%S";

/// A stored fact with its bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub key: String,
    pub body: String,
    pub created_at: i64,
    pub status: FactStatus,
}

/// How far the daily routine got with a fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactStatus {
    /// Appended to the store, not yet posted
    Stored,
    /// Posted, chat notification not yet sent
    Published,
    Notified,
}

impl FactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactStatus::Stored => "stored",
            FactStatus::Published => "published",
            FactStatus::Notified => "notified",
        }
    }

    /// Unknown values read back from the store are treated as `Stored`
    pub fn from_db(value: &str) -> Self {
        match value {
            "published" => FactStatus::Published,
            "notified" => FactStatus::Notified,
            _ => FactStatus::Stored,
        }
    }
}

impl std::fmt::Display for FactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
