//! Query handler — maps a generic `(name, type)` DNS question onto the
//! directory and returns typed answers with TTLs.
//!
//! Absence is a normal outcome: unknown names produce an empty answer
//! list, never an error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use meshdns_registry::MeshDnsError;

use crate::directory::ServiceDirectory;
use crate::records::{RecordData, RecordType};

/// Question type. `Any` asks for all three record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    Address,
    Locator,
    Text,
    Any,
}

impl QueryType {
    fn matches(&self, record_type: RecordType) -> bool {
        match self {
            QueryType::Address => record_type == RecordType::Address,
            QueryType::Locator => record_type == RecordType::Locator,
            QueryType::Text => record_type == RecordType::Text,
            QueryType::Any => true,
        }
    }
}

impl FromStr for QueryType {
    type Err = MeshDnsError;

    /// Accepts both the directory names and the classic DNS mnemonics.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" | "ADDRESS" => Ok(QueryType::Address),
            "SRV" | "LOCATOR" => Ok(QueryType::Locator),
            "TXT" | "TEXT" => Ok(QueryType::Text),
            "ANY" | "*" => Ok(QueryType::Any),
            _ => Err(MeshDnsError::Validation(format!("unknown query type '{s}'"))),
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryType::Address => "ADDRESS",
            QueryType::Locator => "LOCATOR",
            QueryType::Text => "TEXT",
            QueryType::Any => "ANY",
        };
        f.write_str(s)
    }
}

/// One answer of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub name: String,
    pub record_type: RecordType,
    pub ttl: u32,
    pub data: RecordData,
}

#[derive(Clone)]
pub struct QueryHandler {
    directory: ServiceDirectory,
}

impl QueryHandler {
    pub fn new(directory: ServiceDirectory) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &ServiceDirectory {
        &self.directory
    }

    /// Answer a question. For `Any`, answers are grouped ADDRESS, then
    /// LOCATOR, then TEXT.
    pub fn handle_query(&self, name: &str, query_type: QueryType) -> Vec<Answer> {
        let records = self.directory.lookup(name);
        let mut answers: Vec<Answer> = records
            .into_iter()
            .filter(|r| query_type.matches(r.record_type()))
            .map(|r| Answer {
                record_type: r.record_type(),
                name: r.name,
                ttl: r.ttl_secs,
                data: r.data,
            })
            .collect();

        if query_type == QueryType::Any {
            answers.sort_by_key(|a| type_rank(a.record_type));
        }
        answers
    }
}

fn type_rank(record_type: RecordType) -> u8 {
    match record_type {
        RecordType::Address => 0,
        RecordType::Locator => 1,
        RecordType::Text => 2,
    }
}
