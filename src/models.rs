use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One `(count, key)` bucket from a grouped query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRow {
    pub count: i64,
    pub key: String,
}

impl MetricRow {
    pub fn new(count: i64, key: impl Into<String>) -> Self {
        Self {
            count,
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct OpCounts {
    pub add: i64,
    pub remove: i64,
}

/// Merged per-key add/remove totals. `remove` is stored as a positive count.
pub type MetricSeries = BTreeMap<String, OpCounts>;

/// Parallel arrays ready for a chart. `remove` is negated, `total` is the net.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ChartSeries {
    pub keys: Vec<String>,
    pub add: Vec<i64>,
    pub remove: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Vec<i64>>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn map_keys(mut self, f: impl Fn(&str) -> String) -> Self {
        self.keys = self.keys.iter().map(|key| f(key)).collect();
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct OperationTotals {
    pub add: i64,
    pub remove: i64,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub repo: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub repo: String,
}

#[derive(Debug, Serialize)]
pub struct SamplesResponse {
    pub repo: String,
    pub files: Vec<String>,
}

/// Body returned by `POST /v1/sql`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SqlResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub output: Vec<SqlOutput>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SqlOutput {
    #[serde(default)]
    pub records: Option<SqlRecords>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SqlRecords {
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl SqlResponse {
    /// Rows of the `index`-th statement; empty when the statement produced none.
    pub fn rows(&self, index: usize) -> &[Vec<Value>] {
        self.output
            .get(index)
            .and_then(|output| output.records.as_ref())
            .map(|records| records.rows.as_slice())
            .unwrap_or(&[])
    }
}

/// Body returned by the feed server's `update_repo`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CrawlReport {
    #[serde(default)]
    pub repo_exist: bool,
    #[serde(default)]
    pub num_new_commit: u64,
    #[serde(default)]
    pub num_todo_changes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body returned by the feed server's `some_files`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SomeFilesResponse {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    OperationCount,
    OperationHistory,
    AuthorRank,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChartPayload {
    Totals(OperationTotals),
    Series(ChartSeries),
}
