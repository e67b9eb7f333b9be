//! SQL queries against the analytics database and the chart fetchers built
//! on top of them.

use crate::errors::{QueryError, QueryResult};
use crate::models::{ChartSeries, OperationTotals, SqlResponse};
use crate::repo::RepoRef;
use crate::series::{self, RowLayout, SortMode, TimestampFormat};
use reqwest::Client;
use tracing::debug;

pub const OPERATION_COUNT_SQL: &str = "
SELECT operation, count(*) as count from records where repo_name = 'REPO_NAME' group by operation order by operation;
";

pub const OPERATION_HISTORY_SQL: &str = "
select count(*) as add_count, commit_time
from records
where repo_name = 'REPO_NAME' and operation = 'add'
group by commit_time
order by commit_time;
select count(*) as remove_count, commit_time
from records
where repo_name = 'REPO_NAME' and operation = 'remove'
group by commit_time
order by commit_time;
";

pub const AUTHOR_RANK_SQL: &str = "
select count(*) as add_count, author_name
from records
where repo_name = 'REPO_NAME' and operation = 'add'
group by author_name
order by add_count desc;
select count(*) as remove_count, author_name
from records
where repo_name = 'REPO_NAME' and operation = 'remove'
group by author_name
order by remove_count desc;
";

/// Substitutes the repository's table key into a template as a quoted literal.
pub fn render_sql(template: &str, repo: &RepoRef) -> String {
    template.replace("REPO_NAME", &repo.table_key().replace('\'', "''"))
}

#[derive(Debug, Clone)]
pub struct AnalyticsClient {
    http: Client,
    endpoint: String,
    database: String,
}

impl AnalyticsClient {
    pub fn new(http: Client, base_url: &str, database: &str) -> Self {
        Self {
            http,
            endpoint: format!("{base_url}/v1/sql"),
            database: database.to_string(),
        }
    }

    pub async fn query(&self, sql: &str) -> QueryResult<SqlResponse> {
        debug!("running query against {}", self.endpoint);
        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("db", self.database.as_str())])
            .form(&[("sql", sql)])
            .send()
            .await
            .map_err(|source| QueryError::Transport {
                url: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let body: Option<SqlResponse> = response.json().await.ok();
        check_response(&self.endpoint, status, body)
    }

    pub async fn operation_count(&self, repo: &RepoRef) -> QueryResult<OperationTotals> {
        let response = self.query(&render_sql(OPERATION_COUNT_SQL, repo)).await?;
        Ok(operation_totals(&response))
    }

    pub async fn operation_history(
        &self,
        repo: &RepoRef,
        format: &TimestampFormat,
    ) -> QueryResult<ChartSeries> {
        let response = self.query(&render_sql(OPERATION_HISTORY_SQL, repo)).await?;
        Ok(history_series(&response, format))
    }

    pub async fn author_rank(&self, repo: &RepoRef) -> QueryResult<ChartSeries> {
        let response = self.query(&render_sql(AUTHOR_RANK_SQL, repo)).await?;
        Ok(rank_series(&response))
    }
}

/// Database errors are reported in the body, sometimes with a 4xx/5xx status
/// and sometimes with 200, so the body wins when it can be read.
fn check_response(
    url: &str,
    status: reqwest::StatusCode,
    body: Option<SqlResponse>,
) -> QueryResult<SqlResponse> {
    match body {
        Some(body) if body.code != 0 || body.error.is_some() => Err(QueryError::Database {
            code: body.code,
            message: body.error.unwrap_or_default(),
        }),
        Some(body) if status.is_success() => Ok(body),
        _ if !status.is_success() => Err(QueryError::Status {
            url: url.to_string(),
            status,
        }),
        _ => Err(QueryError::Malformed {
            url: url.to_string(),
        }),
    }
}

pub fn operation_totals(response: &SqlResponse) -> OperationTotals {
    let rows = series::metric_rows(response.rows(0), RowLayout::KEY_THEN_COUNT);
    let mut totals = OperationTotals::default();
    for row in rows {
        match row.key.as_str() {
            "add" => totals.add = totals.add.saturating_add(row.count),
            "remove" => totals.remove = totals.remove.saturating_add(row.count),
            other => debug!("ignoring unknown operation {other:?}"),
        }
    }
    totals.total = totals.add.saturating_sub(totals.remove);
    totals
}

pub fn history_series(response: &SqlResponse, format: &TimestampFormat) -> ChartSeries {
    series::to_series(&paired_series(response), SortMode::Time).map_keys(|key| format.format(key))
}

pub fn rank_series(response: &SqlResponse) -> ChartSeries {
    series::to_series(&paired_series(response), SortMode::Rank)
}

fn paired_series(response: &SqlResponse) -> crate::models::MetricSeries {
    let add = series::metric_rows(response.rows(0), RowLayout::COUNT_THEN_KEY);
    let remove = series::metric_rows(response.rows(1), RowLayout::COUNT_THEN_KEY);
    series::aggregate(&add, &remove)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    fn response(value: serde_json::Value) -> SqlResponse {
        serde_json::from_value(value).unwrap()
    }

    fn repo() -> RepoRef {
        RepoRef::parse("greptimeteam/greptimedb").unwrap()
    }

    #[test]
    fn sql_templates_only_swap_repo_name() {
        let sql = render_sql(AUTHOR_RANK_SQL, &repo());
        assert!(!sql.contains("REPO_NAME"));
        assert_eq!(sql.matches("repo_name = 'greptimeteam-greptimedb'").count(), 2);
        assert_eq!(sql.matches(';').count(), 2);
    }

    #[test]
    fn sql_quotes_are_escaped() {
        let repo = RepoRef::parse("o'brien/repo").unwrap();
        let sql = render_sql(OPERATION_COUNT_SQL, &repo);
        assert!(sql.contains("repo_name = 'o''brien-repo'"));
    }

    #[test]
    fn rank_series_reads_both_statements() {
        let body = response(json!({
            "code": 0,
            "output": [
                { "records": { "rows": [["3", "alice"], ["1", "bob"]] } },
                { "records": { "rows": [["1", "alice"]] } }
            ]
        }));
        let chart = rank_series(&body);
        assert_eq!(chart.keys, vec!["bob", "alice"]);
        assert_eq!(chart.remove, vec![0, -1]);
        assert_eq!(chart.total, Some(vec![1, 2]));
    }

    #[test]
    fn missing_second_statement_degrades_to_adds_only() {
        let body = response(json!({
            "output": [ { "records": { "rows": [[2, "1700000000"]] } } ]
        }));
        let chart = history_series(&body, &TimestampFormat::default());
        assert_eq!(chart.keys, vec!["2023-11-14 22:13:20"]);
        assert_eq!(chart.add, vec![2]);
        assert_eq!(chart.remove, vec![0]);
    }

    #[test]
    fn empty_output_gives_empty_charts() {
        let body = response(json!({ "output": [] }));
        assert!(rank_series(&body).is_empty());
        assert!(history_series(&body, &TimestampFormat::default()).is_empty());
        assert_eq!(operation_totals(&body), OperationTotals::default());
    }

    #[test]
    fn operation_totals_match_by_name() {
        let body = response(json!({
            "output": [ { "records": { "rows": [["remove", 4]] } } ]
        }));
        assert_eq!(
            operation_totals(&body),
            OperationTotals { add: 0, remove: 4, total: -4 }
        );

        let body = response(json!({
            "output": [ { "records": { "rows": [["add", "10"], ["remove", "3"]] } } ]
        }));
        assert_eq!(
            operation_totals(&body),
            OperationTotals { add: 10, remove: 3, total: 7 }
        );
    }

    #[test]
    fn database_errors_win_over_status() {
        let body = response(json!({ "code": 3000, "error": "Table not found: records" }));
        let err = check_response("db", StatusCode::BAD_REQUEST, Some(body)).unwrap_err();
        assert!(matches!(err, QueryError::Database { code: 3000, .. }));

        let err = check_response("db", StatusCode::BAD_GATEWAY, None).unwrap_err();
        assert!(matches!(err, QueryError::Status { .. }));

        let err = check_response("db", StatusCode::OK, None).unwrap_err();
        assert!(matches!(err, QueryError::Malformed { .. }));
    }
}
