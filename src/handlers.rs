use crate::dashboard::{Dashboard, SearchTicket};
use crate::errors::{AppError, QueryResult};
use crate::models::{ChartKind, ChartPayload, ChartQuery, SamplesResponse, SearchRequest};
use crate::repo::RepoRef;
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    response::Html,
    Json,
};
use tracing::{debug, error, info, warn};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.config.sample_repo))
}

pub async fn get_dashboard(State(state): State<AppState>) -> Json<Dashboard> {
    let dashboard = state.dashboard.lock().await;
    Json(dashboard.clone())
}

pub async fn search(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<Dashboard>, AppError> {
    let repo = RepoRef::parse(&payload.repo)
        .ok_or_else(|| AppError::bad_request("repo must look like user/repo"))?;

    Ok(Json(start_search(&state, repo).await))
}

pub async fn lucky(State(state): State<AppState>) -> Json<Dashboard> {
    let repo = state.config.sample_repo.clone();
    Json(start_search(&state, repo).await)
}

pub async fn reset(State(state): State<AppState>) -> Json<Dashboard> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.reset();
    info!("dashboard reset");
    Json(dashboard.clone())
}

pub async fn get_chart(
    State(state): State<AppState>,
    Path(kind): Path<ChartKind>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ChartPayload>, AppError> {
    let repo = RepoRef::parse(&query.repo)
        .ok_or_else(|| AppError::bad_request("repo must look like user/repo"))?;

    let payload = match kind {
        ChartKind::OperationCount => ChartPayload::Totals(state.analytics.operation_count(&repo).await?),
        ChartKind::OperationHistory => ChartPayload::Series(
            state
                .analytics
                .operation_history(&repo, &state.config.timestamp_format)
                .await?,
        ),
        ChartKind::AuthorRank => ChartPayload::Series(state.analytics.author_rank(&repo).await?),
    };
    Ok(Json(payload))
}

pub async fn get_samples(State(state): State<AppState>) -> Json<SamplesResponse> {
    let repo = &state.config.sample_repo;
    let files = state.feed.some_files(repo).await.unwrap_or_else(|err| {
        warn!("sample files for {repo} unavailable: {err}");
        Vec::new()
    });

    Json(SamplesResponse {
        repo: repo.to_string(),
        files,
    })
}

async fn start_search(state: &AppState, repo: RepoRef) -> Dashboard {
    info!("start searching {repo}");
    let (ticket, snapshot) = {
        let mut dashboard = state.dashboard.lock().await;
        let ticket = dashboard.begin_search(repo.clone());
        (ticket, dashboard.clone())
    };

    tokio::spawn(run_search(state.clone(), repo, ticket));
    snapshot
}

/// Triggers the crawl, then refreshes every chart. Each chart commits as soon
/// as its own query returns.
async fn run_search(state: AppState, repo: RepoRef, ticket: SearchTicket) {
    match state.feed.update_repo(&repo).await {
        Ok(report) => {
            state.dashboard.lock().await.record_crawl(&ticket, report);
        }
        Err(err) => warn!("crawl trigger for {repo} failed: {err}"),
    }

    let count = async {
        let result = state.analytics.operation_count(&repo).await;
        let outcome = chart_outcome("operation count", &repo, result);
        state
            .dashboard
            .lock()
            .await
            .operation_count
            .commit(ticket.operation_count, outcome)
    };
    let history = async {
        let result = state
            .analytics
            .operation_history(&repo, &state.config.timestamp_format)
            .await;
        let outcome = chart_outcome("operation history", &repo, result);
        state
            .dashboard
            .lock()
            .await
            .operation_history
            .commit(ticket.operation_history, outcome)
    };
    let rank = async {
        let result = state.analytics.author_rank(&repo).await;
        let outcome = chart_outcome("author rank", &repo, result);
        state
            .dashboard
            .lock()
            .await
            .author_rank
            .commit(ticket.author_rank, outcome)
    };
    let committed = tokio::join!(count, history, rank);
    debug!("charts for {repo} committed: {committed:?}");

    if state.dashboard.lock().await.finish_search(&ticket) {
        info!("search done for {repo}");
    } else {
        debug!("dropping stale search results for {repo}");
    }
}

fn chart_outcome<T>(chart: &str, repo: &RepoRef, result: QueryResult<T>) -> Result<T, String> {
    result.map_err(|err| {
        error!("{chart} query for {repo} failed: {err}");
        err.to_string()
    })
}
