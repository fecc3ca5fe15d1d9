// HTTP routes: the ranked ladder, team pages, CSV dumps, health, metrics.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::cache::ResponseCache;
use crate::db::{dump_table_names, Database};
use crate::error::LadderError;
use crate::ladder::{self, LadderEntry, GENERA, REGIONS};
use crate::metrics;

// ── Request types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LadderParams {
    /// Absent means the default division; explicitly empty means all.
    pub genus: Option<String>,
    pub region: Option<String>,
}

#[derive(Deserialize)]
pub struct DumpParams {
    pub table: Option<String>,
}

#[derive(Serialize)]
struct LadderResponse<'a> {
    genus: &'a str,
    genera: &'a [&'a str],
    region: &'a str,
    regions: &'a [&'a str],
    rankings: Vec<LadderEntry>,
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub cache: ResponseCache,
}

// ── Error helpers ─────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> impl IntoResponse {
    (status, Json(json!({ "error": msg })))
}

fn internal_error(e: LadderError) -> impl IntoResponse {
    tracing::error!("Ladder error: {e}");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(db: Arc<Database>, cache: ResponseCache) -> Router {
    let state = AppState { db, cache };

    Router::new()
        .route("/", get(serve_ladder))
        .route("/teams/{team}", get(serve_team))
        .route("/dump", get(serve_dump))
        .route("/health", get(health_check))
        .route("/metrics", get(serve_metrics))
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state)
}

/// Record request count and duration for every route.
async fn track_metrics(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = metrics::normalize_path(req.uri().path());
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    metrics::HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &endpoint, &status])
        .inc();
    metrics::HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&endpoint])
        .observe(start.elapsed().as_secs_f64());
    response
}

// ── Ladder ────────────────────────────────────────────────────────────

/// Serve the ranked ladder for a division and optional region. Responses
/// are cached per (genus, region); the ladder only changes when the game
/// tables do, so entries stay valid until eviction.
async fn serve_ladder(
    State(state): State<AppState>,
    Query(params): Query<LadderParams>,
) -> impl IntoResponse {
    // No genus parameter at all means the default ladder; `?genus=` asks
    // for every division ranked together.
    let genus = params.genus.unwrap_or_else(|| GENERA[0].to_string());
    let region = params.region.unwrap_or_default();

    let key = format!("genus={genus}&region={region}");
    if let Some(body) = state.cache.get(&key) {
        return ([(header::CONTENT_TYPE, "application/json")], body).into_response();
    }

    match render_ladder(&state.db, &genus, &region).await {
        Ok(body) => {
            state.cache.insert(&key, body.clone());
            ([(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        Err(e) => internal_error(e).into_response(),
    }
}

async fn render_ladder(db: &Database, genus: &str, region: &str) -> Result<String, LadderError> {
    let genus_filter = if genus.is_empty() { None } else { Some(genus) };
    let rankings = ladder::compute_rankings(db, genus_filter).await?;

    let sorted = ladder::sort_ladder(&rankings);
    let info = db.team_info(&sorted).await?;
    let entries = ladder::build_entries(&sorted, &rankings, &info, region);

    let response = LadderResponse {
        genus,
        genera: GENERA,
        region,
        regions: REGIONS,
        rankings: entries,
    };
    Ok(serde_json::to_string(&response).expect("ladder response serializes"))
}

// ── Teams ─────────────────────────────────────────────────────────────

async fn serve_team(State(state): State<AppState>, Path(team): Path<i64>) -> impl IntoResponse {
    match state.db.team_info(&[team]).await {
        Ok(mut info) => match info.remove(&team) {
            Some(ti) => (StatusCode::OK, Json(json!(ti))).into_response(),
            None => json_error(StatusCode::NOT_FOUND, "Team not found").into_response(),
        },
        Err(e) => internal_error(e.into()).into_response(),
    }
}

// ── Dumps ─────────────────────────────────────────────────────────────

/// Export one whitelisted table as a CSV attachment. Without a valid
/// `table` parameter, list what can be dumped instead.
async fn serve_dump(
    State(state): State<AppState>,
    Query(params): Query<DumpParams>,
) -> impl IntoResponse {
    let table = params.table.unwrap_or_default();

    match state.db.table_dump(&table).await {
        Ok(Some((headers, rows))) => {
            let body = to_csv(&headers, &rows);
            (
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{table}.csv\""),
                    ),
                ],
                body,
            )
                .into_response()
        }
        Ok(None) => (
            StatusCode::OK,
            Json(json!({ "tables": dump_table_names() })),
        )
            .into_response(),
        Err(e) => internal_error(e.into()).into_response(),
    }
}

/// Render rows as CSV with a header line. Fields containing separators,
/// quotes or line breaks are quoted, with embedded quotes doubled.
fn to_csv(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    let header_row: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    write_csv_row(&mut out, &header_row);
    for row in rows {
        write_csv_row(&mut out, row);
    }
    out
}

fn write_csv_row(out: &mut String, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains(['"', ',', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push_str("\r\n");
}

// ── Misc ──────────────────────────────────────────────────────────────

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": "derby-ladder" }))
}

async fn serve_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_csv_plain_fields() {
        let rows = vec![owned(&["1", "Gotham", "2013-04-01"])];
        let csv = to_csv(&["id", "name", "day"], &rows);
        assert_eq!(csv, "id,name,day\r\n1,Gotham,2013-04-01\r\n");
    }

    #[test]
    fn test_csv_quotes_commas_and_quotes() {
        let rows = vec![owned(&["1", "Bay Area, CA", "say \"hi\""])];
        let csv = to_csv(&["id", "loc", "note"], &rows);
        assert_eq!(csv, "id,loc,note\r\n1,\"Bay Area, CA\",\"say \"\"hi\"\"\"\r\n");
    }

    #[test]
    fn test_csv_quotes_newlines() {
        let rows = vec![owned(&["a\nb"])];
        let csv = to_csv(&["field"], &rows);
        assert_eq!(csv, "field\r\n\"a\nb\"\r\n");
    }

    #[test]
    fn test_csv_empty_rows() {
        let csv = to_csv(&["only", "headers"], &[]);
        assert_eq!(csv, "only,headers\r\n");
    }
}
