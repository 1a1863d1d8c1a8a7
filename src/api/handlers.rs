// HTTP request handlers for API endpoints

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::models::*;
use crate::database_ops::{compute_intervals, list_producers, list_records, Store};
use crate::ingest::{ingest_from_stream, upsert_many, upsert_one};
use crate::models::Record;
use crate::normalization::normalize;

/// Shared ingestion settings for upload handlers.
#[derive(Debug, Clone, Copy)]
pub struct IngestSettings {
    pub batch_size: usize,
}

/// Health check endpoint
pub async fn health_check(store: web::Data<Store>) -> HttpResponse {
    let database = if store.ping().await {
        "connected"
    } else {
        "disconnected"
    };
    HttpResponse::Ok().json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        database: database.to_string(),
    }))
}

/// Streams a `text/csv` body through the ingestion pipeline.
pub async fn upload_movies(
    req: HttpRequest,
    payload: web::Payload,
    store: web::Data<Store>,
    settings: web::Data<IngestSettings>,
) -> Result<HttpResponse, ApiError> {
    let is_csv = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/csv"));
    if !is_csv {
        return Err(ApiError::bad_request("send a valid CSV file (Content-Type: text/csv)"));
    }

    let report = ingest_from_stream(&store, payload, settings.batch_size).await?;
    tracing::info!(
        rows = report.rows_read,
        batches = report.batches,
        "CSV upload processed"
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(UploadResponse {
        message: "file processed".to_string(),
        report,
    })))
}

/// Inserts or replaces one movie (JSON object) or several (JSON array).
pub async fn upsert_movies(
    body: web::Json<Value>,
    store: web::Data<Store>,
) -> Result<HttpResponse, ApiError> {
    let items = payload_items(body.into_inner());
    if items.is_empty() {
        return Err(ApiError::bad_request("check the submitted data"));
    }

    let records = items
        .iter()
        .map(|item| {
            let row = movie_payload_row(item)?;
            normalize(&row).ok().flatten()
        })
        .collect::<Option<Vec<Record>>>()
        .ok_or_else(|| ApiError::bad_request("check the submitted data"))?;

    let summary = match records.as_slice() {
        [record] => upsert_one(&store, record).await,
        many => upsert_many(&store, many).await,
    }
    .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(UpsertResponse {
        message: "data saved".to_string(),
        records: summary.records,
    })))
}

pub async fn list_movies(store: web::Data<Store>) -> Result<HttpResponse, ApiError> {
    let movies = list_records(&store).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(movies)))
}

pub async fn list_all_producers(store: web::Data<Store>) -> Result<HttpResponse, ApiError> {
    let producers = list_producers(&store).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(producers)))
}

/// Producers with the smallest and largest gap between consecutive wins.
pub async fn producer_intervals(store: web::Data<Store>) -> Result<HttpResponse, ApiError> {
    let intervals = compute_intervals(&store).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(intervals)))
}

pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(ApiResponse::<()>::error("method not allowed"))
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::<()>::error("route not found"))
}
