use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use tracing::{error, info};

use crate::models::chat::{IngestionResponse, IngestionSummary};
use crate::state::AppState;
use crate::utils::error::ApiError;

/// POST /api/v1/rag: multipart CSV upload into a vector collection
pub async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<IngestionResponse>, ApiError> {
    info!("CSV ingestion request received");

    let mut multipart =
        multipart.map_err(|_| ApiError::BadRequest("No file part in the request".to_string()))?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut collection: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
                    .to_vec();
                file = Some((filename, data));
            }
            "collection" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid collection: {}", e)))?;
                collection = Some(text);
            }
            _ => {}
        }
    }

    let (filename, data) =
        file.ok_or_else(|| ApiError::BadRequest("No file part in the request".to_string()))?;

    if filename.is_empty() {
        return Err(ApiError::BadRequest("No file selected".to_string()));
    }

    if !filename.to_ascii_lowercase().ends_with(".csv") {
        return Err(ApiError::BadRequest(
            "Invalid file type. Only CSV files are allowed".to_string(),
        ));
    }

    let collection = collection
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| state.settings.retrieval.default_collection.clone());

    let rows_processed = state
        .documents
        .ingest_csv(&filename, &data, &collection)
        .await
        .map_err(|e| {
            error!("Failed to ingest {}: {:#}", filename, e);
            ApiError::internal("Error processing CSV file", format!("{:#}", e))
        })?;

    info!(
        "Ingested {} rows from {} into '{}'",
        rows_processed, filename, collection
    );

    Ok(Json(IngestionResponse {
        status: "success".to_string(),
        message: "RAG system initialized successfully".to_string(),
        data: IngestionSummary {
            filename,
            rows_processed,
            collection,
        },
    }))
}
