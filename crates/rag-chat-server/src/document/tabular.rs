use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::debug;

/// One CSV row turned into an indexable document
#[derive(Debug, Clone, PartialEq)]
pub struct TabularDocument {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
}

/// Parse CSV bytes (with header row) into documents.
///
/// Text is built from `content_columns` that exist in the header, space-joined in the
/// given order. If none of them exist every cell is used. Remaining columns become
/// string metadata. The id is the zero-based row index.
pub fn parse_csv(bytes: &[u8], content_columns: &[String]) -> Result<Vec<TabularDocument>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Fields)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    let content_idx: Vec<usize> = content_columns
        .iter()
        .filter_map(|col| headers.iter().position(|h| h == col))
        .collect();

    if content_idx.is_empty() {
        debug!(
            "None of {:?} found in CSV header {:?}, using all columns as text",
            content_columns, headers
        );
    }

    let mut documents = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV row {}", row + 1))?;

        let text = if content_idx.is_empty() {
            record.iter().collect::<Vec<_>>().join(" ")
        } else {
            content_idx
                .iter()
                .map(|&i| record.get(i).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(" ")
        };

        let mut metadata = Map::new();
        if !content_idx.is_empty() {
            for (i, header) in headers.iter().enumerate() {
                if content_idx.contains(&i) {
                    continue;
                }
                let value = record.get(i).unwrap_or_default();
                metadata.insert(header.clone(), Value::String(value.to_string()));
            }
        }

        documents.push(TabularDocument {
            id: row.to_string(),
            text: text.trim().to_string(),
            metadata,
        });
    }

    Ok(documents)
}
