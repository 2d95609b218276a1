//! CSV / Excel / JSON export and CSV import.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use delivery_tracker_core::Capability;

use super::FilterQuery;
use super::deliveries::filtered;
use crate::error::AppError;
use crate::middleware::{RequireAuth, require};
use crate::services::export::{
    Delimiter, ExportOptions, ImportOptions, ParseOutcome, TextEncoding, export_filename,
    parse_csv, to_csv, to_json, to_xlsx,
};
use crate::state::AppState;

const FILE_PREFIX: &str = "deliveries";
const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Build the import/export router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/deliveries/export", get(export))
        .route("/api/deliveries/import", post(import))
        .route("/api/deliveries/import/preview", post(preview))
}

/// Download format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
    Json,
}

/// Export options from the query string.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExportQuery {
    pub format: ExportFormat,
    pub encoding: Option<String>,
    pub delimiter: Option<String>,
    pub bom: Option<bool>,
}

impl ExportQuery {
    fn csv_options(&self) -> Result<ExportOptions, AppError> {
        let defaults = ExportOptions::default();
        Ok(ExportOptions {
            encoding: parse_opt::<TextEncoding>(self.encoding.as_deref())?
                .unwrap_or(defaults.encoding),
            delimiter: parse_opt::<Delimiter>(self.delimiter.as_deref())?
                .unwrap_or(defaults.delimiter),
            include_bom: self.bom.unwrap_or(defaults.include_bom),
        })
    }
}

fn parse_opt<T>(value: Option<&str>) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<T>().map_err(AppError::BadRequest))
        .transpose()
}

/// Download the filtered list.
#[instrument(skip(user, state))]
pub async fn export(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(filter): Query<FilterQuery>,
    Query(options): Query<ExportQuery>,
) -> Result<Response, AppError> {
    require(&user, Capability::ExportData)?;

    let deliveries = filtered(&state, &filter).await?;
    let now = state.local_now();

    let (bytes, content_type, ext) = match options.format {
        ExportFormat::Csv => {
            let csv_options = options.csv_options()?;
            let content_type = match csv_options.encoding {
                TextEncoding::Utf8 => "text/csv; charset=utf-8",
                TextEncoding::ShiftJis => "text/csv; charset=shift_jis",
            };
            (to_csv(&deliveries, &csv_options)?, content_type, "csv")
        }
        ExportFormat::Xlsx => (to_xlsx(&deliveries)?, XLSX_CONTENT_TYPE, "xlsx"),
        ExportFormat::Json => (to_json(&deliveries)?, "application/json", "json"),
    };

    let filename = export_filename(FILE_PREFIX, ext, now);
    tracing::info!(
        count = deliveries.len(),
        format = ext,
        email = %user.email,
        "Export generated"
    );

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// What to do when some rows are invalid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Write nothing unless every row is valid.
    #[default]
    Strict,
    /// Write the valid rows and report the rest.
    SkipInvalid,
}

/// Import options from the query string.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ImportQuery {
    pub mode: ImportMode,
    pub encoding: Option<String>,
    pub delimiter: Option<String>,
}

impl ImportQuery {
    fn options(&self) -> Result<ImportOptions, AppError> {
        Ok(ImportOptions {
            encoding: parse_opt(self.encoding.as_deref())?,
            delimiter: parse_opt(self.delimiter.as_deref())?,
        })
    }
}

/// Import result.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub errors: Vec<String>,
}

/// Import deliveries from a CSV body.
#[instrument(skip(user, state, body), fields(bytes = body.len()))]
pub async fn import(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> Result<Json<ImportResponse>, AppError> {
    require(&user, Capability::ImportData)?;

    let ParseOutcome { data, errors } = parse_csv(&body, &query.options()?);

    if query.mode == ImportMode::Strict && !errors.is_empty() {
        tracing::warn!(errors = errors.len(), "Strict import rejected");
        let data = serde_json::to_value(&data).map_err(|e| AppError::Internal(e.to_string()))?;
        return Err(AppError::Validation {
            errors,
            data: Some(data),
        });
    }

    let created = if data.is_empty() {
        Vec::new()
    } else {
        state.deliveries().create_many(data, Utc::now()).await?
    };

    tracing::info!(
        imported = created.len(),
        skipped = errors.len(),
        email = %user.email,
        "Import completed"
    );

    Ok(Json(ImportResponse {
        imported: created.len(),
        errors,
    }))
}

/// Parse a CSV body and report what an import would do.
#[instrument(skip(user, body), fields(bytes = body.len()))]
pub async fn preview(
    RequireAuth(user): RequireAuth,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> Result<Json<ParseOutcome>, AppError> {
    require(&user, Capability::ImportData)?;
    Ok(Json(parse_csv(&body, &query.options()?)))
}
