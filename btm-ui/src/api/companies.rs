//! Company table: map, filter, summarize, export
//!
//! GET variants work on the built-in demo table, POST variants on an
//! uploaded CSV sent as the raw request body. Filters arrive as query
//! parameters; list filters are comma-separated.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use btm_common::export::{to_csv_bytes, EXPORT_FILE_NAME};
use btm_common::filter::{
    facets, summarize, Facets, FilterCriteria, ListedFilter, SubsegmentCount,
};
use btm_common::ingest::{demo_table, read_upload, RawTable};
use btm_common::pipeline::{map_table, ListedLookup};
use btm_common::record::OUTPUT_COLUMNS;
use btm_common::{Record, Subsegment};

use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

/// Query parameters shared by the table and export endpoints
#[derive(Debug, Deserialize)]
pub struct CompaniesQuery {
    /// Keep only tech-in-scope companies
    #[serde(default = "default_true")]
    pub only_tech: bool,

    /// Mark companies listed on CVM
    #[serde(default = "default_true")]
    pub use_registry: bool,

    /// `all`, `listed` or `not_listed`
    #[serde(default)]
    pub listed: Option<String>,

    /// Comma-separated subsegment labels
    #[serde(default)]
    pub subsegment: Option<String>,

    /// Comma-separated UFs
    #[serde(default)]
    pub uf: Option<String>,

    /// Comma-separated registration statuses
    #[serde(default)]
    pub status: Option<String>,

    /// Free-text search over legal / fantasy names
    #[serde(default)]
    pub q: Option<String>,

    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_true() -> bool {
    true
}

fn default_page() -> i64 {
    1
}

fn split_list(value: &Option<String>) -> Vec<String> {
    value
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl CompaniesQuery {
    /// Translate query parameters into filter criteria
    pub fn criteria(&self) -> ApiResult<FilterCriteria> {
        let subsegments = split_list(&self.subsegment)
            .iter()
            .map(|label| {
                Subsegment::from_label(label)
                    .ok_or_else(|| ApiError::BadRequest(format!("Unknown subsegment: {}", label)))
            })
            .collect::<ApiResult<Vec<_>>>()?;

        let listed: ListedFilter = self.listed.as_deref().unwrap_or("").parse()?;

        Ok(FilterCriteria {
            only_tech: self.only_tech,
            listed,
            subsegments,
            ufs: split_list(&self.uf),
            statuses: split_list(&self.status),
            search: self.q.clone().unwrap_or_default(),
        })
    }
}

/// Company table response
#[derive(Debug, Serialize)]
pub struct CompaniesResponse {
    pub source: String,
    pub total_results: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub summary: Vec<SubsegmentCount>,
    pub facets: Facets,
    pub listed_available: bool,
    pub warnings: Vec<String>,
}

/// Mapped and filtered table for one request
struct MappedView {
    records: Vec<Record>,
    lookup: ListedLookup,
    criteria: FilterCriteria,
}

impl MappedView {
    fn kept(&self) -> Vec<&Record> {
        self.criteria.apply(&self.records)
    }

    fn warnings(&self) -> Vec<String> {
        self.lookup.warning().map(str::to_string).into_iter().collect()
    }
}

async fn build_view(
    state: &AppState,
    table: &RawTable,
    query: &CompaniesQuery,
) -> ApiResult<MappedView> {
    let criteria = query.criteria()?;
    let enabled = state.registry_enabled && query.use_registry;
    let lookup = ListedLookup::resolve(&state.registry, enabled, Utc::now()).await;
    let records = map_table(table, lookup.set())?;
    Ok(MappedView {
        records,
        lookup,
        criteria,
    })
}

fn parse_upload(body: &Bytes) -> ApiResult<RawTable> {
    if body.is_empty() {
        return Err(ApiError::BadRequest(
            "Empty upload: send a CSV with a CNPJ column".to_string(),
        ));
    }
    let table = read_upload(body)?;
    info!("Received upload: {} rows, columns {:?}", table.len(), table.headers);
    Ok(table)
}

fn row_values(record: &Record) -> Vec<Value> {
    vec![
        json!(record.cnpj_basico),
        json!(record.razao_social),
        json!(record.nome_fantasia),
        json!(record.tech_in_scope),
        json!(record.subsegment),
        json!(record.uf),
        json!(record.municipio),
        json!(record.situacao_cadastral),
        json!(record.listed_br),
        json!(record.cnae_fiscal_principal),
    ]
}

fn table_response(view: MappedView, source: &str, page: i64) -> CompaniesResponse {
    let kept = view.kept();
    let p = calculate_pagination(kept.len(), page);

    debug!(
        "{}: {} of {} rows kept, page {}/{}",
        source,
        kept.len(),
        view.records.len(),
        p.page,
        p.total_pages
    );

    CompaniesResponse {
        source: source.to_string(),
        total_results: kept.len(),
        page: p.page,
        page_size: PAGE_SIZE,
        total_pages: p.total_pages,
        columns: OUTPUT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: p.window(&kept).iter().map(|r| row_values(r)).collect(),
        summary: summarize(&kept),
        facets: facets(&view.records, view.criteria.only_tech),
        listed_available: view.lookup.is_available(),
        warnings: view.warnings(),
    }
}

fn csv_response(view: MappedView) -> ApiResult<Response> {
    let kept = view.kept();
    let bytes = to_csv_bytes(&kept)?;
    info!("Exporting {} rows as CSV", kept.len());

    let mut response = (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        bytes,
    )
        .into_response();

    if let Some(warning) = view.lookup.warning() {
        // Header values must be visible ASCII
        let ascii: String = warning
            .chars()
            .filter(|c| c.is_ascii() && !c.is_ascii_control())
            .collect();
        if let Ok(value) = ascii.parse() {
            response.headers_mut().insert("x-btm-warning", value);
        }
    }
    Ok(response)
}

/// GET /api/companies
///
/// Demo dataset, mapped and filtered.
pub async fn demo_companies(
    State(state): State<AppState>,
    Query(query): Query<CompaniesQuery>,
) -> ApiResult<Json<CompaniesResponse>> {
    let view = build_view(&state, &demo_table(), &query).await?;
    Ok(Json(table_response(view, "demo", query.page)))
}

/// POST /api/companies
///
/// Uploaded CSV (request body), mapped and filtered.
pub async fn uploaded_companies(
    State(state): State<AppState>,
    Query(query): Query<CompaniesQuery>,
    body: Bytes,
) -> ApiResult<Json<CompaniesResponse>> {
    let table = parse_upload(&body)?;
    let view = build_view(&state, &table, &query).await?;
    Ok(Json(table_response(view, "upload", query.page)))
}

/// GET /api/export
///
/// Demo dataset as a CSV download (all filtered rows, no paging).
pub async fn export_demo(
    State(state): State<AppState>,
    Query(query): Query<CompaniesQuery>,
) -> ApiResult<Response> {
    let view = build_view(&state, &demo_table(), &query).await?;
    csv_response(view)
}

/// POST /api/export
///
/// Uploaded CSV as a CSV download (all filtered rows, no paging).
pub async fn export_uploaded(
    State(state): State<AppState>,
    Query(query): Query<CompaniesQuery>,
    body: Bytes,
) -> ApiResult<Response> {
    let table = parse_upload(&body)?;
    let view = build_view(&state, &table, &query).await?;
    csv_response(view)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(subsegment: Option<&str>, uf: Option<&str>) -> CompaniesQuery {
        CompaniesQuery {
            only_tech: true,
            use_registry: true,
            listed: None,
            subsegment: subsegment.map(str::to_string),
            uf: uf.map(str::to_string),
            status: None,
            q: None,
            page: 1,
        }
    }

    #[test]
    fn test_split_list_trims_and_skips_blanks() {
        assert_eq!(split_list(&Some(" SP, ,RJ ".to_string())), vec!["SP", "RJ"]);
        assert!(split_list(&None).is_empty());
    }

    #[test]
    fn test_criteria_parses_subsegment_labels() {
        let criteria = query(Some("Cybersecurity,Data / AI / Cloud"), Some("SP"))
            .criteria()
            .unwrap();
        assert_eq!(
            criteria.subsegments,
            vec![Subsegment::Cybersecurity, Subsegment::DataAiCloud]
        );
        assert_eq!(criteria.ufs, vec!["SP"]);
    }

    #[test]
    fn test_criteria_rejects_unknown_label() {
        assert!(matches!(
            query(Some("Quantum"), None).criteria(),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_criteria_parses_listed_filter() {
        let mut q = query(None, None);
        q.listed = Some("not-listed".to_string());
        assert_eq!(q.criteria().unwrap().listed, ListedFilter::NotListed);

        q.listed = Some("maybe".to_string());
        assert!(matches!(
            q.criteria(),
            Err(ApiError::Common(btm_common::Error::InvalidInput(_)))
        ));
    }

    #[test]
    fn test_empty_upload_rejected() {
        assert!(matches!(
            parse_upload(&Bytes::new()),
            Err(ApiError::BadRequest(_))
        ));
    }
}
