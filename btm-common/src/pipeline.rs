//! Raw table -> classified records

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::classify::{classify_subsegment, tech_in_scope, CompanyText};
use crate::columns::{ColumnMap, CNPJ_ALIASES};
use crate::ingest::RawTable;
use crate::normalize::cnpj_root;
use crate::record::Record;
use crate::registry::{ListedSet, RegistryCache};
use crate::{Error, Result};

/// Outcome of looking up the listed-company registry for one request
#[derive(Debug, Clone)]
pub enum ListedLookup {
    /// User turned the listed flag off
    Disabled,
    /// Registry loaded
    Available(Arc<ListedSet>),
    /// Registry could not be loaded; every record is treated as not listed
    Unavailable(String),
}

impl ListedLookup {
    /// Resolve against the cache; failures degrade instead of propagating
    pub async fn resolve(cache: &RegistryCache, enabled: bool, now: DateTime<Utc>) -> Self {
        if !enabled {
            return ListedLookup::Disabled;
        }
        match cache.get(now).await {
            Ok(set) => ListedLookup::Available(set),
            Err(e) => {
                warn!("Listed flag unavailable: {}", e);
                ListedLookup::Unavailable(format!(
                    "Could not download/process the CVM registry right now. Error: {}",
                    e
                ))
            }
        }
    }

    pub fn set(&self) -> Option<&ListedSet> {
        match self {
            ListedLookup::Available(set) => Some(set.as_ref()),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ListedLookup::Available(_))
    }

    /// User-facing warning, if the lookup degraded
    pub fn warning(&self) -> Option<&str> {
        match self {
            ListedLookup::Unavailable(msg) => Some(msg.as_str()),
            _ => None,
        }
    }
}

/// Normalize, classify and flag every row of `table`
///
/// Fails only when no identifier column can be resolved. Bad cells fall
/// back to empty values.
pub fn map_table(table: &RawTable, listed: Option<&ListedSet>) -> Result<Vec<Record>> {
    let columns = ColumnMap::resolve(&table.headers).ok_or_else(|| {
        Error::MissingColumn(format!(
            "no CNPJ column found; include one of: {}",
            CNPJ_ALIASES.join(", ")
        ))
    })?;

    let records: Vec<Record> = (0..table.len())
        .map(|row| map_row(table, row, &columns, listed))
        .collect();

    debug!(
        "Mapped {} rows ({} in tech scope)",
        records.len(),
        records.iter().filter(|r| r.tech_in_scope).count()
    );
    Ok(records)
}

fn map_row(
    table: &RawTable,
    row: usize,
    columns: &ColumnMap,
    listed: Option<&ListedSet>,
) -> Record {
    let optional = |column: Option<usize>| {
        column
            .map(|c| table.cell(row, c).trim().to_string())
            .unwrap_or_default()
    };

    let cnpj_raw = table.cell(row, columns.cnpj).to_string();
    let cnpj_basico = cnpj_root(&cnpj_raw);
    let razao_social = optional(columns.razao_social);
    let nome_fantasia = optional(columns.nome_fantasia);
    let cnae_fiscal_principal = optional(columns.cnae_fiscal_principal);

    let text = CompanyText::new(&cnae_fiscal_principal, &razao_social, &nome_fantasia);
    let tech = tech_in_scope(&text);
    let subsegment = classify_subsegment(&text);
    let listed_br = listed.map(|set| set.contains(&cnpj_basico)).unwrap_or(false);

    Record {
        cnpj_raw,
        cnpj_basico,
        razao_social,
        nome_fantasia,
        uf: optional(columns.uf),
        municipio: optional(columns.municipio),
        situacao_cadastral: optional(columns.situacao_cadastral),
        cnae_fiscal_principal,
        tech_in_scope: tech,
        subsegment,
        listed_br,
    }
}
