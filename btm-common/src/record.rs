//! Company record model

use serde::Serialize;

use crate::classify::Subsegment;

/// Output column order shared by the table view and the CSV export
pub const OUTPUT_COLUMNS: [&str; 10] = [
    "cnpj_basico",
    "razao_social",
    "nome_fantasia",
    "tech_in_scope",
    "subsegment",
    "uf",
    "municipio",
    "situacao_cadastral",
    "listed_br",
    "cnae_fiscal_principal",
];

/// One company after normalization and classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Identifier exactly as it appeared in the input
    pub cnpj_raw: String,
    /// Canonical 8-digit root (empty when the input had no digits)
    pub cnpj_basico: String,
    pub razao_social: String,
    pub nome_fantasia: String,
    pub uf: String,
    pub municipio: String,
    pub situacao_cadastral: String,
    pub cnae_fiscal_principal: String,
    pub tech_in_scope: bool,
    pub subsegment: Subsegment,
    /// Root appears in the CVM listed-company registry
    pub listed_br: bool,
}

impl Record {
    /// Fantasy name when present, legal name otherwise
    pub fn display_name(&self) -> &str {
        best_name(&self.nome_fantasia, &self.razao_social)
    }

    /// Cell values in [`OUTPUT_COLUMNS`] order
    pub fn output_cells(&self) -> [String; 10] {
        [
            self.cnpj_basico.clone(),
            self.razao_social.clone(),
            self.nome_fantasia.clone(),
            bool_cell(self.tech_in_scope),
            self.subsegment.to_string(),
            self.uf.clone(),
            self.municipio.clone(),
            self.situacao_cadastral.clone(),
            bool_cell(self.listed_br),
            self.cnae_fiscal_principal.clone(),
        ]
    }
}

/// Pick the display name for a company
///
/// Spreadsheet exports often carry the literal "nan" for blank cells, so it
/// counts as missing.
pub fn best_name<'a>(nome_fantasia: &'a str, razao_social: &'a str) -> &'a str {
    let fantasia = nome_fantasia.trim();
    if !fantasia.is_empty() && !fantasia.eq_ignore_ascii_case("nan") {
        fantasia
    } else {
        razao_social.trim()
    }
}

fn bool_cell(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}
