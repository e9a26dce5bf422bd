//! Header alias resolution for uploaded tables
//!
//! Uploaded CSVs come from different exports (Receita Federal dumps,
//! spreadsheets, CRM extracts) and name the same field differently.

/// Identifier column aliases, in preference order
pub const CNPJ_ALIASES: &[&str] = &["cnpj_basico", "cnpj_raiz", "cnpj"];
pub const RAZAO_SOCIAL_ALIASES: &[&str] = &["razao_social", "razao", "nome"];
pub const NOME_FANTASIA_ALIASES: &[&str] = &["nome_fantasia", "fantasia"];
pub const UF_ALIASES: &[&str] = &["uf", "estado"];
pub const MUNICIPIO_ALIASES: &[&str] = &["municipio", "cidade"];
pub const SITUACAO_ALIASES: &[&str] = &["situacao_cadastral", "situacao"];
pub const CNAE_ALIASES: &[&str] = &["cnae_fiscal_principal", "cnae"];

/// Find the first candidate present among `available` headers
///
/// Matching ignores case and surrounding whitespace. Candidate order wins
/// over header order. Returns the index into `available`.
pub fn resolve_column<S: AsRef<str>>(candidates: &[&str], available: &[S]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        available
            .iter()
            .position(|header| header.as_ref().trim().eq_ignore_ascii_case(candidate))
    })
}

/// Header indices for every field the pipeline reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub cnpj: usize,
    pub razao_social: Option<usize>,
    pub nome_fantasia: Option<usize>,
    pub uf: Option<usize>,
    pub municipio: Option<usize>,
    pub situacao_cadastral: Option<usize>,
    pub cnae_fiscal_principal: Option<usize>,
}

impl ColumnMap {
    /// Resolve all aliases; `None` when no identifier column exists
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Option<Self> {
        Some(Self {
            cnpj: resolve_column(CNPJ_ALIASES, headers)?,
            razao_social: resolve_column(RAZAO_SOCIAL_ALIASES, headers),
            nome_fantasia: resolve_column(NOME_FANTASIA_ALIASES, headers),
            uf: resolve_column(UF_ALIASES, headers),
            municipio: resolve_column(MUNICIPIO_ALIASES, headers),
            situacao_cadastral: resolve_column(SITUACAO_ALIASES, headers),
            cnae_fiscal_principal: resolve_column(CNAE_ALIASES, headers),
        })
    }
}
