//! Tech-scope and subsegment classification
//!
//! Two signals are combined: the CNAE (industry code) prefix, which is
//! authoritative when present, and keyword matching on the company's display
//! name. CNAE data upstream is often missing or miscoded, so the keyword
//! fallback trades some precision for recall.
//!
//! Keyword groups are evaluated in [`KEYWORD_PRIORITY`] order and the first
//! hit wins. Earlier groups are the more specific verticals.

use serde::Serialize;
use std::fmt;

use crate::normalize::norm_cnae;
use crate::record::best_name;

/// Subsegment taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Subsegment {
    #[serde(rename = "Fintech / Payments")]
    FintechPayments,
    #[serde(rename = "Cybersecurity")]
    Cybersecurity,
    #[serde(rename = "Data / AI / Cloud")]
    DataAiCloud,
    #[serde(rename = "Internet / Marketplace")]
    InternetMarketplace,
    #[serde(rename = "Software Vertical — HCM")]
    Hcm,
    #[serde(rename = "Software Vertical — Health")]
    Health,
    #[serde(rename = "Software Vertical — EdTech")]
    EdTech,
    #[serde(rename = "Software Vertical — Legal/RegTech")]
    LegalRegTech,
    #[serde(rename = "Software Vertical — Retail/Commerce")]
    RetailCommerce,
    #[serde(rename = "Software Vertical — Agro")]
    Agro,
    #[serde(rename = "Software Horizontal")]
    SoftwareHorizontal,
    #[serde(rename = "Other Tech")]
    OtherTech,
}

impl Subsegment {
    /// Every label, in keyword priority order with the catch-all last
    pub const ALL: [Subsegment; 12] = [
        Subsegment::FintechPayments,
        Subsegment::Cybersecurity,
        Subsegment::DataAiCloud,
        Subsegment::InternetMarketplace,
        Subsegment::Hcm,
        Subsegment::Health,
        Subsegment::EdTech,
        Subsegment::LegalRegTech,
        Subsegment::RetailCommerce,
        Subsegment::Agro,
        Subsegment::SoftwareHorizontal,
        Subsegment::OtherTech,
    ];

    /// Human-readable label (also the serialized form)
    pub fn label(self) -> &'static str {
        match self {
            Subsegment::FintechPayments => "Fintech / Payments",
            Subsegment::Cybersecurity => "Cybersecurity",
            Subsegment::DataAiCloud => "Data / AI / Cloud",
            Subsegment::InternetMarketplace => "Internet / Marketplace",
            Subsegment::Hcm => "Software Vertical — HCM",
            Subsegment::Health => "Software Vertical — Health",
            Subsegment::EdTech => "Software Vertical — EdTech",
            Subsegment::LegalRegTech => "Software Vertical — Legal/RegTech",
            Subsegment::RetailCommerce => "Software Vertical — Retail/Commerce",
            Subsegment::Agro => "Software Vertical — Agro",
            Subsegment::SoftwareHorizontal => "Software Horizontal",
            Subsegment::OtherTech => "Other Tech",
        }
    }

    /// Parse a label as produced by [`Subsegment::label`]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

impl fmt::Display for Subsegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// CNAE prefixes that are tech by definition: software publishing (5820),
/// IT services (62) and data processing / hosting (63)
pub const CORE_TECH_CNAE_PREFIXES: &[&str] = &["5820", "62", "63"];

/// Financial and payment institution CNAE prefixes
pub const FINTECH_CNAE_PREFIXES: &[&str] = &["64", "66", "6619"];

/// Data processing / hosting CNAE prefix
pub const DATA_HOSTING_CNAE_PREFIX: &str = "63";

/// Prefixes that default to horizontal software when no keyword matched
pub const SOFTWARE_CNAE_PREFIXES: &[&str] = &["5820", "62"];

/// Name terms that put a company in tech scope without a tech CNAE
pub const TECH_NAME_KEYWORDS: &[&str] = &[
    "software", "saas", "cloud", "dados", "data", "cyber", "security", "pag", "payment", "pix",
    "app", "plataforma",
];

const FINTECH_KEYWORDS: &[&str] = &[
    "pag", "payment", "pix", "wallet", "carteira", "adquir", "gateway", "bank", "banco", "cartao",
    "crédito", "credito", "fidc",
];

const CYBER_KEYWORDS: &[&str] = &[
    "cyber", "security", "segur", "iam", "siem", "soc", "antifraude", "fraud", "endpoint", "waf",
];

const DATA_KEYWORDS: &[&str] = &[
    "cloud",
    "nuvem",
    "data",
    "dados",
    "analytics",
    "bi ",
    "machine learning",
    "ml",
    "ai",
    "ia",
    "lake",
    "warehouse",
];

const INTERNET_KEYWORDS: &[&str] = &[
    "marketplace",
    "e-commerce",
    "ecommerce",
    "delivery",
    "app",
    "plataforma",
    "classificados",
    "rides",
    "mobility",
    "logtech",
];

const HCM_KEYWORDS: &[&str] = &[
    "hcm",
    "rh",
    "folha",
    "ponto",
    "beneficios",
    "benefícios",
    "admiss",
    "onboarding",
    "offboarding",
];

const HEALTH_KEYWORDS: &[&str] = &[
    "saude", "saúde", "clinic", "hospital", "med", "prontuario", "prontuário", "health",
];

const EDTECH_KEYWORDS: &[&str] = &[
    "educ", "ead", "school", "lms", "edtech", "univers", "aluno", "curso",
];

const LEGAL_KEYWORDS: &[&str] = &[
    "jurid", "juríd", "legal", "regtech", "compliance", "kya", "kyc", "pld", "aml",
];

const RETAIL_KEYWORDS: &[&str] = &[
    "pdv", "varejo", "retail", "commerce", "erp", "fiscal", "nota", "checkout",
];

const AGRO_KEYWORDS: &[&str] = &[
    "agro", "safra", "fazenda", "rural", "pecu", "pecuária", "grain", "crop",
];

const HORIZONTAL_KEYWORDS: &[&str] = &[
    "crm",
    "helpdesk",
    "ticket",
    "devops",
    "observability",
    "saas",
    "workflow",
    "low-code",
    "nocode",
    "hris",
    "api",
    "integration",
    "integracao",
    "integração",
];

/// Keyword groups in evaluation order. First match wins.
pub const KEYWORD_PRIORITY: &[(Subsegment, &[&str])] = &[
    (Subsegment::FintechPayments, FINTECH_KEYWORDS),
    (Subsegment::Cybersecurity, CYBER_KEYWORDS),
    (Subsegment::DataAiCloud, DATA_KEYWORDS),
    (Subsegment::InternetMarketplace, INTERNET_KEYWORDS),
    (Subsegment::Hcm, HCM_KEYWORDS),
    (Subsegment::Health, HEALTH_KEYWORDS),
    (Subsegment::EdTech, EDTECH_KEYWORDS),
    (Subsegment::LegalRegTech, LEGAL_KEYWORDS),
    (Subsegment::RetailCommerce, RETAIL_KEYWORDS),
    (Subsegment::Agro, AGRO_KEYWORDS),
    (Subsegment::SoftwareHorizontal, HORIZONTAL_KEYWORDS),
];

/// Classification inputs borrowed from a row
#[derive(Debug, Clone, Copy)]
pub struct CompanyText<'a> {
    pub cnae: &'a str,
    pub razao_social: &'a str,
    pub nome_fantasia: &'a str,
}

impl<'a> CompanyText<'a> {
    pub fn new(cnae: &'a str, razao_social: &'a str, nome_fantasia: &'a str) -> Self {
        Self {
            cnae,
            razao_social,
            nome_fantasia,
        }
    }

    fn display_name(&self) -> &'a str {
        best_name(self.nome_fantasia, self.razao_social)
    }
}

/// Case-insensitive substring test against a keyword list
///
/// Keywords are expected to already be lowercase.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    keywords.iter().any(|k| lowered.contains(k))
}

fn starts_with_any(code: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| code.starts_with(p))
}

/// Whether a company falls inside the tech scope being mapped
pub fn tech_in_scope(company: &CompanyText<'_>) -> bool {
    let cnae = norm_cnae(company.cnae);
    if starts_with_any(&cnae, CORE_TECH_CNAE_PREFIXES) {
        return true;
    }
    contains_any(company.display_name(), TECH_NAME_KEYWORDS)
}

/// Assign exactly one subsegment to a company
pub fn classify_subsegment(company: &CompanyText<'_>) -> Subsegment {
    let cnae = norm_cnae(company.cnae);
    let name = company.display_name();

    // Financial institution codes win over any name keyword
    if starts_with_any(&cnae, FINTECH_CNAE_PREFIXES) {
        return Subsegment::FintechPayments;
    }

    if cnae.starts_with(DATA_HOSTING_CNAE_PREFIX) {
        if contains_any(name, DATA_KEYWORDS) {
            return Subsegment::DataAiCloud;
        }
        if contains_any(name, INTERNET_KEYWORDS) {
            return Subsegment::InternetMarketplace;
        }
        return Subsegment::DataAiCloud;
    }

    if let Some((label, _)) = KEYWORD_PRIORITY
        .iter()
        .find(|(_, keywords)| contains_any(name, keywords))
    {
        return *label;
    }

    if starts_with_any(&cnae, SOFTWARE_CNAE_PREFIXES) {
        return Subsegment::SoftwareHorizontal;
    }

    Subsegment::OtherTech
}
