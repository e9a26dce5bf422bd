//! Delimited-text ingestion
//!
//! Uploads and the registry are read into a [`RawTable`] of strings first.
//! Typing happens later in [`crate::pipeline`], so a malformed cell never
//! fails the whole table.

use csv::ReaderBuilder;
use encoding_rs::WINDOWS_1252;
use tracing::debug;

use crate::Result;

/// Untyped table: header row plus string cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Cell at `(row, column)`; short rows read as empty
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Decode bytes as UTF-8, falling back to Windows-1252
///
/// Windows-1252 is a superset of Latin-1 for printable characters, which is
/// what CVM and most Brazilian spreadsheet exports use.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

/// Decode bytes strictly as Latin-1 / Windows-1252
pub fn decode_latin1(bytes: &[u8]) -> String {
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text.into_owned()
}

/// Guess the field delimiter from the header line
///
/// Comma unless the header has more semicolons than commas.
pub fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    let commas = header.matches(',').count();
    let semicolons = header.matches(';').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// Parse delimited text into a [`RawTable`]
///
/// Rows may be ragged; missing trailing cells read as empty.
pub fn read_delimited(text: &str, delimiter: u8) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(
        "Parsed delimited table: {} columns, {} rows",
        headers.len(),
        rows.len()
    );

    Ok(RawTable { headers, rows })
}

/// Parse an uploaded file body (encoding and delimiter are detected)
pub fn read_upload(bytes: &[u8]) -> Result<RawTable> {
    let text = decode_text(bytes);
    let delimiter = sniff_delimiter(&text);
    read_delimited(&text, delimiter)
}

/// Built-in demonstration dataset
pub fn demo_table() -> RawTable {
    let headers = [
        "cnpj",
        "razao_social",
        "nome_fantasia",
        "uf",
        "municipio",
        "situacao_cadastral",
        "cnae_fiscal_principal",
    ];
    let rows: [[&str; 7]; 4] = [
        [
            "00000000000100",
            "Demo Payments S.A.",
            "DemoPay",
            "SP",
            "São Paulo",
            "ATIVA",
            "6619302",
        ],
        [
            "11111111000111",
            "Demo HCM Ltda",
            "DemoRH",
            "MG",
            "Belo Horizonte",
            "ATIVA",
            "6201501",
        ],
        [
            "22222222000122",
            "Demo Cyber Segurança",
            "DemoCyber",
            "RJ",
            "Rio de Janeiro",
            "ATIVA",
            "6204000",
        ],
        [
            "33333333000133",
            "Demo Data Cloud",
            "DemoCloud",
            "SP",
            "Campinas",
            "ATIVA",
            "6311900",
        ],
    ];

    RawTable {
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    }
}
