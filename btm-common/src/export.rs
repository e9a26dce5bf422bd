//! CSV export of the filtered table (UTF-8, comma-delimited)

use std::io::Write;

use crate::record::{Record, OUTPUT_COLUMNS};
use crate::Result;

/// Suggested download file name
pub const EXPORT_FILE_NAME: &str = "brazil_tech_mapped_filtered.csv";

/// Write `records` with a header row to `writer`
pub fn write_csv<W: Write>(records: &[&Record], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(OUTPUT_COLUMNS)?;
    for record in records {
        csv_writer.write_record(record.output_cells())?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Export to an in-memory buffer
pub fn to_csv_bytes(records: &[&Record]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::demo_table;
    use crate::pipeline::map_table;

    #[test]
    fn test_export_header_and_rows() {
        let records = map_table(&demo_table(), None).unwrap();
        let refs: Vec<&Record> = records.iter().collect();
        let bytes = to_csv_bytes(&refs).unwrap();
        let text = String::from_utf8(bytes).expect("export is UTF-8");

        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "cnpj_basico,razao_social,nome_fantasia,tech_in_scope,subsegment,uf,municipio,situacao_cadastral,listed_br,cnae_fiscal_principal"
        );
        assert_eq!(
            lines.next().unwrap(),
            "00000000,Demo Payments S.A.,DemoPay,False,Fintech / Payments,SP,São Paulo,ATIVA,False,6619302"
        );
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn test_export_quotes_delimiters() {
        let mut records = map_table(&demo_table(), None).unwrap();
        records[0].razao_social = "Pagamentos, Ltda".to_string();
        let bytes = to_csv_bytes(&[&records[0]]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"Pagamentos, Ltda\""));
    }

    #[test]
    fn test_export_empty_has_header_only() {
        let bytes = to_csv_bytes(&[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap().lines().count(), 1);
    }
}
