//! CSV and XLSX serialisation of a [`Table`].

use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use serde::Deserialize;

use crate::error::ExportError;
use crate::table::{Cell, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

/// Serialised export ready to be served as a download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// # Errors
///
/// Returns [`ExportError`] if serialisation fails.
pub fn write_table(
    table: &Table,
    format: ExportFormat,
    file_stem: &str,
) -> Result<ExportFile, ExportError> {
    let bytes = match format {
        ExportFormat::Csv => to_csv(table)?,
        ExportFormat::Xlsx => to_xlsx(table)?,
    };
    Ok(ExportFile {
        file_name: format!("{file_stem}.{}", format.extension()),
        content_type: format.content_type(),
        bytes,
    })
}

/// # Errors
///
/// Returns [`ExportError::Csv`] on write failure.
pub fn to_csv(table: &Table) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.headers)?;
    for row in table.rows.iter().chain(table.totals.iter()) {
        writer.write_record(row.iter().map(Cell::render))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))
}

/// Bold header, two-decimal hours, bold totals row.
///
/// # Errors
///
/// Returns [`ExportError::Xlsx`] on write failure.
pub fn to_xlsx(table: &Table) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let hours_format = Format::new().set_num_format("0.00").set_align(FormatAlign::Right);
    let total_format = Format::new().set_bold();
    let total_hours_format = Format::new().set_bold().set_num_format("0.00");

    let sheet = workbook.add_worksheet();
    sheet.set_name(table.sheet_name)?;
    for (col, header) in (0u16..).zip(table.headers) {
        sheet.write_string_with_format(0, col, *header, &header_format)?;
    }

    let mut row_idx: u32 = 1;
    for row in &table.rows {
        for (col, cell) in (0u16..).zip(row) {
            match cell {
                Cell::Text(text) => {
                    sheet.write_string(row_idx, col, text)?;
                }
                Cell::Hours(hours) => {
                    sheet.write_number_with_format(row_idx, col, *hours, &hours_format)?;
                }
            }
        }
        row_idx += 1;
    }

    if let Some(totals) = &table.totals {
        for (col, cell) in (0u16..).zip(totals) {
            match cell {
                Cell::Text(text) => {
                    sheet.write_string_with_format(row_idx, col, text, &total_format)?;
                }
                Cell::Hours(hours) => {
                    sheet.write_number_with_format(row_idx, col, *hours, &total_hours_format)?;
                }
            }
        }
    }

    sheet.set_freeze_panes(1, 0)?;
    sheet.autofit();
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> Table {
        Table {
            sheet_name: "CPD",
            headers: &["Title", "Hours"],
            rows: vec![
                vec![Cell::Text("Ethics, module 1".into()), Cell::Hours(1.5)],
                vec![Cell::Text("Supervision \"live\"".into()), Cell::Hours(2.0)],
            ],
            totals: Some(vec![Cell::Text("Total".into()), Cell::Hours(3.5)]),
        }
    }

    #[test]
    fn csv_quotes_and_totals() {
        let csv = String::from_utf8(to_csv(&table()).unwrap()).unwrap();
        assert_eq!(
            csv,
            "Title,Hours\n\"Ethics, module 1\",1.50\n\"Supervision \"\"live\"\"\",2.00\nTotal,3.50\n"
        );
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let bytes = to_xlsx(&table()).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn file_naming() {
        let file = write_table(&table(), ExportFormat::Xlsx, "icflog-cpd-2026-10-17").unwrap();
        assert_eq!(file.file_name, "icflog-cpd-2026-10-17.xlsx");
        assert!(file.content_type.contains("spreadsheetml"));
        let file = write_table(&table(), ExportFormat::Csv, "x").unwrap();
        assert_eq!(file.content_type, "text/csv; charset=utf-8");
    }
}
