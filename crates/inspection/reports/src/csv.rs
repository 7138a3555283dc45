//! Spreadsheet-friendly CSV export
//!
//! Output is tuned for spreadsheet tools in Spanish locales: UTF-8 BOM, `;`
//! separator, CRLF line endings and every field quoted.

use chrono::{DateTime, Utc};
use inspection_types::InspectionStatus;

const BOM: char = '\u{feff}';
const SEPARATOR: char = ';';
const LINE_END: &str = "\r\n";

/// Column headers of the data table
pub const COLUMNS: [&str; 6] = ["Fecha", "Contenedor", "Planta", "Naviera", "Inspector", "Estado"];

/// One exported inspection with resolved names
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub inspected_at: DateTime<Utc>,
    pub container_number: String,
    pub plant: String,
    pub shipping_line: String,
    pub inspector: String,
    pub status: InspectionStatus,
}

/// Header block context
#[derive(Debug, Clone)]
pub struct ExportHeader {
    pub generated_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
    /// Human-readable applied filters, e.g. `Planta: North`
    pub filters: Vec<String>,
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn write_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    let line = fields
        .iter()
        .map(|f| quote(f.as_ref()))
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string());
    out.push_str(&line);
    out.push_str(LINE_END);
}

fn blank_line(out: &mut String) {
    out.push_str(LINE_END);
}

/// `dd/mm/YYYY HH:MM`
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%d/%m/%Y %H:%M").to_string()
}

/// Render the full report
pub fn render(header: &ExportHeader, rows: &[ExportRow]) -> String {
    let mut out = String::new();
    out.push(BOM);

    write_row(&mut out, &["Reporte de Inspecciones"]);
    write_row(
        &mut out,
        &[format!("Generado: {}", format_timestamp(&header.generated_at))],
    );
    write_row(
        &mut out,
        &[format!("Usuario: {} ({})", header.user_name, header.user_email)],
    );
    let filters = if header.filters.is_empty() {
        "Ninguno".to_string()
    } else {
        header.filters.join(", ")
    };
    write_row(&mut out, &[format!("Filtros: {filters}")]);
    blank_line(&mut out);

    write_row(&mut out, &COLUMNS);

    let (mut pending, mut approved, mut rejected) = (0u64, 0u64, 0u64);
    for row in rows {
        match row.status {
            InspectionStatus::Pending => pending += 1,
            InspectionStatus::Approved => approved += 1,
            InspectionStatus::Rejected => rejected += 1,
        }
        let date = format_timestamp(&row.inspected_at);
        write_row(
            &mut out,
            &[
                date.as_str(),
                row.container_number.as_str(),
                row.plant.as_str(),
                row.shipping_line.as_str(),
                row.inspector.as_str(),
                row.status.label_es(),
            ],
        );
    }

    blank_line(&mut out);
    write_row(&mut out, &["Totales"]);
    write_row(&mut out, &[format!("Pendientes: {pending}")]);
    write_row(&mut out, &[format!("Aprobadas: {approved}")]);
    write_row(&mut out, &[format!("Rechazadas: {rejected}")]);
    write_row(&mut out, &[format!("Total: {}", rows.len())]);

    out
}

/// `reporte_inspecciones_<YYYYmmdd_HHMMSS>.csv`
pub fn file_name(generated_at: &DateTime<Utc>) -> String {
    format!(
        "reporte_inspecciones_{}.csv",
        generated_at.format("%Y%m%d_%H%M%S")
    )
}
