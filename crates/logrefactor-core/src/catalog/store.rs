/*!
# Catalog Store

CSV export and import. Columns are written with a header row and read back
by position, so an operator may rename headers or append columns without
breaking the import.
*/

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, warn};

use super::{format_argument_details, parse_argument_details, CallSiteRecord, Level};
use crate::error::{RefactorError, Result};

/// Column set of the catalog, in order
pub const CATALOG_COLUMNS: [&str; 14] = [
    "Identifier",
    "FilePath",
    "Line",
    "Column",
    "Package",
    "OriginalCallee",
    "Level",
    "MessageTemplate",
    "ArgumentCount",
    "ArgumentDetails",
    "NewCallee",
    "NewMessage",
    "StructuredFieldOverride",
    "Notes",
];

/// Rows shorter than this cannot carry the override column
const MIN_ROW_FIELDS: usize = 13;

/// Write records as CSV to any writer
pub fn write_csv<W: Write>(records: &[CallSiteRecord], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CATALOG_COLUMNS)?;

    for record in records {
        let line = record.line.to_string();
        let column = record.column.to_string();
        let count = record.arguments.len().to_string();
        let details = format_argument_details(&record.arguments);
        let path = record.file_path.to_string_lossy();

        csv.write_record([
            record.id.as_str(),
            path.as_ref(),
            line.as_str(),
            column.as_str(),
            record.package.as_str(),
            record.original_callee.as_str(),
            record.level.as_str(),
            record.message_template.as_str(),
            count.as_str(),
            details.as_str(),
            record.new_callee.as_str(),
            record.new_message.as_str(),
            record.field_override.as_str(),
            record.notes.as_str(),
        ])?;
    }

    csv.flush().map_err(|e| RefactorError::Csv(e.into()))?;
    Ok(())
}

/// Export records to a CSV file
pub fn export_csv(records: &[CallSiteRecord], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| RefactorError::io(path, e))?;
    write_csv(records, file)?;
    debug!("wrote {} catalog rows to {}", records.len(), path.display());
    Ok(())
}

/// Read records from CSV.
///
/// Malformed rows are skipped with a warning. A catalog without a single
/// data row is a `Catalog` error.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<CallSiteRecord>> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut data_rows = 0usize;

    for (index, row) in csv.records().enumerate() {
        // header is row 1
        let row_number = index + 2;
        data_rows += 1;

        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("skipping unreadable catalog row {row_number}: {e}");
                continue;
            }
        };

        match parse_row(&row) {
            Ok(record) => records.push(record),
            Err(reason) => warn!("skipping malformed catalog row {row_number}: {reason}"),
        }
    }

    if data_rows == 0 {
        return Err(RefactorError::Catalog(
            "catalog is empty or has no data rows".to_string(),
        ));
    }

    Ok(records)
}

/// Import records from a CSV file
pub fn import_csv(path: &Path) -> Result<Vec<CallSiteRecord>> {
    let file = File::open(path).map_err(|e| {
        RefactorError::Catalog(format!("cannot open catalog {}: {e}", path.display()))
    })?;
    read_csv(file)
}

fn parse_row(row: &csv::StringRecord) -> std::result::Result<CallSiteRecord, String> {
    if row.len() < MIN_ROW_FIELDS {
        return Err(format!(
            "expected at least {MIN_ROW_FIELDS} columns, found {}",
            row.len()
        ));
    }

    let cell = |index: usize| row.get(index).unwrap_or_default().to_string();
    let position = |index: usize, name: &str| {
        cell(index)
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| format!("{name} `{}` is not a positive integer", cell(index)))
    };

    let id = cell(0);
    if id.trim().is_empty() {
        return Err("missing identifier".to_string());
    }

    Ok(CallSiteRecord {
        id,
        file_path: cell(1).into(),
        line: position(2, "line")?,
        column: position(3, "column")?,
        package: cell(4),
        original_callee: cell(5),
        level: Level::parse(&cell(6)),
        message_template: cell(7),
        arguments: parse_argument_details(&cell(9)),
        new_callee: cell(10),
        new_message: cell(11),
        field_override: cell(12),
        notes: cell(13),
    })
}
