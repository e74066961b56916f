//! Tabular stream reader for the XER tab-delimited export format.
//!
//! Turns a raw byte buffer into an ordered mapping from uppercase table name
//! to `{fields, rows}`. Knows nothing about what the tables mean; that is
//! [`crate::builder`]'s job.

use std::collections::HashMap;

use xerproj_core::{Diagnostic, DiagnosticCode, DiagnosticEmitter, Severity, XerProjError};

/// Input size ceiling: 100 MiB.
pub const MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// Cumulative `%R` row ceiling across the whole file.
pub const MAX_ROWS: usize = 1_000_000;

/// One table's field names (in column order) and its rows, each row a
/// mapping from field name to raw cell string. A row shorter than the
/// field list simply omits its trailing fields rather than storing an
/// empty string for them.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TableData {
    pub fields: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

/// An ordered mapping from uppercase table name to its data. Iteration
/// order is table-declaration order in the source file.
#[derive(Debug, Default, Clone)]
pub struct TableMap {
    order: Vec<String>,
    tables: HashMap<String, TableData>,
}

impl TableMap {
    pub fn get(&self, name: &str) -> Option<&TableData> {
        self.tables.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableData)> {
        self.order.iter().map(|name| (name.as_str(), &self.tables[name]))
    }

    pub fn table_count(&self) -> usize {
        self.order.len()
    }

    fn insert(&mut self, name: String, data: TableData) {
        if !self.tables.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tables.insert(name, data);
    }
}

struct OpenTable {
    name: String,
    fields: Vec<String>,
    rows: Vec<HashMap<String, String>>,
}

/// Decode and tokenize `bytes` into a [`TableMap`]. Anomalies that do not
/// abort the parse are reported through `emitter` in addition to a
/// `tracing` event.
pub fn read_tables(
    bytes: &[u8],
    emitter: &mut dyn DiagnosticEmitter,
) -> Result<TableMap, XerProjError> {
    if bytes.is_empty() {
        return Err(XerProjError::EmptyFile);
    }

    if bytes.len() as u64 > MAX_FILE_BYTES {
        return Err(XerProjError::FileTooLarge {
            size_mib: bytes.len() as u64 / (1024 * 1024),
            max_mib: MAX_FILE_BYTES / (1024 * 1024),
        });
    }

    let text = decode(bytes)?;

    let mut tables = TableMap::default();
    let mut open: Option<OpenTable> = None;
    let mut saw_marker = false;
    let mut saw_header = false;
    let mut total_rows = 0usize;

    for line in text.split(['\n', '\r']) {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.split('\t');
        let marker = match parts.next() {
            Some(m) => m,
            None => continue,
        };

        match marker {
            "ERMHDR" => {
                saw_marker = true;
                saw_header = true;
            }
            "%T" => {
                saw_marker = true;
                let name = parts.next().unwrap_or_default().to_ascii_uppercase();
                if let Some(table) = open.take() {
                    finalize(&mut tables, table);
                }
                open = Some(OpenTable {
                    name,
                    fields: Vec::new(),
                    rows: Vec::new(),
                });
            }
            "%F" => {
                saw_marker = true;
                if let Some(table) = open.as_mut() {
                    table.fields = parts.map(str::to_string).collect();
                }
            }
            "%R" => {
                saw_marker = true;
                match open.as_mut() {
                    Some(table) if !table.fields.is_empty() => {
                        total_rows += 1;
                        if total_rows > MAX_ROWS {
                            return Err(XerProjError::TooManyRows {
                                count: total_rows,
                                max: MAX_ROWS,
                            });
                        }
                        let mut row = HashMap::with_capacity(table.fields.len());
                        for (field, cell) in table.fields.iter().zip(parts) {
                            row.insert(field.clone(), cell.to_string());
                        }
                        if row.len() < table.fields.len() {
                            tracing::debug!(table = %table.name, "row has fewer cells than fields");
                            emitter.emit(
                                Diagnostic::new(
                                    DiagnosticCode::MalformedRow,
                                    Severity::Info,
                                    "row has fewer cells than the field list",
                                )
                                .with_context(table.name.clone()),
                            );
                        }
                        table.rows.push(row);
                    }
                    _ => {
                        tracing::warn!("%R row encountered before any %F field list");
                        emitter.emit(Diagnostic::new(
                            DiagnosticCode::MalformedRow,
                            Severity::Warning,
                            "row encountered before any field list; skipped",
                        ));
                    }
                }
            }
            "%E" => {
                saw_marker = true;
                if let Some(table) = open.take() {
                    finalize(&mut tables, table);
                }
            }
            _ => {}
        }
    }

    // No %E: the final open table is emitted only if it collected rows.
    if let Some(table) = open {
        if !table.rows.is_empty() {
            finalize(&mut tables, table);
        }
    }

    if !saw_marker {
        return Err(XerProjError::InvalidFormat);
    }

    if !saw_header {
        tracing::warn!("no ERMHDR line encountered; proceeding anyway");
        emitter.emit(Diagnostic::new(
            DiagnosticCode::MissingHeader,
            Severity::Warning,
            "no ERMHDR line encountered",
        ));
    }

    Ok(tables)
}

fn finalize(tables: &mut TableMap, table: OpenTable) {
    if tables.tables.contains_key(&table.name) {
        tracing::debug!(table = %table.name, "duplicate %T; later occurrence wins");
    }
    tables.insert(
        table.name,
        TableData {
            fields: table.fields,
            rows: table.rows,
        },
    );
}

fn decode(bytes: &[u8]) -> Result<String, XerProjError> {
    let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
    if !had_errors {
        return Ok(decoded.into_owned());
    }
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| XerProjError::Encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xerproj_core::CollectingEmitter;

    fn read(input: &str) -> Result<TableMap, XerProjError> {
        let mut emitter = CollectingEmitter::new();
        read_tables(input.as_bytes(), &mut emitter)
    }

    #[test]
    fn empty_input_fails() {
        assert_eq!(read("").unwrap_err(), XerProjError::EmptyFile);
    }

    #[test]
    fn no_markers_is_invalid_format() {
        assert_eq!(read("just some text\nwith no markers\n").unwrap_err(), XerProjError::InvalidFormat);
    }

    #[test]
    fn smoke_parses_header_and_one_table() {
        let input = "ERMHDR\t18.8\nTEST\tuser\n%T\tPROJECT\n%F\tproj_id\tproj_short_name\n%R\t1000\tTEST\n%E\n";
        let tables = read(input).unwrap();
        assert_eq!(tables.table_count(), 1);
        let project = tables.get("PROJECT").unwrap();
        assert_eq!(project.rows.len(), 1);
        assert_eq!(project.rows[0].get("proj_id").unwrap(), "1000");
    }

    #[test]
    fn duplicate_table_keeps_last_occurrence() {
        let input = "ERMHDR\n%T\tPROJECT\n%F\tproj_id\n%R\t1\n%T\tPROJECT\n%F\tproj_id\n%R\t2\n%E\n";
        let tables = read(input).unwrap();
        assert_eq!(tables.table_count(), 1);
        let project = tables.get("PROJECT").unwrap();
        assert_eq!(project.rows.len(), 1);
        assert_eq!(project.rows[0].get("proj_id").unwrap(), "2");
    }

    #[test]
    fn row_before_fields_is_skipped() {
        let input = "ERMHDR\n%T\tPROJECT\n%R\t1000\n%F\tproj_id\n%R\t1001\n%E\n";
        let tables = read(input).unwrap();
        let project = tables.get("PROJECT").unwrap();
        assert_eq!(project.rows.len(), 1);
        assert_eq!(project.rows[0].get("proj_id").unwrap(), "1001");
    }

    #[test]
    fn short_row_omits_missing_cells() {
        let input = "ERMHDR\n%T\tPROJECT\n%F\tproj_id\tproj_short_name\n%R\t1000\n%E\n";
        let tables = read(input).unwrap();
        let row = &tables.get("PROJECT").unwrap().rows[0];
        assert_eq!(row.get("proj_id").unwrap(), "1000");
        assert!(!row.contains_key("proj_short_name"));
    }

    #[test]
    fn table_without_trailing_e_is_finalized_only_if_it_has_rows() {
        let with_rows = read("ERMHDR\n%T\tPROJECT\n%F\tproj_id\n%R\t1000\n").unwrap();
        assert_eq!(with_rows.table_count(), 1);

        let without_rows = read("ERMHDR\n%T\tPROJECT\n%F\tproj_id\n").unwrap();
        assert_eq!(without_rows.table_count(), 0);
    }

    #[test]
    fn missing_header_is_advisory_not_fatal() {
        let mut emitter = CollectingEmitter::new();
        let tables = read_tables(
            "%T\tPROJECT\n%F\tproj_id\n%R\t1000\n%E\n".as_bytes(),
            &mut emitter,
        )
        .unwrap();
        assert_eq!(tables.table_count(), 1);
        assert_eq!(emitter.by_code(DiagnosticCode::MissingHeader).count(), 1);
    }

    #[test]
    fn file_too_large_is_rejected_regardless_of_content() {
        let oversized = vec![b'%'; (MAX_FILE_BYTES + 1) as usize];
        let mut emitter = CollectingEmitter::new();
        let err = read_tables(&oversized, &mut emitter).unwrap_err();
        assert!(matches!(err, XerProjError::FileTooLarge { .. }));
    }
}
