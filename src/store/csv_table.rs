//! CSV-backed table store

use crate::record::{Field, Record};
use crate::store::{
    IdentityStrategy, PersistedTable, StoreError, StoreResult, TableRow, TableStore, URL_COLUMN,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Leading byte-order mark, so spreadsheet tools detect UTF-8
pub(crate) const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A persisted table in a delimited file with a header row
///
/// Columns are the record fields, preceded by `URL` for URL-identity
/// tables. Missing cells load as unknown. Saved files start with a UTF-8
/// byte-order mark, which loading tolerates.
#[derive(Debug, Clone)]
pub struct CsvTableStore {
    path: PathBuf,
    identity: IdentityStrategy,
}

impl CsvTableStore {
    pub fn new(path: impl Into<PathBuf>, identity: IdentityStrategy) -> Self {
        Self {
            path: path.into(),
            identity,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn header(&self) -> Vec<&'static str> {
        let mut header = Vec::with_capacity(Field::ALL.len() + 1);
        if self.identity.keeps_url() {
            header.push(URL_COLUMN);
        }
        header.extend(Field::ALL.iter().map(|f| f.column()));
        header
    }

    fn csv_error(&self, source: csv::Error) -> StoreError {
        StoreError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn column_index(&self, headers: &[String], column: &str) -> StoreResult<usize> {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| StoreError::MissingColumn {
                path: self.path.clone(),
                column: column.to_string(),
            })
    }
}

impl TableStore for CsvTableStore {
    fn identity(&self) -> IdentityStrategy {
        self.identity
    }

    fn load(&self) -> StoreResult<PersistedTable> {
        if !self.path.exists() {
            tracing::debug!("No table at {}, starting empty", self.path.display());
            return Ok(PersistedTable::new(self.identity));
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| self.csv_error(e))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| self.csv_error(e))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let field_columns = Field::ALL
            .iter()
            .map(|f| self.column_index(&headers, f.column()))
            .collect::<StoreResult<Vec<usize>>>()?;
        let url_column = if self.identity.keeps_url() {
            Some(self.column_index(&headers, URL_COLUMN)?)
        } else {
            None
        };

        let mut rows = Vec::new();
        for result in reader.records() {
            let row = result.map_err(|e| self.csv_error(e))?;
            let record =
                Record::from_values(field_columns.iter().map(|i| row.get(*i).unwrap_or("")));
            let url = url_column
                .and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string);
            rows.push(TableRow { url, record });
        }

        tracing::debug!("Loaded {} rows from {}", rows.len(), self.path.display());
        Ok(PersistedTable::with_rows(self.identity, rows))
    }

    fn save(&self, table: &PersistedTable) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        // Write the whole table next to the destination, then swap it in
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        tmp.as_file_mut()
            .write_all(UTF8_BOM)
            .map_err(|e| self.io_error(e))?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            writer
                .write_record(self.header())
                .map_err(|e| self.csv_error(e))?;

            for row in table.rows() {
                let mut cells: Vec<&str> = Vec::with_capacity(Field::ALL.len() + 1);
                if self.identity.keeps_url() {
                    cells.push(row.url.as_deref().unwrap_or(""));
                }
                cells.extend(row.record.values());
                writer.write_record(&cells).map_err(|e| self.csv_error(e))?;
            }

            writer.flush().map_err(|e| self.io_error(e))?;
        }

        tmp.persist(&self.path).map_err(|e| StoreError::Persist {
            path: self.path.clone(),
            source: e,
        })?;

        tracing::info!("Wrote {} rows to {}", table.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
