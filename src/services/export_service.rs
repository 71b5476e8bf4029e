//! Respaldo de datos en una planilla `.xlsx`
//!
//! Una hoja por tabla (`Clients`, `Repairs`, `Users`). Las columnas son la
//! unión de los campos de los registros en orden de aparición.

use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use crate::repositories::record_store::Record;
use crate::repositories::{RecordStore, Table};
use crate::utils::errors::AppResult;

/// Columnas que nunca salen en el respaldo
const EXCLUDED_COLUMNS: [&str; 1] = ["local_password"];

/// Planilla generada
#[derive(Debug, Clone)]
pub struct BackupFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub fn backup_file_name(now: DateTime<Utc>) -> String {
    format!("valpotec-backup-{}.xlsx", now.format("%Y-%m-%d-%H-%M-%S"))
}

/// Unión de nombres de campo, en el orden en que aparecen
pub fn sheet_columns(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if EXCLUDED_COLUMNS.contains(&key.as_str()) || columns.contains(key) {
                continue;
            }
            columns.push(key.clone());
        }
    }
    columns
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> AppResult<()> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => match n.as_f64() {
            Some(number) => {
                sheet.write_number(row, col, number)?;
            }
            None => {
                sheet.write_string(row, col, n.to_string())?;
            }
        },
        Value::String(s) => {
            sheet.write_string(row, col, s)?;
        }
        nested => {
            sheet.write_string(row, col, nested.to_string())?;
        }
    }
    Ok(())
}

fn write_sheet(workbook: &mut Workbook, name: &str, records: &[Record]) -> AppResult<()> {
    let header = Format::new().set_bold();
    let columns = sheet_columns(records);

    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    for (col, column) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, column, &header)?;
    }
    for (index, record) in records.iter().enumerate() {
        let row = index as u32 + 1;
        for (col, column) in columns.iter().enumerate() {
            if let Some(value) = record.get(column) {
                write_cell(sheet, row, col as u16, value)?;
            }
        }
    }
    Ok(())
}

/// Construye la planilla a partir de los registros de cada hoja
pub fn build_workbook(sheets: &[(&str, Vec<Record>)]) -> AppResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    for (name, records) in sheets {
        write_sheet(&mut workbook, name, records)?;
    }
    Ok(workbook.save_to_buffer()?)
}

#[derive(Clone)]
pub struct ExportService {
    store: Arc<dyn RecordStore>,
}

impl ExportService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    async fn load(&self, table: Table) -> AppResult<Vec<Record>> {
        self.store.list(table).await.map_err(|e| {
            error!("❌ Error leyendo {} para el respaldo: {}", table, e);
            e.during("Error creando backup")
        })
    }

    /// Lee las tres tablas en paralelo y arma la planilla
    pub async fn backup(&self) -> AppResult<BackupFile> {
        let (clients, repairs, users) = futures::try_join!(
            self.load(Table::Clients),
            self.load(Table::Repairs),
            self.load(Table::Users),
        )?;

        let bytes = build_workbook(&[
            ("Clients", clients),
            ("Repairs", repairs),
            ("Users", users),
        ])?;
        let file_name = backup_file_name(Utc::now());
        info!("💾 Backup creado: {} ({} bytes)", file_name, bytes.len());
        Ok(BackupFile { file_name, bytes })
    }
}
