//! Almacén de registros
//!
//! Contrato común de las tablas del sistema: listar, buscar, insertar,
//! actualizar, borrar y suscribirse a cambios. Los registros viajan como
//! objetos JSON; la capa tipada vive en `entity_repository`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};

/// Un registro tal como lo entrega el almacén
pub type Record = Map<String, Value>;

/// Capacidad del canal de cambios
pub const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Tablas del sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Clients,
    Repairs,
    Users,
    Brands,
    Models,
    DeviceTypes,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Clients,
        Table::Repairs,
        Table::Users,
        Table::Brands,
        Table::Models,
        Table::DeviceTypes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Clients => "clients",
            Table::Repairs => "repairs",
            Table::Users => "users",
            Table::Brands => "brands",
            Table::Models => "models",
            Table::DeviceTypes => "device_types",
        }
    }

    pub fn from_name(name: &str) -> Option<Table> {
        Table::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Columnas en el orden del esquema
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Table::Clients => &[
                "id",
                "first_name",
                "middle_name",
                "last_name",
                "document",
                "email",
                "contact",
                "address",
                "created_at",
            ],
            Table::Repairs => &[
                "id",
                "nro",
                "client_id",
                "client_name",
                "client_rut",
                "correo",
                "telefono",
                "tipo_dcto",
                "estado_pago",
                "estado_reparacion",
                "tipo_pago",
                "tipo_equipo",
                "marca",
                "modelo",
                "serie",
                "accesorios",
                "falla",
                "observacion",
                "servicios",
                "repuestos",
                "created_at",
            ],
            Table::Users => &[
                "id",
                "auth_uid",
                "email",
                "first_name",
                "last_name",
                "role",
                "local_password",
                "created_at",
            ],
            Table::Brands | Table::DeviceTypes => &["id", "name", "created_at"],
            Table::Models => &["id", "name", "brand_id", "created_at"],
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    /// Valor por defecto de una columna ausente al insertar
    pub fn column_default(&self, column: &str) -> Value {
        match (self, column) {
            (Table::Repairs, "servicios") | (Table::Repairs, "repuestos") => {
                Value::Array(Vec::new())
            }
            (Table::Users, "role") => Value::String("worker".to_string()),
            _ => Value::Null,
        }
    }

    /// Columnas `NOT NULL` del esquema, sin contar `id` ni `created_at`
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Table::Repairs => &["servicios", "repuestos"],
            Table::Users => &["email", "role"],
            Table::Brands | Table::Models | Table::DeviceTypes => &["name"],
            Table::Clients => &[],
        }
    }

    /// Columnas con restricción `UNIQUE`
    pub fn unique_columns(&self) -> &'static [&'static str] {
        match self {
            Table::Users => &["email"],
            _ => &[],
        }
    }

    /// Referencias a otras tablas: (columna, tabla referenciada)
    pub fn references(&self) -> &'static [(&'static str, Table)] {
        match self {
            Table::Repairs => &[("client_id", Table::Clients)],
            Table::Models => &[("brand_id", Table::Brands)],
            _ => &[],
        }
    }

    /// Rechaza columnas que no existen en la tabla
    pub fn check_columns(&self, record: &Record) -> AppResult<()> {
        match record.keys().find(|key| !self.has_column(key)) {
            Some(unknown) => Err(AppError::BadRequest(format!(
                "La columna '{}' no existe en la tabla {}",
                unknown,
                self.name()
            ))),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tipo de cambio notificado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Notificación de cambio en una tabla
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    #[serde(default)]
    pub id: Option<Uuid>,
}

/// Contrato del almacén de registros
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Todos los registros de la tabla, más recientes primero
    async fn list(&self, table: Table) -> AppResult<Vec<Record>>;

    async fn find(&self, table: Table, id: Uuid) -> AppResult<Option<Record>>;

    /// Registros cuya columna es exactamente igual a `value`
    async fn find_by(&self, table: Table, column: &str, value: &Value) -> AppResult<Vec<Record>>;

    /// Inserta y devuelve el registro guardado (con `id` y `created_at`)
    async fn insert(&self, table: Table, record: Record) -> AppResult<Record>;

    /// Actualización parcial; `NotFound` si el id no existe
    async fn update(&self, table: Table, id: Uuid, patch: Record) -> AppResult<Record>;

    async fn delete(&self, table: Table, id: Uuid) -> AppResult<bool>;

    /// Suma histórica de los totales de todas las reparaciones
    async fn historic_total(&self) -> AppResult<Decimal>;

    /// Canal de notificaciones de cambio de todas las tablas
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Convierte un valor en registro; sólo se aceptan objetos JSON
pub fn into_record(value: Value) -> AppResult<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Internal(format!(
            "Se esperaba un objeto JSON y se recibió: {}",
            other
        ))),
    }
}

/// Id de un registro, si está presente y bien formado
pub fn record_id(record: &Record) -> Option<Uuid> {
    record
        .get("id")
        .and_then(Value::as_str)
        .and_then(|id| Uuid::parse_str(id).ok())
}
