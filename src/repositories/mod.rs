//! Repositorios
//!
//! Acceso a las tablas del sistema a través de un almacén de registros
//! intercambiable (PostgreSQL o memoria).

pub mod change_feed;
pub mod entity_repository;
pub mod memory_store;
pub mod postgres_store;
pub mod record_store;

pub use change_feed::{ChangeHandler, ChangeNotice, ChangeSubscription};
pub use entity_repository::{Entity, EntityRepository};
pub use memory_store::MemoryRecordStore;
pub use postgres_store::PgRecordStore;
pub use record_store::{ChangeEvent, ChangeKind, Record, RecordStore, Table};
