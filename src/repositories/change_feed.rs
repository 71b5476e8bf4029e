//! Suscripción a cambios del almacén
//!
//! Una suscripción tiene una sola tarea de despacho que llama al handler
//! de forma secuencial. No hay deduplicación: los handlers deben ser
//! idempotentes. Un handler que entra en pánico no detiene la suscripción.

use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::record_store::{ChangeEvent, RecordStore, Table};

/// Lo que recibe un handler
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeNotice {
    Event(ChangeEvent),
    /// Se perdieron notificaciones; el handler debe recargar todo
    Lagged(u64),
}

#[async_trait]
pub trait ChangeHandler: Send + Sync {
    async fn handle(&self, notice: ChangeNotice);
}

/// Suscripción activa a un conjunto de tablas
pub struct ChangeSubscription {
    task: Option<JoinHandle<()>>,
}

impl ChangeSubscription {
    /// Se suscribe de inmediato; los cambios posteriores a esta llamada
    /// llegan al handler.
    pub fn start(store: &dyn RecordStore, tables: &[Table], handler: Arc<dyn ChangeHandler>) -> Self {
        let mut receiver = store.subscribe();
        let watched = tables.to_vec();

        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if watched.contains(&event.table) {
                            debug!("🔄 Despachando cambio en {}", event.table);
                            dispatch(handler.as_ref(), ChangeNotice::Event(event)).await;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("⚠️ Suscripción atrasada, {} cambios omitidos", skipped);
                        dispatch(handler.as_ref(), ChangeNotice::Lagged(skipped)).await;
                    }
                    Err(RecvError::Closed) => {
                        info!("🛑 Canal de cambios cerrado");
                        break;
                    }
                }
            }
        });

        Self { task: Some(task) }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }

    /// Cancela la suscripción. Llamarlo más de una vez no tiene efecto.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn dispatch(handler: &dyn ChangeHandler, notice: ChangeNotice) {
    if AssertUnwindSafe(handler.handle(notice))
        .catch_unwind()
        .await
        .is_err()
    {
        error!("❌ El handler de cambios falló; la suscripción sigue activa");
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory_store::MemoryRecordStore;
    use crate::repositories::record_store::into_record;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<ChangeNotice>>,
    }

    #[async_trait]
    impl ChangeHandler for Recorder {
        async fn handle(&self, notice: ChangeNotice) {
            self.seen.lock().await.push(notice);
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_only_watched_tables_are_dispatched() {
        let store = MemoryRecordStore::new();
        let recorder = Arc::new(Recorder::default());
        let _subscription = ChangeSubscription::start(&store, &[Table::Clients], recorder.clone());

        store
            .insert(Table::Brands, into_record(json!({ "name": "Dell" })).unwrap())
            .await
            .unwrap();
        store
            .insert(Table::Clients, into_record(json!({ "first_name": "Ana" })).unwrap())
            .await
            .unwrap();
        settle().await;

        let seen = recorder.seen.lock().await;
        assert_eq!(seen.len(), 1);
        assert!(matches!(&seen[0], ChangeNotice::Event(e) if e.table == Table::Clients));
    }

    struct Flaky {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl ChangeHandler for Flaky {
        async fn handle(&self, _notice: ChangeNotice) {
            let call = {
                let mut calls = self.calls.lock().await;
                *calls += 1;
                *calls
            };
            if call == 1 {
                panic!("fallo en el primer cambio");
            }
        }
    }

    #[tokio::test]
    async fn test_handler_panic_keeps_subscription_alive() {
        let store = MemoryRecordStore::new();
        let handler = Arc::new(Flaky { calls: Mutex::new(0) });
        let subscription = ChangeSubscription::start(&store, &[Table::Clients], handler.clone());

        for name in ["Ana", "Luis"] {
            store
                .insert(Table::Clients, into_record(json!({ "first_name": name })).unwrap())
                .await
                .unwrap();
            settle().await;
        }

        assert!(subscription.is_active());
        assert_eq!(*handler.calls.lock().await, 2);
    }

    #[tokio::test]
    async fn test_stop_unsubscribes() {
        let store = MemoryRecordStore::new();
        let recorder = Arc::new(Recorder::default());
        let mut subscription = ChangeSubscription::start(&store, &[Table::Clients], recorder.clone());
        assert!(subscription.is_active());

        subscription.stop();
        subscription.stop();
        settle().await;
        assert!(!subscription.is_active());

        store
            .insert(Table::Clients, into_record(json!({ "first_name": "Ana" })).unwrap())
            .await
            .unwrap();
        settle().await;
        assert!(recorder.seen.lock().await.is_empty());
    }
}
