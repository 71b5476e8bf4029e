//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos que mapean a las tablas
//! del almacén de registros (clients, repairs, users, brands, models,
//! device_types).

/// Vocabulario cerrado que se guarda como etiqueta de texto.
///
/// Las etiquetas desconocidas (datos antiguos) se conservan en `Other`
/// para no perder información al leer y volver a guardar.
macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// Etiqueta no reconocida, conservada tal cual
            Other(String),
        }

        impl $name {
            pub fn label(&self) -> &str {
                match self {
                    $( $name::$variant => $label, )+
                    $name::Other(label) => label.as_str(),
                }
            }
        }

        impl From<String> for $name {
            fn from(label: String) -> Self {
                match label.as_str() {
                    $( $label => $name::$variant, )+
                    _ => $name::Other(label),
                }
            }
        }

        impl From<&str> for $name {
            fn from(label: &str) -> Self {
                $name::from(label.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                match value {
                    $name::Other(label) => label,
                    known => known.label().to_string(),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

pub mod auth;
pub mod catalog;
pub mod client;
pub mod dashboard;
pub mod repair;
pub mod user;

pub use auth::{AuthMethod, Principal, Session, SessionClaims, SessionFlag};
pub use catalog::{Brand, DeviceModel, DeviceType};
pub use client::Client;
pub use dashboard::{DashboardCounts, DashboardSummary, RecentClient, RecentRepair};
pub use repair::{
    DocumentType, PartLineItem, PaymentMethod, PaymentStatus, RepairOrder, RepairStatus,
    ServiceLineItem, Totals,
};
pub use user::{UserProfile, UserRole};
