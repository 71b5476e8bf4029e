//! Configuración del proyecto
//! 
//! Este módulo contiene la configuración de base de datos, variables de entorno
//! y los datos de la empresa para los documentos.

pub mod company;
pub mod database;
pub mod environment;

pub use environment::*;
