//! # Vapor Core
//!
//! Crate compartilhada com o modelo de dados, o protocolo de frames da
//! serial, as regras de alerta e a configuração TOML do monitor de vapor.
//!
//! ## Módulos
//! - [`types`] – Leitura do sensor e identificador de registro
//! - [`protocol`] – Decodificação do frame `vapor;movimento`
//! - [`config`] – Configuração unificada via TOML
//! - [`alerts`] – Regras de limite/movimento e cooldown

pub mod types;
pub mod protocol;
pub mod config;
pub mod alerts;

// Re-exports convenientes
pub use types::{RecordId, SensorReading};
pub use protocol::decode_frame;
pub use config::AppConfig;
pub use alerts::{evaluate_alerts, AlertEvent, AlertKind};
