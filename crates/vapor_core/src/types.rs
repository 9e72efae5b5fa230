//! Tipos de dados do monitor de vapor.
//!
//! Uma [`SensorReading`] só é construída pelo decodificador de frames
//! ([`crate::protocol::decode_frame`]) e, depois de persistida, nunca é
//! alterada.

use serde::{Deserialize, Serialize};
use std::fmt;

// ──────────────────────────────────────────────
// Leitura
// ──────────────────────────────────────────────

/// Leitura decodificada e validada do sensor.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SensorReading {
    /// Nível de vapor (relativo, tipicamente 0–100)
    pub steam: f64,
    /// Movimento detectado no ambiente
    pub movement: bool,
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vapor={} movimento={}", self.steam, self.movement)
    }
}

// ──────────────────────────────────────────────
// Identificador de registro
// ──────────────────────────────────────────────

/// Identificador atribuído pelo armazenamento no momento da persistência.
///
/// Monotônico e único, na ordem de inserção.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reading_is_idle() {
        let r = SensorReading::default();
        assert_eq!(r.steam, 0.0);
        assert!(!r.movement);
    }

    #[test]
    fn display_formats() {
        let r = SensorReading {
            steam: 42.5,
            movement: true,
        };
        assert_eq!(r.to_string(), "vapor=42.5 movimento=true");
        assert_eq!(RecordId(7).to_string(), "#7");
    }

    #[test]
    fn record_ids_order_by_insertion() {
        assert!(RecordId(1) < RecordId(2));
    }
}
