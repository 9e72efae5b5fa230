//! Sistema de alertas – regras de limite de vapor e de movimento.
//!
//! As regras são independentes e avaliadas em ordem fixa (vapor antes de
//! movimento). Sem deduplicação: cada ciclo com violação gera seus alertas,
//! a menos que um [`AlertGate`] com cooldown seja usado.

use crate::config::AlertConfig;
use crate::types::SensorReading;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Tipo de alerta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    /// Vapor acima do limite
    SteamThreshold,
    /// Movimento detectado
    Motion,
    /// Relatório de leitura (opcional)
    Reading,
}

/// Um alerta disparado, pronto para o notificador.
#[derive(Debug, Clone)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub subject: String,
    pub body: String,
    pub evaluated_at: DateTime<Local>,
}

/// Avalia uma leitura no instante atual.
pub fn evaluate_alerts(reading: &SensorReading, config: &AlertConfig) -> Vec<AlertEvent> {
    evaluate_alerts_at(reading, config, Local::now())
}

/// Avalia uma leitura contra as regras, usando `now` como instante da
/// avaliação.
pub fn evaluate_alerts_at(
    reading: &SensorReading,
    config: &AlertConfig,
    now: DateTime<Local>,
) -> Vec<AlertEvent> {
    let mut alerts = Vec::new();

    // Regra A: vapor
    if reading.steam > config.steam_threshold {
        alerts.push(AlertEvent {
            kind: AlertKind::SteamThreshold,
            subject: "Alerta: nível de vapor elevado".into(),
            body: format!(
                "O nível de vapor ({:.1}) ultrapassou o limite de {:.1}.\n\
                 Risco de condensação no ambiente. Verifique a ventilação.",
                reading.steam, config.steam_threshold
            ),
            evaluated_at: now,
        });
    }

    // Regra B: movimento
    if reading.movement {
        let stamp = now.format("%H:%M:%S do dia %d/%m/%Y");
        alerts.push(AlertEvent {
            kind: AlertKind::Motion,
            subject: "Alerta: movimento detectado".into(),
            body: format!("Movimento detectado às {stamp}."),
            evaluated_at: now,
        });
    }

    if config.report_every_reading {
        alerts.push(AlertEvent {
            kind: AlertKind::Reading,
            subject: "Novos dados do sensor".into(),
            body: format!(
                "Novos dados recebidos:\nVapor: {}\nMovimento: {}",
                reading.steam,
                if reading.movement { "sim" } else { "não" }
            ),
            evaluated_at: now,
        });
    }

    alerts
}

// ──────────────────────────────────────────────
// Cooldown
// ──────────────────────────────────────────────

/// Limita a repetição de alertas do mesmo tipo.
///
/// Com cooldown zero todos os alertas passam.
#[derive(Debug)]
pub struct AlertGate {
    cooldown: Duration,
    last_sent: HashMap<AlertKind, Instant>,
}

impl AlertGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_sent: HashMap::new(),
        }
    }

    /// Retorna `true` se o alerta deve ser enviado e registra o envio.
    pub fn admit(&mut self, kind: AlertKind, now: Instant) -> bool {
        if self.cooldown.is_zero() {
            return true;
        }
        match self.last_sent.get(&kind) {
            Some(last) if now.saturating_duration_since(*last) < self.cooldown => false,
            _ => {
                self.last_sent.insert(kind, now);
                true
            }
        }
    }
}
