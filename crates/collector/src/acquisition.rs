//! Loop de aquisição: leitura → decodificação → persistência → alertas.
//!
//! Um único fluxo, sem paralelismo entre ciclos. Toda falha é logada no
//! estágio onde ocorre e o loop segue para o próximo ciclo.

use crate::connection::FrameSource;
use crate::notifier::Notifier;
use crate::store::ReadingStore;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use vapor_core::alerts::AlertGate;
use vapor_core::config::AlertConfig;
use vapor_core::{decode_frame, evaluate_alerts, RecordId, SensorReading};

/// Resultado de um ciclo, usado para log e testes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub frame: Option<String>,
    pub reading: Option<SensorReading>,
    pub record: Option<RecordId>,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
    pub alerts_suppressed: usize,
}

pub struct AcquisitionLoop<S, R, N> {
    source: S,
    store: R,
    notifier: N,
    alerts: AlertConfig,
    gate: AlertGate,
    interval: Duration,
}

impl<S, R, N> AcquisitionLoop<S, R, N>
where
    S: FrameSource,
    R: ReadingStore,
    N: Notifier,
{
    pub fn new(source: S, store: R, notifier: N, alerts: AlertConfig, interval: Duration) -> Self {
        let gate = AlertGate::new(Duration::from_secs(alerts.cooldown_secs));
        Self {
            source,
            store,
            notifier,
            alerts,
            gate,
            interval,
        }
    }

    /// Executa um ciclo completo, sem a espera final.
    pub fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        let Some(frame) = self.source.read_frame() else {
            info!("Nenhum dado lido da porta serial");
            return report;
        };
        report.frame = Some(frame.clone());

        let reading = match decode_frame(&frame) {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Frame inválido {frame:?}: {e}");
                return report;
            }
        };
        report.reading = Some(reading);

        // Persistência e alertas são independentes
        match self.store.append(&reading) {
            Ok(id) => {
                info!("Leitura {id} gravada: {reading}");
                report.record = Some(id);
            }
            Err(e) => error!("Leitura não gravada ({reading}): {e}"),
        }

        let now = Instant::now();
        for event in evaluate_alerts(&reading, &self.alerts) {
            if !self.gate.admit(event.kind, now) {
                report.alerts_suppressed += 1;
                continue;
            }
            match self.notifier.notify(&event) {
                Ok(()) => report.alerts_sent += 1,
                Err(e) => {
                    error!("Alerta '{}' não entregue: {e}", event.subject);
                    report.alerts_failed += 1;
                }
            }
        }

        report
    }

    /// Roda ciclos até receber sinal em `stop` (ou o canal ser fechado).
    ///
    /// A espera entre ciclos é feita no próprio canal, então a parada não
    /// aguarda o período inteiro. Fecha a fonte ao sair.
    pub fn run(&mut self, stop: &Receiver<()>) {
        info!("Loop de aquisição iniciado (intervalo {:?})", self.interval);
        loop {
            let report = self.run_cycle();
            debug!(
                "Ciclo: frame={:?} leitura={:?} registro={:?} alertas={}/{} suprimidos={}",
                report.frame,
                report.reading,
                report.record,
                report.alerts_sent,
                report.alerts_sent + report.alerts_failed,
                report.alerts_suppressed
            );
            match stop.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.source.close();
        info!("Loop de aquisição encerrado");
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
