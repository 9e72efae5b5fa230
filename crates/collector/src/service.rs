//! Ciclo de vida do coletor: `start` abre a conexão e inicia o loop numa
//! thread dedicada; `stop` sinaliza o loop, aguarda o término e a conexão é
//! fechada na saída do loop.

use crate::acquisition::AcquisitionLoop;
use crate::connection::{ConnectionManager, ConnectionState, FrameSource};
use crate::notifier::Notifier;
use crate::store::{ReadingStore, SqliteStore, StoreError};
use crossbeam_channel::{bounded, Sender};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, info, warn};
use vapor_core::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Intervalo de aquisição inválido: {0}")]
    InvalidInterval(f64),

    #[error("Falha ao criar thread de aquisição: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Handle do serviço em execução.
pub struct CollectorService {
    stop_tx: Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl CollectorService {
    /// Abre porta e banco e inicia o loop.
    pub fn start<N>(config: &AppConfig, notifier: N) -> Result<Self, ServiceError>
    where
        N: Notifier + Send + 'static,
    {
        let interval = Duration::try_from_secs_f64(config.acquisition.interval_secs)
            .map_err(|_| ServiceError::InvalidInterval(config.acquisition.interval_secs))?;
        let store = SqliteStore::open(&config.storage.database_path)?;

        let mut connection = ConnectionManager::new(config.serial.clone());
        connection.open();
        if connection.state() != ConnectionState::Open {
            warn!("Porta {} indisponível no início do serviço", config.serial.port);
        }

        let acquisition = AcquisitionLoop::new(
            connection,
            store,
            notifier,
            config.alerts.clone(),
            interval,
        );
        Self::spawn(acquisition)
    }

    /// Inicia um loop já montado.
    pub fn spawn<S, R, N>(mut acquisition: AcquisitionLoop<S, R, N>) -> Result<Self, ServiceError>
    where
        S: FrameSource + Send + 'static,
        R: ReadingStore + Send + 'static,
        N: Notifier + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let worker = std::thread::Builder::new()
            .name("aquisicao".into())
            .spawn(move || acquisition.run(&stop_rx))?;

        Ok(Self {
            stop_tx,
            worker: Some(worker),
        })
    }

    /// Sinaliza parada e aguarda o loop encerrar.
    pub fn stop(mut self) {
        info!("Parando coletor...");
        let _ = self.stop_tx.try_send(());
        self.join();
    }

    /// Bloqueia até o loop terminar.
    pub fn wait(mut self) {
        self.join();
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Thread de aquisição terminou com pânico");
            }
        }
    }
}
