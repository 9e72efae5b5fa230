//! Persistência das leituras em SQLite.
//!
//! Cada `append` abre a conexão, grava dentro de uma transação e fecha a
//! conexão ao sair do escopo, em sucesso ou erro.

use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::info;
use vapor_core::{RecordId, SensorReading};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS sensor_data (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    steam    REAL    NOT NULL,
    movement INTEGER NOT NULL
)";

const INSERT_READING: &str = "INSERT INTO sensor_data (steam, movement) VALUES (?1, ?2)";

/// Erros do armazenamento.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Falha ao inicializar {path}: {source}")]
    Init {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Falha ao gravar leitura: {0}")]
    WriteFailed(#[from] rusqlite::Error),
}

/// Destino das leituras decodificadas.
pub trait ReadingStore {
    /// Grava a leitura; ao retornar `Ok` ela já está visível para leitura.
    fn append(&mut self, reading: &SensorReading) -> Result<RecordId, StoreError>;
}

/// Armazenamento SQLite em arquivo.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Cria a tabela `sensor_data` se necessário.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::Init {
            path: path.to_path_buf(),
            source,
        })?;
        conn.execute(CREATE_TABLE, [])
            .map_err(|source| StoreError::Init {
                path: path.to_path_buf(),
                source,
            })?;
        info!("Banco de dados pronto em {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl ReadingStore for SqliteStore {
    fn append(&mut self, reading: &SensorReading) -> Result<RecordId, StoreError> {
        let mut conn = Connection::open(&self.path)?;
        let tx = conn.transaction()?;
        tx.execute(INSERT_READING, params![reading.steam, reading.movement])?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(RecordId(id))
    }
}
