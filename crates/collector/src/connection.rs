//! Gerenciador da conexão serial.
//!
//! Dono exclusivo do handle do dispositivo. Expõe apenas
//! `open` / `read_frame` / `close`; o handle nunca sai deste módulo.
//!
//! Estados: `Unopened → Open → Closed`. `Closed` é terminal. Com
//! `reconnect` habilitado, um erro de I/O descarta o handle e volta para
//! `Unopened`, e o próximo `read_frame` tenta abrir de novo.

use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use std::io::{self, ErrorKind, Read};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use vapor_core::config::SerialConfig;

/// Tamanho máximo de um frame sem `\n`.
pub const MAX_FRAME_LEN: usize = 256;

/// Timeout usado quando o configurado não é representável.
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(1);

/// Erros da conexão serial.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Falha ao abrir {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Erro de I/O na serial: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame não é UTF-8 válido")]
    InvalidUtf8,
}

/// Estado do handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unopened,
    Open,
    Closed,
}

/// Fonte de frames consumida pelo loop de aquisição.
pub trait FrameSource {
    /// Lê um frame; `None` se não houve dado (timeout, porta fechada, erro).
    fn read_frame(&mut self) -> Option<String>;

    /// Libera o recurso subjacente.
    fn close(&mut self) {}
}

/// Gerenciador da porta serial.
pub struct ConnectionManager {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
    state: ConnectionState,
}

impl ConnectionManager {
    pub fn new(config: SerialConfig) -> Self {
        Self {
            config,
            port: None,
            state: ConnectionState::Unopened,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn timeout(&self) -> Duration {
        match Duration::try_from_secs_f64(self.config.timeout_secs) {
            Ok(t) if !t.is_zero() => t,
            _ => {
                warn!(
                    "Timeout serial inválido ({}), usando {:?}",
                    self.config.timeout_secs, FALLBACK_TIMEOUT
                );
                FALLBACK_TIMEOUT
            }
        }
    }

    /// Abre o dispositivo em 8N1. Falhas são logadas e o handle fica vazio.
    pub fn open(&mut self) {
        if self.state == ConnectionState::Closed {
            debug!("Conexão já encerrada, ignorando open()");
            return;
        }
        match self.try_open() {
            Ok(port) => {
                info!(
                    "Porta {} aberta ({} baud, 8N1)",
                    self.config.port, self.config.baud_rate
                );
                self.port = Some(port);
                self.state = ConnectionState::Open;
            }
            Err(e) => {
                error!("{e}");
                self.port = None;
            }
        }
    }

    fn try_open(&self) -> Result<Box<dyn SerialPort>, ConnectionError> {
        serialport::new(&self.config.port, self.config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(self.timeout())
            .open()
            .map_err(|source| ConnectionError::Open {
                port: self.config.port.clone(),
                source,
            })
    }

    /// Libera o handle. Idempotente.
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            info!("Porta {} fechada", self.config.port);
        }
        self.state = ConnectionState::Closed;
    }

    fn read_open_port(&mut self) -> Result<Option<String>, ConnectionError> {
        let timeout = self.timeout();
        let Some(port) = self.port.as_mut() else {
            return Ok(None);
        };
        read_frame_from(port.as_mut(), timeout)
    }
}

impl FrameSource for ConnectionManager {
    fn read_frame(&mut self) -> Option<String> {
        if self.state == ConnectionState::Unopened && self.config.reconnect {
            self.open();
        }
        if self.state != ConnectionState::Open {
            return None;
        }

        match self.read_open_port() {
            Ok(line) => line,
            Err(ConnectionError::InvalidUtf8) => {
                warn!("Frame descartado: bytes não UTF-8");
                None
            }
            Err(e) => {
                error!("Erro lendo {}: {e}", self.config.port);
                if self.config.reconnect {
                    self.port = None;
                    self.state = ConnectionState::Unopened;
                    warn!("Handle descartado; nova tentativa de abertura no próximo ciclo");
                }
                None
            }
        }
    }

    fn close(&mut self) {
        ConnectionManager::close(self);
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        ConnectionManager::close(self);
    }
}

/// Canal de bytes com timeout ajustável por leitura e descarte da entrada.
pub trait FrameLink: Read {
    /// Timeout da próxima chamada a `read`.
    fn set_read_timeout(&mut self, timeout: Duration);

    /// Descarta bytes recebidos e ainda não lidos.
    fn discard_input(&mut self) -> io::Result<()>;
}

impl FrameLink for dyn SerialPort {
    fn set_read_timeout(&mut self, timeout: Duration) {
        if let Err(e) = self.set_timeout(timeout) {
            debug!("Falha ao ajustar timeout: {e}");
        }
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}

/// Lê um frame e descarta o restante da entrada, qualquer que seja o
/// resultado da leitura, para não acumular frames antigos.
pub fn read_frame_from<L: FrameLink + ?Sized>(
    link: &mut L,
    timeout: Duration,
) -> Result<Option<String>, ConnectionError> {
    let result = read_line(link, timeout);
    if let Err(e) = link.discard_input() {
        debug!("Falha ao limpar buffer de entrada: {e}");
    }
    result
}

/// Lê até o primeiro `\n`, até `timeout` ou até [`MAX_FRAME_LEN`] bytes.
///
/// Cada `read` recebe como timeout apenas o tempo restante, então a espera
/// total não passa de `timeout`. Retorna a linha sem espaços nas pontas, ou
/// `None` se nada foi recebido. Bytes após o `\n` são descartados.
pub fn read_line<L: FrameLink + ?Sized>(
    link: &mut L,
    timeout: Duration,
) -> Result<Option<String>, ConnectionError> {
    let deadline = Instant::now() + timeout;
    let mut buf: Vec<u8> = Vec::with_capacity(64);
    let mut chunk = [0u8; 64];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        link.set_read_timeout(remaining);

        match link.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.contains(&b'\n') || buf.len() >= MAX_FRAME_LEN {
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                break;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(ConnectionError::Io(e)),
        }
    }

    if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
        buf.truncate(pos);
    }
    buf.truncate(MAX_FRAME_LEN);

    let text = String::from_utf8(buf).map_err(|_| ConnectionError::InvalidUtf8)?;
    let line = text.trim();
    if line.is_empty() {
        Ok(None)
    } else {
        Ok(Some(line.to_string()))
    }
}
