//! Entrega de alertas por e-mail.
//!
//! Falhas de entrega são reportadas ao chamador, que apenas as loga: um
//! alerta perdido nunca interrompe o ciclo e nunca é reenviado.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;
use tracing::{info, warn};
use vapor_core::config::EmailConfig;
use vapor_core::AlertEvent;

/// Erros do notificador.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Endereço inválido {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Mensagem inválida: {0}")]
    InvalidMessage(String),

    #[error("Transporte SMTP inválido: {0}")]
    Transport(String),

    #[error("Falha na entrega: {0}")]
    DeliveryFailed(String),
}

/// Canal de entrega de alertas.
pub trait Notifier {
    fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        (**self).notify(event)
    }
}

// ──────────────────────────────────────────────
// SMTP
// ──────────────────────────────────────────────

/// Notificador SMTP com autenticação e STARTTLS oportunista.
pub struct SmtpNotifier {
    transport: SmtpTransport,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        let from = parse_mailbox(config.sender_address())?;
        let to = parse_mailbox(&config.recipient)?;

        let timeout = Duration::try_from_secs_f64(config.timeout_secs)
            .map_err(|e| NotifyError::Transport(format!("timeout {}: {e}", config.timeout_secs)))?;

        let tls = TlsParameters::new(config.host.clone())
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let transport = SmtpTransport::builder_dangerous(config.host.as_str())
            .port(config.port)
            .tls(Tls::Opportunistic(tls))
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(timeout))
            .build();

        Ok(Self { transport, from, to })
    }

    /// Monta o envelope do alerta.
    pub fn build_message(&self, event: &AlertEvent) -> Result<Message, NotifyError> {
        envelope(&self.from, &self.to, event)
    }
}

impl Notifier for SmtpNotifier {
    fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        let message = self.build_message(event)?;
        self.transport
            .send(&message)
            .map_err(|e| NotifyError::DeliveryFailed(e.to_string()))?;
        info!("E-mail enviado: {} → {}", event.subject, self.to);
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

fn envelope(from: &Mailbox, to: &Mailbox, event: &AlertEvent) -> Result<Message, NotifyError> {
    Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(event.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(event.body.clone())
        .map_err(|e| NotifyError::InvalidMessage(e.to_string()))
}

// ──────────────────────────────────────────────
// Somente log
// ──────────────────────────────────────────────

/// Usado quando o e-mail está desabilitado ou mal configurado.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        warn!("ALERTA [{}] {}", event.subject, event.body.replace('\n', " "));
        Ok(())
    }
}
