//! Configuração unificada via TOML.
//!
//! Um único `config.toml` ao lado do executável; variáveis de ambiente
//! (`SERIAL_PORT`, `EMAIL_*`) sobrescrevem os valores do arquivo.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Maior timeout aceito (serial e SMTP), em segundos.
pub const MAX_TIMEOUT_SECS: f64 = 3600.0;

/// Timeout positivo, finito e no máximo [`MAX_TIMEOUT_SECS`].
fn valid_timeout(secs: f64) -> bool {
    secs > 0.0 && secs <= MAX_TIMEOUT_SECS
}

/// Configuração da porta serial.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Caminho do dispositivo (ex: "/dev/ttyUSB0", "COM3")
    pub port: String,
    /// Baud rate (8N1)
    pub baud_rate: u32,
    /// Timeout de leitura de um frame (segundos)
    pub timeout_secs: f64,
    /// Reabrir a porta após erro de I/O
    pub reconnect: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".into(),
            baud_rate: 9600,
            timeout_secs: 1.0,
            reconnect: true,
        }
    }
}

/// Configuração do loop de aquisição.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Intervalo entre ciclos em segundos
    pub interval_secs: f64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30.0,
        }
    }
}

/// Configuração do armazenamento SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("serial_data.db"),
        }
    }
}

/// Regras de alerta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Vapor acima deste valor (estritamente) dispara alerta
    pub steam_threshold: f64,
    /// Intervalo mínimo entre alertas do mesmo tipo (0 = sem limite)
    pub cooldown_secs: u64,
    /// Envia também um relatório a cada leitura recebida
    pub report_every_reading: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            steam_threshold: 80.0,
            cooldown_secs: 0,
            report_every_reading: false,
        }
    }
}

/// Configuração de e-mail (SMTP com STARTTLS oportunista).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Remetente (vazio = `username`)
    pub sender: String,
    pub recipient: String,
    /// Timeout da conexão SMTP (segundos)
    pub timeout_secs: f64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: String::new(),
            port: 587,
            username: String::new(),
            password: String::new(),
            sender: String::new(),
            recipient: String::new(),
            timeout_secs: 10.0,
        }
    }
}

impl EmailConfig {
    /// Endereço efetivo do remetente.
    pub fn sender_address(&self) -> &str {
        if self.sender.is_empty() {
            &self.username
        } else {
            &self.sender
        }
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub acquisition: AcquisitionConfig,
    pub storage: StorageConfig,
    pub alerts: AlertConfig,
    pub email: EmailConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Aplica overrides das variáveis de ambiente do processo.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Aplica overrides a partir de uma função de lookup (`SERIAL_PORT`,
    /// `EMAIL_HOST`, `EMAIL_PORT`, `EMAIL_USER`, `EMAIL_PASS`,
    /// `EMAIL_RECIPIENT`). Valores vazios são ignorados.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SERIAL_PORT") {
            self.serial.port = v;
        }
        if let Some(v) = get("EMAIL_HOST") {
            self.email.host = v;
        }
        if let Some(v) = get("EMAIL_PORT") {
            match v.trim().parse::<u16>() {
                Ok(port) => self.email.port = port,
                Err(_) => warn!("EMAIL_PORT inválida ignorada: {v:?}"),
            }
        }
        if let Some(v) = get("EMAIL_USER") {
            self.email.username = v;
        }
        if let Some(v) = get("EMAIL_PASS") {
            self.email.password = v;
        }
        if let Some(v) = get("EMAIL_RECIPIENT") {
            self.email.recipient = v;
        }
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.serial.port.trim().is_empty() {
            errors.push("Porta serial não configurada".into());
        }
        if self.serial.baud_rate == 0 {
            errors.push("Baud rate não pode ser 0".into());
        }
        if !valid_timeout(self.serial.timeout_secs) {
            errors.push(format!(
                "Timeout serial inválido: {} (0–{MAX_TIMEOUT_SECS})",
                self.serial.timeout_secs
            ));
        }
        if !(0.1..=3600.0).contains(&self.acquisition.interval_secs) {
            errors.push(format!(
                "Intervalo de aquisição inválido: {} (0.1–3600.0)",
                self.acquisition.interval_secs
            ));
        }
        if self.storage.database_path.as_os_str().is_empty() {
            errors.push("Caminho do banco de dados vazio".into());
        }
        if !self.alerts.steam_threshold.is_finite() {
            errors.push(format!(
                "Limite de vapor inválido: {}",
                self.alerts.steam_threshold
            ));
        }
        if self.email.enabled {
            if self.email.host.trim().is_empty() {
                errors.push("Servidor SMTP não configurado (email.host)".into());
            }
            if self.email.port == 0 {
                errors.push("Porta SMTP não pode ser 0".into());
            }
            if self.email.recipient.trim().is_empty() {
                errors.push("Destinatário não configurado (email.recipient)".into());
            }
            if !valid_timeout(self.email.timeout_secs) {
                errors.push(format!(
                    "Timeout SMTP inválido: {} (0–{MAX_TIMEOUT_SECS})",
                    self.email.timeout_secs
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn configured() -> AppConfig {
        let mut config = AppConfig::default();
        config.email.host = "smtp.example.com".into();
        config.email.recipient = "operador@example.com".into();
        config
    }

    #[test]
    fn configured_defaults_are_valid() {
        let errors = configured().validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn default_requires_email_settings() {
        let errors = AppConfig::default().validate();
        assert_eq!(errors.len(), 2, "Erros: {:?}", errors);
    }

    #[test]
    fn disabled_email_skips_smtp_checks() {
        let mut config = AppConfig::default();
        config.email.enabled = false;
        assert!(config.validate().is_empty());
    }

    #[test]
    fn rejects_bad_interval_and_timeout() {
        let mut config = configured();
        config.acquisition.interval_secs = 0.0;
        config.serial.timeout_secs = -1.0;
        config.serial.baud_rate = 0;
        assert_eq!(config.validate().len(), 3);
    }

    #[test]
    fn rejects_out_of_range_serial_timeout() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e20] {
            let mut config = configured();
            config.serial.timeout_secs = bad;
            assert_eq!(config.validate().len(), 1, "timeout {bad}");
        }
    }

    #[test]
    fn rejects_out_of_range_email_timeout() {
        for bad in [0.0, -1.0, f64::NAN, 1e20] {
            let mut config = configured();
            config.email.timeout_secs = bad;
            assert_eq!(config.validate().len(), 1, "timeout {bad}");
        }
    }

    #[test]
    fn email_timeout_ignored_when_disabled() {
        let mut config = configured();
        config.email.enabled = false;
        config.email.timeout_secs = -1.0;
        assert!(config.validate().is_empty());
    }

    #[test]
    fn roundtrip_toml() {
        let config = configured();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.serial.port, parsed.serial.port);
        assert_eq!(config.email.recipient, parsed.email.recipient);
        assert_eq!(config.storage.database_path, parsed.storage.database_path);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[serial]
port = "/dev/ttyACM0"
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        // Outros campos devem ter valor padrão
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.acquisition.interval_secs, 30.0);
        assert_eq!(config.alerts.steam_threshold, 80.0);
        assert_eq!(config.email.port, 587);
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let env: HashMap<&str, &str> = [
            ("SERIAL_PORT", "/dev/ttyUSB1"),
            ("EMAIL_HOST", "smtp.gmail.com"),
            ("EMAIL_PORT", "465"),
            ("EMAIL_USER", "sensor@example.com"),
            ("EMAIL_PASS", "segredo"),
            ("EMAIL_RECIPIENT", "operador@example.com"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.serial.port, "/dev/ttyUSB1");
        assert_eq!(config.email.host, "smtp.gmail.com");
        assert_eq!(config.email.port, 465);
        assert_eq!(config.email.sender_address(), "sensor@example.com");
        assert_eq!(config.email.password, "segredo");
        assert_eq!(config.email.recipient, "operador@example.com");
    }

    #[test]
    fn invalid_or_empty_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides_from(|k| match k {
            "EMAIL_PORT" => Some("abc".into()),
            "SERIAL_PORT" => Some("  ".into()),
            _ => None,
        });
        assert_eq!(config.email.port, 587);
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
    }

    #[test]
    fn explicit_sender_wins_over_username() {
        let mut email = EmailConfig::default();
        email.username = "login@example.com".into();
        email.sender = "alertas@example.com".into();
        assert_eq!(email.sender_address(), "alertas@example.com");
    }
}
