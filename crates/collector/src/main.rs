//! # Vapor Collector
//!
//! Lê o sensor de vapor/movimento pela porta serial, grava cada leitura em
//! SQLite e envia alertas por e-mail quando os limites são ultrapassados.
//!
//! ## Uso
//! ```bash
//! vapor_collector                        # config.toml ao lado do executável
//! vapor_collector --config /etc/vapor.toml
//! vapor_collector --list-ports           # lista portas seriais e sai
//! ```

mod acquisition;
mod connection;
mod notifier;
mod service;
mod store;

use notifier::{LogNotifier, Notifier, SmtpNotifier};
use service::CollectorService;
use std::io::BufRead;
use std::path::PathBuf;
use tracing::{error, info, warn};
use vapor_core::config::EmailConfig;
use vapor_core::AppConfig;

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--list-ports") {
        list_ports();
        return;
    }

    // ── Carregar config ──
    let config_path = match args.iter().position(|a| a == "--config") {
        Some(idx) => match args.get(idx + 1) {
            Some(path) => PathBuf::from(path),
            None => {
                error!("--config requer um caminho");
                std::process::exit(2);
            }
        },
        None => AppConfig::default_path(),
    };
    let mut config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    config.apply_env_overrides();

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Configuração inválida: {e}");
        }
        std::process::exit(1);
    }

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   ♨ VAPOR COLLECTOR – ATIVO");
    println!("══════════════════════════════════════════════");
    println!("  Porta:     {} @ {} baud", config.serial.port, config.serial.baud_rate);
    println!("  Intervalo: {:.1}s", config.acquisition.interval_secs);
    println!("  Banco:     {}", config.storage.database_path.display());
    println!("  Limite:    vapor > {:.1}", config.alerts.steam_threshold);
    if config.email.enabled {
        println!("  Alertas:   {} via {}", config.email.recipient, config.email.host);
    } else {
        println!("  Alertas:   somente log");
    }
    println!("══════════════════════════════════════════════");
    println!();

    let notifier = build_notifier(&config.email);

    match CollectorService::start(&config, notifier) {
        Ok(service) => {
            info!("Coletor iniciado – digite 'q' + Enter para encerrar");
            if wait_for_quit() {
                service.stop();
            } else {
                // stdin fechado (ex: rodando como serviço): roda indefinidamente
                service.wait();
            }
        }
        Err(e) => {
            error!("Falha ao iniciar coletor: {e}");
            std::process::exit(1);
        }
    }
}

/// Retorna `true` quando o operador pede para sair; `false` no EOF.
fn wait_for_quit() -> bool {
    for line in std::io::stdin().lock().lines() {
        match line {
            Ok(l) if matches!(l.trim(), "q" | "quit" | "exit") => return true,
            Ok(_) => continue,
            Err(_) => break,
        }
    }
    false
}

/// SMTP quando habilitado e válido; caso contrário, alertas só no log.
fn build_notifier(email: &EmailConfig) -> Box<dyn Notifier + Send> {
    if !email.enabled {
        info!("E-mail desabilitado, alertas apenas no log");
        return Box::new(LogNotifier);
    }
    match SmtpNotifier::new(email) {
        Ok(smtp) => Box::new(smtp),
        Err(e) => {
            error!("Notificador SMTP indisponível ({e}); alertas apenas no log");
            Box::new(LogNotifier)
        }
    }
}

fn list_ports() {
    println!("Portas seriais disponíveis:");
    match serialport::available_ports() {
        Ok(ports) if ports.is_empty() => println!("  (nenhuma)"),
        Ok(ports) => {
            for port in ports {
                let kind = match &port.port_type {
                    serialport::SerialPortType::UsbPort(info) => format!(
                        "USB {:04x}:{:04x} {}",
                        info.vid,
                        info.pid,
                        info.product.as_deref().unwrap_or("")
                    ),
                    serialport::SerialPortType::BluetoothPort => "Bluetooth".into(),
                    serialport::SerialPortType::PciPort => "PCI".into(),
                    serialport::SerialPortType::Unknown => "Desconhecida".into(),
                };
                println!("  {} – {}", port.port_name, kind);
            }
        }
        Err(e) => error!("Falha ao listar portas: {e}"),
    }
}
