//! IDS Core - Main Entry Point
//!
//! Thin process shim: initializes logging, resolves directories, wires the
//! scan service, and drives one scan from a JSON parameter file. The real
//! transport layer (websocket/IPC) calls the same `api::control` entry
//! points this binary does.

mod api;
mod logic;

use std::sync::Arc;
use std::time::Duration;

use logic::config::AppConfig;
use logic::events::LogSink;
use logic::flow::capture::UnavailableCapture;
use logic::model::DiskArtifacts;
use logic::scan::ScanService;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    log::info!("Starting IDS core v{}...", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::from_env();
    log::info!("Models dir: {:?}", config.models_dir);
    log::info!("Log dir: {:?}", config.log_dir);

    let artifacts = DiskArtifacts::new(config.models_dir.clone());
    let service = ScanService::new(
        config,
        Arc::new(LogSink),
        Arc::new(UnavailableCapture),
        Arc::new(artifacts),
    );

    let params_path = match std::env::args().nth(1) {
        Some(p) => p,
        None => {
            eprintln!("Usage: ids-core <scan-params.json>");
            eprintln!("Example params: {{\"mode\":\"replay\",\"csv_path\":\"flows.csv\",\"delay_ms\":0}}");
            std::process::exit(2);
        }
    };

    let payload = match std::fs::read_to_string(&params_path) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                log::error!("Invalid params file {}: {}", params_path, e);
                std::process::exit(2);
            }
        },
        Err(e) => {
            log::error!("Cannot read params file {}: {}", params_path, e);
            std::process::exit(2);
        }
    };

    if let Err(e) = api::control::start_scan(&service, payload) {
        log::error!("Failed to start scan: {}", e);
        std::process::exit(1);
    }

    // Block until the worker drains its source or fails, then reap the
    // session. Ctrl+C simply kills the process; the session file for an
    // interrupted scan is written by the next clean run.
    while service.is_running() {
        std::thread::sleep(Duration::from_millis(200));
    }
    api::control::stop_scan(&service);

    log::info!("IDS core exiting");
}
