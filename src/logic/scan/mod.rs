//! Scan Orchestrator - session lifecycle.
//!
//! Owns the single session slot. `start` spawns the worker and the hardware
//! monitor; `stop` clears the shared flag and waits a bounded interval for
//! both to observe it. At most one session is active at a time.

pub mod hardware;
pub mod logfile;
pub mod session;
mod worker;


use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::json;

use crate::logic::config::AppConfig;
use crate::logic::error::{ScanError, ScanResult};
use crate::logic::events::{names, EventSink};
use crate::logic::flow::capture::CaptureEngine;
use crate::logic::model::ArtifactStore;

use hardware::HardwareWindows;
use session::FlowCounter;
use worker::WorkerContext;

/// How long `stop()` waits for the worker and monitor to exit. A stuck
/// capture or inference call cannot hang the caller past this bound; the
/// tasks are detached after it.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Parameters of one scan request, as sent by the transport layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    /// "live" (default) or "replay".
    pub mode: Option<String>,
    pub model: Option<String>,
    // Live mode
    pub interface: Option<String>,
    // Replay mode
    pub csv_path: Option<String>,
    pub delay_ms: Option<u64>,
    pub max_flows: Option<usize>,
    pub start_row: Option<usize>,
    pub end_row: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanMode {
    Live,
    Replay,
}

impl ScanMode {
    fn parse(raw: Option<&str>) -> ScanResult<Self> {
        match raw.unwrap_or("live") {
            "live" => Ok(Self::Live),
            "replay" => Ok(Self::Replay),
            other => Err(ScanError::Configuration(format!("unknown mode: {}", other))),
        }
    }
}

/// Handles of one spawned session.
struct SessionHandle {
    running: Arc<AtomicBool>,
    worker: thread::JoinHandle<()>,
    monitor: thread::JoinHandle<()>,
}

impl SessionHandle {
    /// Active until the worker both cleared the flag and returned; the gap
    /// between the two is covered so a racing `start` cannot double-spawn.
    fn is_active(&self) -> bool {
        self.running.load(Ordering::SeqCst) || !self.worker.is_finished()
    }

    fn is_finished(&self) -> bool {
        self.worker.is_finished() && self.monitor.is_finished()
    }

    fn reap(self) {
        let _ = self.worker.join();
        let _ = self.monitor.join();
    }
}

/// The flow classification orchestrator.
pub struct ScanService {
    config: AppConfig,
    events: Arc<dyn EventSink>,
    capture: Arc<dyn CaptureEngine>,
    artifacts: Arc<dyn ArtifactStore>,
    session: parking_lot::Mutex<Option<SessionHandle>>,
}

impl ScanService {
    pub fn new(
        config: AppConfig,
        events: Arc<dyn EventSink>,
        capture: Arc<dyn CaptureEngine>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            config,
            events,
            capture,
            artifacts,
            session: parking_lot::Mutex::new(None),
        }
    }

    /// Start a scan session. A start while one is active is a no-op that
    /// reports `already_running`, not an error.
    pub fn start(&self, params: ScanParams) {
        let mut slot = self.session.lock();

        if let Some(handle) = slot.as_ref() {
            if handle.is_active() {
                log::warn!("Scan already running; ignoring start request");
                self.events.emit(
                    names::SCAN_STATUS,
                    json!({ "state": "already_running", "message": "Scan already active" }),
                );
                return;
            }
        }
        // The previous session drained its source on its own; collect it.
        if let Some(handle) = slot.take() {
            handle.reap();
        }

        log::info!("Scan service starting with params: {:?}", params);

        let running = Arc::new(AtomicBool::new(true));
        let windows = Arc::new(HardwareWindows::new());
        let counter = Arc::new(FlowCounter::new());

        let monitor = hardware::spawn_monitor(running.clone(), windows.clone());

        let ctx = WorkerContext {
            params,
            events: self.events.clone(),
            capture: self.capture.clone(),
            artifacts: self.artifacts.clone(),
            log_dir: self.config.log_dir.clone(),
            running: running.clone(),
            windows,
            counter,
        };
        let worker = thread::spawn(move || worker::run(ctx));

        *slot = Some(SessionHandle {
            running,
            worker,
            monitor,
        });
    }

    /// Stop the active session. No-op when nothing is running; never emits
    /// a second summary.
    pub fn stop(&self) {
        let mut slot = self.session.lock();
        let Some(handle) = slot.take() else {
            log::info!("Scan is not running; ignoring stop request");
            return;
        };

        log::info!("Stopping scan service...");
        handle.running.store(false, Ordering::SeqCst);

        let deadline = Instant::now() + STOP_TIMEOUT;
        while Instant::now() < deadline && !handle.is_finished() {
            thread::sleep(Duration::from_millis(50));
        }

        if handle.is_finished() {
            handle.reap();
            log::info!("Scan service fully stopped");
        } else {
            // The flag stays cleared, so a stuck task still exits at its
            // next iteration boundary; we just no longer wait for it.
            log::warn!(
                "Scan tasks did not exit within {:?}; detaching",
                STOP_TIMEOUT
            );
        }
    }

    pub fn is_running(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .map(|handle| handle.is_active())
            .unwrap_or(false)
    }
}
