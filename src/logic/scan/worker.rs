//! The scan loop.
//!
//! Runs on a dedicated thread. Flows are processed strictly in source
//! order, one at a time; a failure on one record is reported and skipped,
//! never aborting the session. Every exit path (cancellation, source
//! exhaustion, fatal error before the loop starts) ends with the terminal
//! `scan_summary` + `scan_status: stopped` pair.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::json;

use crate::logic::error::{ScanError, ScanResult};
use crate::logic::events::{names, EventSink};
use crate::logic::features::align;
use crate::logic::flow::capture::{CaptureConfig, CaptureEngine};
use crate::logic::flow::replay::{ReplaySource, DEFAULT_DELAY_MS};
use crate::logic::flow::{capture, FlowRecord, FlowStream};
use crate::logic::model::{ArtifactStore, InferenceAdapter, ModelKind};

use super::hardware::HardwareWindows;
use super::logfile::{self, FlowLog};
use super::session::{FlowCounter, ScanSession};
use super::{ScanMode, ScanParams};

/// Everything the worker needs, handed over at spawn time.
pub(crate) struct WorkerContext {
    pub params: ScanParams,
    pub events: Arc<dyn EventSink>,
    pub capture: Arc<dyn CaptureEngine>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub log_dir: PathBuf,
    pub running: Arc<AtomicBool>,
    pub windows: Arc<HardwareWindows>,
    pub counter: Arc<FlowCounter>,
}

pub(crate) fn run(ctx: WorkerContext) {
    let model = ModelKind::resolve_or_default(ctx.params.model.as_deref());
    let mode_label = ctx.params.mode.clone().unwrap_or_else(|| "live".to_string());

    log::info!(
        "Scan service started (mode: {}, model: {})",
        mode_label,
        model.id()
    );
    ctx.events.emit(
        names::SCAN_STATUS,
        json!({
            "state": "started",
            "mode": mode_label,
            "message": format!("Scan initialized ({} mode)", mode_label),
        }),
    );

    let mut session = ScanSession::new(&mode_label, model.id());

    if let Err(err) = scan_loop(&ctx, model, &mut session) {
        log::error!("Scan aborted before the flow loop: {}", err);
        ctx.events
            .emit(names::SCAN_ERROR, json!({ "error": err.to_string() }));
    }

    finalize(&ctx, &session);
}

fn scan_loop(
    ctx: &WorkerContext,
    model: ModelKind,
    session: &mut ScanSession,
) -> ScanResult<()> {
    let mode = ScanMode::parse(ctx.params.mode.as_deref())?;
    let adapter = ctx.artifacts.load(model)?;
    let flows = build_source(ctx, mode)?;

    let mut last_mark = Instant::now();

    for flow in flows {
        // Cooperative cancellation, checked once per record. In-flight
        // capture or inference calls are never interrupted.
        if !ctx.running.load(Ordering::SeqCst) {
            log::info!("Stop flag observed; ending scan loop");
            break;
        }

        let flow_number = ctx.counter.next();
        session.flow_count = flow_number;

        match process_flow(
            ctx,
            &adapter,
            mode,
            flow.as_ref(),
            flow_number,
            &mut last_mark,
            session,
        ) {
            Ok(()) => {}
            Err(err) => {
                log::error!("Error processing flow #{}: {}", flow_number, err);
                ctx.events.emit(
                    names::SCAN_ERROR,
                    json!({ "flow_number": flow_number, "error": err.to_string() }),
                );
            }
        }

        if flow_number % 100 == 0 {
            match session.accuracy() {
                Some(accuracy) if mode == ScanMode::Replay => {
                    log::info!(
                        "Processed {} flows, Accuracy: {:.2}%",
                        flow_number,
                        accuracy
                    );
                }
                _ => log::info!("Processed {} flows", flow_number),
            }
        }
    }

    Ok(())
}

/// Resolve the flow source for the requested mode.
fn build_source(ctx: &WorkerContext, mode: ScanMode) -> ScanResult<FlowStream> {
    match mode {
        ScanMode::Replay => {
            let csv_path = ctx
                .params
                .csv_path
                .as_deref()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| {
                    ScanError::Configuration("missing csv_path parameter".to_string())
                })?;
            let source = ReplaySource::open(
                csv_path,
                ctx.params.delay_ms.unwrap_or(DEFAULT_DELAY_MS),
                ctx.params.max_flows,
                ctx.params.start_row,
                ctx.params.end_row,
            )?;
            log::info!("Replay source ready: {} flows", source.len());
            Ok(Box::new(
                source.map(|f| Box::new(f) as Box<dyn FlowRecord + Send>),
            ))
        }
        ScanMode::Live => {
            let interface = capture::resolve_interface(ctx.params.interface.as_deref())?;
            log::info!("Capturing live traffic on '{}'", interface);
            let flows = ctx.capture.capture(&interface, &CaptureConfig::default())?;
            Ok(Box::new(
                flows.map(|f| Box::new(f) as Box<dyn FlowRecord + Send>),
            ))
        }
    }
}

fn process_flow(
    ctx: &WorkerContext,
    adapter: &InferenceAdapter,
    mode: ScanMode,
    flow: &dyn FlowRecord,
    flow_number: u64,
    last_mark: &mut Instant,
    session: &mut ScanSession,
) -> ScanResult<()> {
    let packets = flow.packets();
    session.packet_count += packets;

    let features = align(flow);

    let inference_start = Instant::now();
    let (predicted_label, confidence) = adapter.predict_with_confidence(&features)?;
    let inference_latency = inference_start.elapsed().as_secs_f64();
    session.latency_sum_secs += inference_latency;

    // Inter-flow throughput: this flow's packets over the wall-clock gap
    // since the previous flow completed.
    let now = Instant::now();
    let gap_secs = now.duration_since(*last_mark).as_secs_f64();
    let throughput = if gap_secs > 0.0 {
        packets as f64 / gap_secs
    } else {
        0.0
    };
    *last_mark = now;

    let (cpu_usage, memory_usage) = ctx.windows.averages();

    // Ground truth only exists on replayed flows; unlabeled records do not
    // contribute to accuracy.
    let true_label = if mode == ScanMode::Replay {
        flow.label()
    } else {
        None
    };
    let accuracy = true_label
        .as_deref()
        .map(|label| session.record_prediction(label, &predicted_label));

    let timestamp = Utc::now();
    let mut payload = json!({
        "flow_number": flow_number,
        "predicted_label": predicted_label,
        "confidence": confidence,
        "inference_latency": inference_latency,
        "throughput": throughput,
        "cpu_usage_percent": cpu_usage,
        "memory_usage_percent": memory_usage,
    });
    if mode == ScanMode::Replay {
        payload["true_label"] = json!(true_label);
        payload["accuracy"] = json!(accuracy);
    }
    ctx.events.emit(names::NETWORK_DATA, payload);

    session.logs.push(FlowLog {
        timestamp,
        flow_number,
        predicted_label,
        confidence,
        inference_latency,
        throughput,
        cpu_usage_percent: cpu_usage,
        memory_usage_percent: memory_usage,
        flow: flow.descriptor(),
        true_label,
        accuracy,
    });
    session.last_flow_at = Some(timestamp);

    Ok(())
}

/// Terminal path for every session, successful or not.
fn finalize(ctx: &WorkerContext, session: &ScanSession) {
    ctx.running.store(false, Ordering::SeqCst);

    let summary = session.summary(ctx.windows.totals(), Utc::now());

    if let (Some(correct), Some(total), Some(accuracy)) = (
        summary.correct_predictions,
        summary.total_predictions,
        summary.accuracy,
    ) {
        log::info!(
            "Final results: {}/{} correct ({:.2}%)",
            correct,
            total,
            accuracy
        );
    }

    match serde_json::to_value(&summary) {
        Ok(payload) => ctx.events.emit(names::SCAN_SUMMARY, payload),
        Err(e) => log::error!("Failed to serialize scan summary: {}", e),
    }

    match logfile::write_session_log(&ctx.log_dir, &summary, &session.logs) {
        Ok(path) => log::info!("Session log written to {:?}", path),
        Err(e) => log::error!("Failed to write session log: {}", e),
    }

    ctx.events.emit(
        names::SCAN_STATUS,
        json!({ "state": "stopped", "message": "Scan terminated" }),
    );
    log::info!("Scan loop exited after {} flows", session.flow_count);
}
