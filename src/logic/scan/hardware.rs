//! Hardware usage monitor.
//!
//! Runs beside the worker, sampling CPU once per second and memory once per
//! two seconds into fixed-capacity sliding windows. Per-flow logs read the
//! window averages; the session summary reads the sum/max/count
//! accumulators. Samples are eventually consistent with true instantaneous
//! usage, not synchronized to flow boundaries.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use sysinfo::System;

/// Samples retained per window; older samples are evicted.
pub const WINDOW_CAPACITY: usize = 10;

const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Default)]
struct HwState {
    cpu_window: VecDeque<f32>,
    memory_window: VecDeque<f32>,
    cpu_sum: f64,
    cpu_peak: f32,
    cpu_count: u64,
    memory_sum: f64,
    memory_peak: f32,
    memory_count: u64,
}

/// Sliding windows + accumulators shared between monitor and worker.
/// Critical sections are append/read only.
pub struct HardwareWindows {
    state: Mutex<HwState>,
}

/// Aggregates for the session summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct HardwareTotals {
    pub cpu_avg: f32,
    pub cpu_peak: f32,
    pub memory_avg: f32,
    pub memory_peak: f32,
}

impl HardwareWindows {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HwState::default()),
        }
    }

    pub fn push_cpu(&self, sample: f32) {
        let mut state = self.state.lock();
        if state.cpu_window.len() == WINDOW_CAPACITY {
            state.cpu_window.pop_front();
        }
        state.cpu_window.push_back(sample);
        state.cpu_sum += sample as f64;
        state.cpu_count += 1;
        if sample > state.cpu_peak {
            state.cpu_peak = sample;
        }
    }

    pub fn push_memory(&self, sample: f32) {
        let mut state = self.state.lock();
        if state.memory_window.len() == WINDOW_CAPACITY {
            state.memory_window.pop_front();
        }
        state.memory_window.push_back(sample);
        state.memory_sum += sample as f64;
        state.memory_count += 1;
        if sample > state.memory_peak {
            state.memory_peak = sample;
        }
    }

    /// Most recent window averages (cpu, memory); 0 while a window is empty.
    pub fn averages(&self) -> (f32, f32) {
        let state = self.state.lock();
        (
            window_mean(&state.cpu_window),
            window_mean(&state.memory_window),
        )
    }

    pub fn totals(&self) -> HardwareTotals {
        let state = self.state.lock();
        HardwareTotals {
            cpu_avg: if state.cpu_count > 0 {
                (state.cpu_sum / state.cpu_count as f64) as f32
            } else {
                0.0
            },
            cpu_peak: state.cpu_peak,
            memory_avg: if state.memory_count > 0 {
                (state.memory_sum / state.memory_count as f64) as f32
            } else {
                0.0
            },
            memory_peak: state.memory_peak,
        }
    }
}

fn window_mean(window: &VecDeque<f32>) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    window.iter().sum::<f32>() / window.len() as f32
}

/// Spawn the monitor task. Exits when the session flag clears.
pub fn spawn_monitor(
    running: Arc<AtomicBool>,
    windows: Arc<HardwareWindows>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        log::info!("Hardware monitor started");
        let mut sys = System::new();
        let mut tick: u64 = 0;

        while running.load(Ordering::SeqCst) {
            sys.refresh_cpu_usage();
            windows.push_cpu(sys.global_cpu_info().cpu_usage());

            // Memory moves slower; sample it every other tick.
            if tick % 2 == 0 {
                sys.refresh_memory();
                let total = sys.total_memory();
                let percent = if total > 0 {
                    (sys.used_memory() as f64 / total as f64 * 100.0) as f32
                } else {
                    0.0
                };
                windows.push_memory(percent);
            }

            tick += 1;
            thread::sleep(SAMPLE_INTERVAL);
        }
        log::info!("Hardware monitor stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_evicts_oldest_beyond_capacity() {
        let windows = HardwareWindows::new();
        for i in 0..15 {
            windows.push_cpu(i as f32);
        }

        // Window holds samples 5..=14 only.
        let (cpu_avg, _) = windows.averages();
        assert!((cpu_avg - 9.5).abs() < 1e-6);

        // Accumulators still see every sample.
        let totals = windows.totals();
        assert!((totals.cpu_avg - 7.0).abs() < 1e-6);
        assert_eq!(totals.cpu_peak, 14.0);
    }

    #[test]
    fn test_empty_windows_report_zero() {
        let windows = HardwareWindows::new();
        assert_eq!(windows.averages(), (0.0, 0.0));
        let totals = windows.totals();
        assert_eq!(totals.cpu_avg, 0.0);
        assert_eq!(totals.memory_peak, 0.0);
    }

    #[test]
    fn test_memory_window_tracks_separately() {
        let windows = HardwareWindows::new();
        windows.push_cpu(50.0);
        windows.push_memory(30.0);
        windows.push_memory(40.0);

        let (cpu, mem) = windows.averages();
        assert_eq!(cpu, 50.0);
        assert!((mem - 35.0).abs() < 1e-6);
        assert_eq!(windows.totals().memory_peak, 40.0);
    }

    #[test]
    fn test_monitor_exits_on_cleared_flag() {
        let running = Arc::new(AtomicBool::new(true));
        let windows = Arc::new(HardwareWindows::new());
        let handle = spawn_monitor(running.clone(), windows);

        std::thread::sleep(Duration::from_millis(100));
        running.store(false, Ordering::SeqCst);
        // The monitor observes the flag within one sample interval.
        let deadline = std::time::Instant::now() + Duration::from_secs(3);
        while !handle.is_finished() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(handle.is_finished());
        handle.join().unwrap();
    }
}
