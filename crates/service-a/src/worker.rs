//! Fetch loop: poll the price source on a fixed cadence, keep a running
//! window of successful quotes, and report its mean once the window closes.

use std::path::PathBuf;
use std::time::Duration;

use crate::liveness;
use crate::price::PriceSource;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub currency: String,
    pub interval: Duration,
    pub avg_interval: Duration,
    pub liveness_path: PathBuf,
}

impl WorkerConfig {
    /// Fetch cycles per averaging window. Never zero.
    pub fn window_cycles(&self) -> u32 {
        let interval = self.interval.as_secs().max(1);
        (self.avg_interval.as_secs() / interval).max(1) as u32
    }

    fn window_minutes(&self) -> u64 {
        self.avg_interval.as_secs() / 60
    }
}

/// Summary of one completed averaging window.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowSummary {
    Average { mean: f64, samples: usize },
    Empty,
}

pub fn mean(prices: &[f64]) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<f64>() / prices.len() as f64)
}

pub struct Worker<'a, S: PriceSource + ?Sized> {
    source: &'a S,
    config: WorkerConfig,
    window: Vec<f64>,
    cycles: u32,
}

impl<'a, S: PriceSource + ?Sized> Worker<'a, S> {
    pub fn new(source: &'a S, config: WorkerConfig) -> Self {
        Self {
            source,
            config,
            window: Vec::new(),
            cycles: 0,
        }
    }

    /// One fetch. A successful quote joins the window and refreshes the
    /// liveness file; a failure is logged and skipped.
    pub fn tick(&mut self) -> Option<f64> {
        match self.source.fetch() {
            Ok(price) => {
                tracing::info!(
                    "Bitcoin price in {}: ${price:.2}",
                    self.config.currency.to_uppercase()
                );
                self.window.push(price);
                liveness::touch(&self.config.liveness_path);
                Some(price)
            }
            Err(e) => {
                tracing::error!("Error fetching price: {e}");
                None
            }
        }
    }

    /// Close the current window, log its mean, and start a fresh one.
    pub fn close_window(&mut self) -> WindowSummary {
        let prices = std::mem::take(&mut self.window);
        match mean(&prices) {
            Some(avg) => {
                tracing::info!(
                    "Average Bitcoin price over last {} minutes: ${avg:.2}",
                    self.config.window_minutes()
                );
                WindowSummary::Average {
                    mean: avg,
                    samples: prices.len(),
                }
            }
            None => {
                tracing::warn!("No prices collected during interval.");
                WindowSummary::Empty
            }
        }
    }

    /// One fetch. The fetch that completes a window also closes it, so the
    /// average is reported before the next sleep.
    pub fn cycle(&mut self) -> Option<WindowSummary> {
        self.tick();
        self.cycles += 1;
        if self.cycles < self.config.window_cycles() {
            return None;
        }
        self.cycles = 0;
        Some(self.close_window())
    }

    /// Run one full window: `window_cycles` cycles, each followed by `sleep`.
    pub fn run_window<F>(&mut self, mut sleep: F) -> WindowSummary
    where
        F: FnMut(Duration),
    {
        loop {
            let summary = self.cycle();
            sleep(self.config.interval);
            if let Some(summary) = summary {
                return summary;
            }
        }
    }

    /// Run forever.
    pub fn run<F>(&mut self, mut sleep: F) -> !
    where
        F: FnMut(Duration),
    {
        loop {
            self.run_window(&mut sleep);
        }
    }
}
