use std::collections::BTreeMap;
use std::time::Instant;

/// Per-batch diagnostic counters and stage timings.
///
/// Purely observational: nothing here feeds back into the results.
#[derive(Debug)]
pub struct BatchStats {
    counters: BTreeMap<&'static str, usize>,
    timings: BTreeMap<&'static str, Vec<f64>>,
    start_time: Instant,
}

impl BatchStats {
    pub fn new() -> Self {
        Self {
            counters: BTreeMap::new(),
            timings: BTreeMap::new(),
            start_time: Instant::now(),
        }
    }

    pub fn count(&mut self, name: &'static str) {
        *self.counters.entry(name).or_default() += 1;
    }

    #[cfg(test)]
    fn get(&self, name: &str) -> usize {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// Runs `f` and records its wall time under `stage`.
    pub fn time<T>(&mut self, stage: &'static str, f: impl FnOnce() -> T) -> T {
        let started = Instant::now();
        let out = f();
        self.timings
            .entry(stage)
            .or_default()
            .push(started.elapsed().as_secs_f64() * 1000.0);
        out
    }

    #[cfg(test)]
    fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// One-paragraph report, or `None` for an empty batch.
    pub fn summary_string(&self, pass: &str) -> Option<String> {
        if self.counters.is_empty() {
            return None;
        }
        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut parts: Vec<String> = self
            .counters
            .iter()
            .map(|(name, n)| format!("{name}={n}"))
            .collect();
        for (stage, durations) in &self.timings {
            let total: f64 = durations.iter().sum();
            let avg = total / durations.len().max(1) as f64;
            parts.push(format!("{stage} avg {avg:.1}ms"));
        }
        Some(format!(
            "{pass} batch done in {elapsed_ms:.0}ms: {}",
            parts.join(", ")
        ))
    }

    pub fn log_summary(&self, pass: &str) {
        if let Some(text) = self.summary_string(pass) {
            log::info!("{text}");
        }
    }
}

impl Default for BatchStats {
    fn default() -> Self {
        Self::new()
    }
}
