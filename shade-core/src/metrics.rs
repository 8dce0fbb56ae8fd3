//! Runtime metrics and instrumentation.
//!
//! Lightweight counters for gameplay events plus a per-tick budget monitor.
//! Counters are `AtomicU64` so a dashboard thread can read them while the
//! simulation thread writes; the timing ring buffer sits behind a
//! `parking_lot::Mutex` because it is only read for export.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Atomic counters for gameplay events.
pub struct ShadeCounters {
    /// Times a guard caught the player.
    pub catches: AtomicU64,
    /// Times a guard gained sight of the player.
    pub sightings: AtomicU64,
    /// Ledger saves.
    pub saves: AtomicU64,
    /// Ledger restores.
    pub restores: AtomicU64,
    /// Spells cast.
    pub spells_cast: AtomicU64,
    /// Successful pickpockets.
    pub pickpockets: AtomicU64,
}

impl ShadeCounters {
    /// Zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            catches: AtomicU64::new(0),
            sightings: AtomicU64::new(0),
            saves: AtomicU64::new(0),
            restores: AtomicU64::new(0),
            spells_cast: AtomicU64::new(0),
            pickpockets: AtomicU64::new(0),
        }
    }

    /// Bump a counter by one.
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            catches: self.catches.load(Ordering::Relaxed),
            sightings: self.sightings.load(Ordering::Relaxed),
            saves: self.saves.load(Ordering::Relaxed),
            restores: self.restores.load(Ordering::Relaxed),
            spells_cast: self.spells_cast.load(Ordering::Relaxed),
            pickpockets: self.pickpockets.load(Ordering::Relaxed),
        }
    }
}

impl Default for ShadeCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Catches.
    pub catches: u64,
    /// Sightings.
    pub sightings: u64,
    /// Saves.
    pub saves: u64,
    /// Restores.
    pub restores: u64,
    /// Spells cast.
    pub spells_cast: u64,
    /// Pickpockets.
    pub pickpockets: u64,
}

impl CounterSnapshot {
    /// Prometheus text exposition.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP shade_catches_total Times the player was caught\n\
             # TYPE shade_catches_total counter\n\
             shade_catches_total {}\n\
             # HELP shade_sightings_total Times a guard gained sight of the player\n\
             # TYPE shade_sightings_total counter\n\
             shade_sightings_total {}\n\
             # HELP shade_saves_total Ledger saves\n\
             # TYPE shade_saves_total counter\n\
             shade_saves_total {}\n\
             # HELP shade_restores_total Ledger restores\n\
             # TYPE shade_restores_total counter\n\
             shade_restores_total {}\n\
             # HELP shade_spells_cast_total Spells cast\n\
             # TYPE shade_spells_cast_total counter\n\
             shade_spells_cast_total {}\n\
             # HELP shade_pickpockets_total Successful pickpockets\n\
             # TYPE shade_pickpockets_total counter\n\
             shade_pickpockets_total {}\n",
            self.catches,
            self.sightings,
            self.saves,
            self.restores,
            self.spells_cast,
            self.pickpockets,
        )
    }
}

// ---------------------------------------------------------------------------
// Tick Budget Monitor
// ---------------------------------------------------------------------------

/// Ticks kept for the timing summary.
const WINDOW: usize = 256;

/// Rolling record of world tick durations against a fixed budget.
pub struct TickBudgetMonitor {
    budget_ms: f64,
    window: Mutex<TickWindow>,
}

#[derive(Default)]
struct TickWindow {
    samples: VecDeque<f64>,
    overruns: u64,
}

impl TickBudgetMonitor {
    /// A monitor with the given per-tick budget in milliseconds.
    #[must_use]
    pub fn new(budget_ms: f64) -> Self {
        Self {
            budget_ms,
            window: Mutex::new(TickWindow {
                samples: VecDeque::with_capacity(WINDOW),
                overruns: 0,
            }),
        }
    }

    /// Start timing a tick; the elapsed time is recorded when the guard drops.
    pub fn begin_tick(&self) -> TickGuard<'_> {
        TickGuard {
            monitor: self,
            start: Instant::now(),
        }
    }

    /// Record a tick duration in milliseconds.
    pub fn record(&self, ms: f64) {
        let mut w = self.window.lock();
        if w.samples.len() == WINDOW {
            w.samples.pop_front();
        }
        w.samples.push_back(ms);
        if ms > self.budget_ms {
            w.overruns += 1;
        }
    }

    /// Most recent tick duration, 0 before the first tick.
    #[must_use]
    pub fn last_tick_ms(&self) -> f64 {
        self.window.lock().samples.back().copied().unwrap_or(0.0)
    }

    /// Whether the most recent tick exceeded the budget.
    #[must_use]
    pub fn is_over_budget(&self) -> bool {
        self.last_tick_ms() > self.budget_ms
    }

    /// Ticks over budget since the world was created.
    #[must_use]
    pub fn overruns(&self) -> u64 {
        self.window.lock().overruns
    }

    /// The configured budget.
    #[must_use]
    pub fn budget_ms(&self) -> f64 {
        self.budget_ms
    }

    /// Median, 95th percentile and slowest tick over the window.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
    pub fn timings(&self) -> TickTimings {
        let w = self.window.lock();
        let mut sorted: Vec<f64> = w.samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        let at = |q: f64| sorted.get(((n as f64 * q) as usize).min(n.saturating_sub(1))).copied().unwrap_or(0.0);
        TickTimings {
            ticks: n,
            p50: at(0.5),
            p95: at(0.95),
            max: sorted.last().copied().unwrap_or(0.0),
            budget_ms: self.budget_ms,
            overruns: w.overruns,
        }
    }
}

/// Records elapsed time into its monitor on drop.
pub struct TickGuard<'a> {
    monitor: &'a TickBudgetMonitor,
    start: Instant,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.monitor.record(self.start.elapsed().as_secs_f64() * 1000.0);
    }
}

/// Tick durations in milliseconds over the monitor's window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickTimings {
    /// Ticks in the window.
    pub ticks: usize,
    /// Median.
    pub p50: f64,
    /// 95th percentile.
    pub p95: f64,
    /// Slowest tick.
    pub max: f64,
    /// Budget the ticks were measured against.
    pub budget_ms: f64,
    /// Ticks over budget, all time.
    pub overruns: u64,
}

impl TickTimings {
    /// One-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "ticks={} p50={:.3}ms p95={:.3}ms max={:.3}ms budget={:.1}ms overruns={}",
            self.ticks, self.p50, self.p95, self.max, self.budget_ms, self.overruns,
        )
    }
}

// ---------------------------------------------------------------------------
// Tracing Span Names
// ---------------------------------------------------------------------------

/// Span names used with `tracing::span!`.
pub mod spans {
    /// One world tick.
    pub const TICK: &str = "shade::tick";
    /// One guard's update.
    pub const GUARD_TICK: &str = "shade::guard::tick";
    /// Catch handling.
    pub const CATCH: &str = "shade::guard::catch";
    /// Ledger restore.
    pub const RESTORE: &str = "shade::ledger::restore";
    /// Trigger event dispatch.
    pub const TRIGGER: &str = "shade::trigger";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_snapshot_and_export() {
        let c = ShadeCounters::new();
        ShadeCounters::bump(&c.catches);
        ShadeCounters::bump(&c.catches);
        ShadeCounters::bump(&c.pickpockets);
        let snap = c.snapshot();
        assert_eq!(snap.catches, 2);
        assert_eq!(snap.pickpockets, 1);
        let prom = snap.to_prometheus();
        assert!(prom.contains("shade_catches_total 2"));
        assert!(prom.contains("# TYPE shade_saves_total counter"));
    }

    #[test]
    fn monitor_records_and_flags_overruns() {
        let monitor = TickBudgetMonitor::new(1.0);
        assert_eq!(monitor.last_tick_ms(), 0.0);
        assert!(!monitor.is_over_budget());
        monitor.record(0.2);
        monitor.record(1.5);
        assert!((monitor.last_tick_ms() - 1.5).abs() < 1e-9);
        assert!(monitor.is_over_budget());
        monitor.record(0.3);
        assert!(!monitor.is_over_budget());
        assert_eq!(monitor.overruns(), 1);
    }

    #[test]
    fn timings_cover_only_the_window() {
        let monitor = TickBudgetMonitor::new(1.0);
        for i in 0..300 {
            monitor.record(f64::from(i) * 0.005);
        }
        let t = monitor.timings();
        assert_eq!(t.ticks, WINDOW);
        assert!(t.p50 <= t.p95 && t.p95 <= t.max);
        assert!((t.max - 1.495).abs() < 1e-9);
        assert_eq!(t.overruns, 99);
        assert!(t.summary().contains("budget=1.0ms"));
        assert_eq!(TickBudgetMonitor::new(1.0).timings().ticks, 0);
    }

    #[test]
    fn tick_guard_records_on_drop() {
        let monitor = TickBudgetMonitor::new(100.0);
        drop(monitor.begin_tick());
        assert_eq!(monitor.timings().ticks, 1);
        assert!(!monitor.is_over_budget());
    }
}
