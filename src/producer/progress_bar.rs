//! Progress reporting for the per-input fit loop (feature `progress`).
//!
//! [`FitProgress`] owns the bar and keeps, across the inputs of one event, the number of
//! fits that produced a result and a smoothed duration of a single fit call
//! (`ema ← α·dt + (1–α)·ema`, seeded by the first fit).

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

const EMA_ALPHA: f64 = 0.2;

pub(crate) struct FitProgress {
    bar: ProgressBar,
    fitted: usize,
    dropped: usize,
    ema_ns: Option<f64>,
}

impl FitProgress {
    pub(crate) fn new(total: usize) -> Self {
        let bar = ProgressBar::new((total as u64).max(1));
        let style = ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} fits ({percent:>3}%) | {per_sec} | {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(200));
        Self::with_bar(bar)
    }

    fn with_bar(bar: ProgressBar) -> Self {
        FitProgress {
            bar,
            fitted: 0,
            dropped: 0,
            ema_ns: None,
        }
    }

    /// Run `fit` once, timing it and advancing the bar.
    pub(crate) fn track<T>(&mut self, fit: impl FnOnce() -> Option<T>) -> Option<T> {
        let start = Instant::now();
        let result = fit();
        self.record(start.elapsed(), result.is_some());
        result
    }

    fn record(&mut self, elapsed: Duration, fitted: bool) {
        if fitted {
            self.fitted += 1;
        } else {
            self.dropped += 1;
        }
        let dt = elapsed.as_nanos() as f64;
        self.ema_ns = Some(match self.ema_ns {
            Some(ema) => EMA_ALPHA * dt + (1.0 - EMA_ALPHA) * ema,
            None => dt,
        });

        self.bar.set_message(format!(
            "fitted {}, dropped {}, avg fit {}",
            self.fitted,
            self.dropped,
            fmt_dur(self.avg_fit())
        ));
        self.bar.inc(1);
    }

    fn avg_fit(&self) -> Duration {
        Duration::from_nanos(self.ema_ns.unwrap_or(0.0) as u64)
    }

    pub(crate) fn finish(self) {
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }
}

fn fmt_dur(d: Duration) -> String {
    let us = d.as_micros();
    if us < 1_000 {
        format!("{us}µs")
    } else if d.as_millis() < 1_000 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.2}s", d.as_secs_f32())
    }
}

#[cfg(test)]
mod progress_bar_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fmt_dur_scales() {
        assert_eq!(fmt_dur(Duration::from_micros(253)), "253µs");
        assert_eq!(fmt_dur(Duration::from_millis(42)), "42ms");
        assert_eq!(fmt_dur(Duration::from_millis(3140)), "3.14s");
    }

    #[test]
    fn test_first_fit_seeds_average() {
        let mut progress = FitProgress::with_bar(ProgressBar::hidden());
        assert_eq!(progress.avg_fit(), Duration::ZERO);

        progress.record(Duration::from_millis(10), true);
        assert_eq!(progress.avg_fit(), Duration::from_millis(10));

        progress.record(Duration::from_millis(20), false);
        assert_relative_eq!(progress.avg_fit().as_secs_f64(), 0.012, epsilon = 1e-9);
        assert_eq!((progress.fitted, progress.dropped), (1, 1));
        assert_eq!(progress.bar.position(), 2);
    }

    #[test]
    fn test_track_passes_result_through() {
        let mut progress = FitProgress::with_bar(ProgressBar::hidden());
        assert_eq!(progress.track(|| Some(3)), Some(3));
        assert_eq!(progress.track(|| None::<u8>), None);
        assert_eq!((progress.fitted, progress.dropped), (1, 1));
        progress.finish();
    }
}
