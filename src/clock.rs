use std::cell::Cell;

use chrono::{DateTime, Utc};

/// Local time source, in fractional unix seconds.
pub trait Clock {
    fn now(&self) -> f64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        Utc::now().timestamp_millis() as f64 / 1000.0
    }
}

#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(now: f64) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: f64) {
        self.now.set(now);
    }

    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// `HH:MM:SS` in UTC; out-of-range inputs print as `--:--:--`.
pub fn format_time_of_day(unix_secs: f64) -> String {
    if !unix_secs.is_finite() {
        return "--:--:--".to_string();
    }
    let millis = (unix_secs * 1000.0).floor() as i64;
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(at) => at.format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(100.0);
        clock.advance(2.5);
        assert_eq!(clock.now(), 102.5);
        clock.set(10.0);
        assert_eq!(clock.now(), 10.0);
    }

    #[test]
    fn time_of_day_is_utc() {
        assert_eq!(format_time_of_day(0.0), "00:00:00");
        assert_eq!(format_time_of_day(3_661.9), "01:01:01");
        assert_eq!(format_time_of_day(f64::NAN), "--:--:--");
    }
}
