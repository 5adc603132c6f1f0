//! Wall-clock display and its periodic refresh.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::trace;

const WEEKDAYS: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

/// Source of "now" for the clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Reads system time and shifts it to a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// `HH:MM`, 24-hour, zero-padded.
pub fn format_time(at: &DateTime<FixedOffset>) -> String {
    at.format("%H:%M").to_string()
}

/// `MM/DD（曜）` with the weekday as a single kanji.
pub fn format_date(at: &DateTime<FixedOffset>) -> String {
    let weekday = WEEKDAYS[at.weekday().num_days_from_sunday() as usize];
    format!("{:02}/{:02}（{}）", at.month(), at.day(), weekday)
}

/// Formatted time and date for one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeDisplay {
    pub time: String,
    pub date: String,
}

impl TimeDisplay {
    pub fn at(instant: &DateTime<FixedOffset>) -> Self {
        Self { time: format_time(instant), date: format_date(instant) }
    }
}

/// Periodically publishes the current instant. The refresh task is aborted on drop.
#[derive(Debug)]
pub struct ClockTicker {
    rx: watch::Receiver<DateTime<FixedOffset>>,
    task: JoinHandle<()>,
}

impl ClockTicker {
    /// Start ticking every `period`. Must be called from within a tokio runtime.
    pub fn start(clock: Arc<dyn Clock>, period: Duration) -> Self {
        let (tx, rx) = watch::channel(clock.now());

        let task = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let now = clock.now();
                trace!(%now, "clock tick");
                if tx.send(now).is_err() {
                    break;
                }
            }
        });

        Self { rx, task }
    }

    pub fn subscribe(&self) -> watch::Receiver<DateTime<FixedOffset>> {
        self.rx.clone()
    }

    pub fn display(&self) -> TimeDisplay {
        TimeDisplay::at(&self.rx.borrow())
    }
}

impl Drop for ClockTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
