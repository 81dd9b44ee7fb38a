//! Text presentation of the active task's timer.
//!
//! Nothing here draws anything. [`HudSnapshot`] captures what a host needs
//! to render the widget: labels, duration text, and which controls apply.

use std::fmt;

use chrono::{Local, TimeZone};
use taskhud_proto::{TaskId, TaskTimerRecord};

use crate::timer::model;

/// Shown when a timer has logged something, but less than a minute.
pub const LESS_THAN_A_MINUTE: &str = "Less than a minute";

/// Shown when a timer has logged nothing at all.
pub const NOTHING_LOGGED: &str = "--";

/// Options for [`format_duration`].
#[derive(Debug, Clone, Copy)]
pub struct DurationFormat {
    /// Include a seconds component.
    pub seconds: bool,
    /// Text used when every included component is zero.
    pub zero_text: &'static str,
}

impl Default for DurationFormat {
    fn default() -> Self {
        Self {
            seconds: true,
            zero_text: "0 seconds",
        }
    }
}

impl DurationFormat {
    /// Whole minutes and up, with `zero_text` below one minute.
    #[must_use]
    pub const fn minutes(zero_text: &'static str) -> Self {
        Self {
            seconds: false,
            zero_text,
        }
    }
}

fn unit(count: u64, name: &str) -> String {
    if count == 1 {
        format!("1 {name}")
    } else {
        format!("{count} {name}s")
    }
}

/// Formats `secs` as `"2 hours, 5 minutes"`.
#[must_use]
pub fn format_duration(secs: u64, format: DurationFormat) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(unit(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(unit(minutes, "minute"));
    }
    if format.seconds && seconds > 0 {
        parts.push(unit(seconds, "second"));
    }

    if parts.is_empty() {
        format.zero_text.to_string()
    } else {
        parts.join(", ")
    }
}

/// Formats an epoch-millisecond timestamp as local "HH:MM".
#[must_use]
pub fn format_clock_time(ms: u64) -> String {
    let secs = i64::try_from(ms / 1000).unwrap_or(i64::MAX);
    let nsecs = u32::try_from((ms % 1000) * 1_000_000).unwrap_or(0);
    match Local.timestamp_opt(secs, nsecs) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M").to_string(),
        _ => "??:??".to_string(),
    }
}

/// Whether the timer is logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// A segment is running.
    Running,
    /// Nothing is running; pending time may still be non-zero.
    Paused,
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

/// A control the host should offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Start logging.
    Start,
    /// Pause logging.
    Pause,
    /// Arm the pomodoro target.
    ArmTarget,
    /// Stop and save logged time.
    Stop,
    /// Reset the timer.
    Reset,
}

impl Control {
    /// Tooltip text for the control.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Start => "Start Logging",
            Self::Pause => "Pause Logging",
            Self::ArmTarget => "Set Pomodoro Timer",
            Self::Stop => "Stop and Save Logged Time",
            Self::Reset => "Reset Timer",
        }
    }
}

/// Everything needed to render the widget at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct HudSnapshot {
    /// Task identifier.
    pub task_id: TaskId,
    /// Task title.
    pub title: String,
    /// Running or paused.
    pub state: TimerState,
    /// Epoch ms the running segment began, if running.
    pub running_since: Option<u64>,
    /// Seconds logged since the last reset.
    pub elapsed_seconds: f64,
    /// Logged-time text.
    pub progress: String,
    /// `"Target: ..."` text when a target is armed.
    pub target: Option<String>,
    /// Whether the current target has already notified.
    pub notified: bool,
    /// Controls to offer, in display order.
    pub controls: Vec<Control>,
}

impl HudSnapshot {
    /// Captures `record` as of `now_ms`.
    #[must_use]
    pub fn capture(record: &TaskTimerRecord, now_ms: u64, notified: bool) -> Self {
        let running = model::is_running(record);
        let elapsed_ms = model::elapsed_ms(record, now_ms);

        let progress = if elapsed_ms > 0 {
            format_duration(
                elapsed_ms / 1000,
                DurationFormat::minutes(LESS_THAN_A_MINUTE),
            )
        } else {
            NOTHING_LOGGED.to_string()
        };

        let target = record.target_ms().map(|ms| {
            format!(
                "Target: {}",
                format_duration(ms / 1000, DurationFormat::minutes("0 minutes"))
            )
        });

        let mut controls = vec![
            if running { Control::Pause } else { Control::Start },
            Control::ArmTarget,
            Control::Stop,
        ];
        if elapsed_ms > 0 {
            controls.push(Control::Reset);
        }

        Self {
            task_id: record.id.clone(),
            title: record.title.clone(),
            state: if running {
                TimerState::Running
            } else {
                TimerState::Paused
            },
            running_since: running.then_some(record.timer_last_start),
            elapsed_seconds: model::elapsed_seconds(record, now_ms),
            progress,
            target,
            notified,
            controls,
        }
    }
}

impl fmt::Display for HudSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | Logging ({})", self.title, self.state)?;
        if let Some(since) = self.running_since {
            write!(f, " since {}", format_clock_time(since))?;
        }
        if let Some(target) = &self.target {
            write!(f, " {target}")?;
        }
        write!(f, " | {}", self.progress)
    }
}
