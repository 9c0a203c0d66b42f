//! Retention classification
//!
//! Each run is either a weekly or a daily backup. The two classes have
//! independent keep windows and independent sets of directories.

use std::fmt;

use chrono::{DateTime, Datelike, TimeZone};
use serde::Serialize;

use crate::config::Settings;

/// Retention class of a backup run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionClass {
    Daily,
    Weekly,
}

impl RetentionClass {
    /// Directory name suffix for this class
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

impl fmt::Display for RetentionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Class of a run and how many days its backups are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetentionPlan {
    pub class: RetentionClass,
    /// Passed through unchecked; zero or negative windows are allowed
    pub keep_days: i64,
}

/// Classify a run
///
/// When today's weekday (0 = Sunday .. 6 = Saturday) is the configured
/// weekly day the run is weekly and kept `weeks_to_keep * 7` days,
/// otherwise it is daily and kept `days_to_keep` days.
pub fn classify<Tz: TimeZone>(now: &DateTime<Tz>, settings: &Settings) -> RetentionPlan {
    let weekday = i64::from(now.weekday().num_days_from_sunday());

    if weekday == settings.day_of_week_to_keep {
        RetentionPlan {
            class: RetentionClass::Weekly,
            keep_days: settings.weeks_to_keep.saturating_mul(7),
        }
    } else {
        RetentionPlan {
            class: RetentionClass::Daily,
            keep_days: settings.days_to_keep,
        }
    }
}
