//! Boundary model of the trip itinerary and importance scoring.
//!
//! The itinerary is produced elsewhere; this crate only reads it.

use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};

/// Part of the day an activity belongs to. Ordering is morning < afternoon < evening.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Morning,
    Afternoon,
    Evening,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Morning, Period::Afternoon, Period::Evening];

    pub fn order(self) -> usize {
        match self {
            Self::Morning => 0,
            Self::Afternoon => 1,
            Self::Evening => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySlot {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    #[serde(default)]
    pub day_name: String,
    #[serde(default)]
    pub morning: Option<ActivitySlot>,
    #[serde(default)]
    pub afternoon: Option<ActivitySlot>,
    #[serde(default)]
    pub evening: Option<ActivitySlot>,
}

impl DayPlan {
    pub fn slot(&self, period: Period) -> Option<&ActivitySlot> {
        match period {
            Period::Morning => self.morning.as_ref(),
            Period::Afternoon => self.afternoon.as_ref(),
            Period::Evening => self.evening.as_ref(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Itinerary {
    pub destination: String,
    #[serde(default)]
    pub daily_plan: Vec<DayPlan>,
}

/// One scheduled activity, flattened out of the itinerary and scored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub day: u32,
    pub period: Period,
    pub title: String,
    pub description: String,
    pub importance: i32,
    /// Position of the day inside `daily_plan`.
    pub day_idx: usize,
}

impl Activity {
    /// `"Day {day} - {Period}: {title}"`
    pub fn caption(&self) -> String {
        format!("Day {} - {}: {}", self.day, self.period.label(), self.title)
    }

    /// Deterministic per-activity index seed: `day_idx*100 + period_idx*10`.
    pub fn base_index(&self) -> u64 {
        (self.day_idx as u64) * 100 + (self.period.order() as u64) * 10
    }
}

const LANDMARK_KEYWORDS: &[&str] = &[
    "famous",
    "landmark",
    "iconic",
    "monument",
    "museum",
    "cathedral",
    "castle",
    "palace",
    "temple",
    "beach",
    "mountain",
    "waterfall",
    "lake",
    "sunset",
    "panorama",
];

/// Importance of an activity within a trip of `trip_days` days.
pub fn importance(day: u32, trip_days: usize, period: Period, title: &str) -> i32 {
    let mut score = 0;
    if day == 1 || day as usize == trip_days {
        score += 3;
    }
    if matches!(period, Period::Morning | Period::Evening) {
        score += 1;
    }
    let title = title.to_lowercase();
    if LANDMARK_KEYWORDS.iter().any(|k| title.contains(k)) {
        score += 2;
    }
    score
}

impl Itinerary {
    pub fn from_json(text: &str) -> ReelResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| ReelError::validation(format!("invalid itinerary json: {e}")))
    }

    pub fn load(path: &Path) -> ReelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read itinerary '{}'", path.display()))?;
        Self::from_json(&text)
    }

    /// All non-empty activities in (day, period) order, scored.
    pub fn activities(&self) -> Vec<Activity> {
        let trip_days = self.daily_plan.len();
        let mut out = Vec::new();
        for (day_idx, plan) in self.daily_plan.iter().enumerate() {
            for period in Period::ALL {
                let Some(slot) = plan.slot(period) else {
                    continue;
                };
                let title = slot.title.trim();
                if title.is_empty() {
                    continue;
                }
                out.push(Activity {
                    day: plan.day,
                    period,
                    title: title.to_string(),
                    description: slot.description.trim().to_string(),
                    importance: importance(plan.day, trip_days, period, title),
                    day_idx,
                });
            }
        }
        out
    }

    /// Activity titles and descriptions joined into one lowercase blob.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for a in self.activities() {
            text.push_str(&a.title.to_lowercase());
            text.push(' ');
            if !a.description.is_empty() {
                text.push_str(&a.description.to_lowercase());
                text.push(' ');
            }
        }
        text
    }

    /// `"paris_france"` for `"Paris France"`.
    ///
    /// Only alphanumerics survive; every other run of characters, path separators and dots
    /// included, becomes a single `_`, so the slug is always a plain file name.
    pub fn destination_slug(&self) -> String {
        let slug = self
            .destination
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_");
        if slug.is_empty() {
            "trip".to_string()
        } else {
            slug
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/itinerary/itinerary.rs"]
mod tests;
