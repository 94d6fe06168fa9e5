//! Keyword-scored thematic mood for a trip, used as soundtrack metadata.

use serde::{Deserialize, Serialize};

use crate::itinerary::Itinerary;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Relaxing,
    Upbeat,
    Inspiring,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relaxing => "relaxing",
            Self::Upbeat => "upbeat",
            Self::Inspiring => "inspiring",
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const BEACH_KEYWORDS: &[&str] = &["beach", "ocean", "sea", "island", "coast", "resort"];
const ADVENTURE_KEYWORDS: &[&str] = &["mountain", "hiking", "trek", "adventure", "outdoor", "safari"];
const CULTURAL_KEYWORDS: &[&str] = &["museum", "history", "art", "culture", "temple", "heritage"];

fn occurrences(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().map(|k| text.matches(k).count()).sum()
}

/// Classify the mood of `destination` plus free itinerary text.
///
/// Beach-like words vote for relaxing, adventure-like for upbeat, cultural-like for inspiring.
/// A category must strictly win; every tie resolves to inspiring.
pub fn determine_mood(destination: &str, itinerary_text: &str) -> Mood {
    let text = format!("{} {}", destination.to_lowercase(), itinerary_text.to_lowercase());

    let beach = occurrences(&text, BEACH_KEYWORDS);
    let adventure = occurrences(&text, ADVENTURE_KEYWORDS);
    let cultural = occurrences(&text, CULTURAL_KEYWORDS);

    if beach > adventure && beach > cultural {
        Mood::Relaxing
    } else if adventure > beach && adventure > cultural {
        Mood::Upbeat
    } else {
        Mood::Inspiring
    }
}

pub fn itinerary_mood(itinerary: &Itinerary) -> Mood {
    determine_mood(&itinerary.destination, &itinerary.text())
}

#[cfg(test)]
#[path = "../tests/unit/mood/mood.rs"]
mod tests;
