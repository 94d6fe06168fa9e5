use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

/// Coarse category of an activity, used to bias queries and prompts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Food,
    Cultural,
    Nature,
    Religious,
    Coastal,
    Nightlife,
    Shopping,
    General,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Cultural => "cultural",
            Self::Nature => "nature",
            Self::Religious => "religious",
            Self::Coastal => "coastal",
            Self::Nightlife => "nightlife",
            Self::Shopping => "shopping",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// First match wins.
const CLASSIFIERS: &[(ActivityType, &[&str])] = &[
    (
        ActivityType::Food,
        &["restaurant", "food", "dining", "café", "cafe", "eat"],
    ),
    (
        ActivityType::Cultural,
        &["museum", "gallery", "exhibition", "art"],
    ),
    (
        ActivityType::Nature,
        &["park", "garden", "nature", "hike", "trek", "mountain"],
    ),
    (
        ActivityType::Religious,
        &["temple", "shrine", "church", "cathedral", "mosque", "religious"],
    ),
    (ActivityType::Coastal, &["beach", "sea", "ocean", "coast"]),
    (
        ActivityType::Nightlife,
        &["nightlife", "club", "bar", "pub", "entertainment"],
    ),
    (
        ActivityType::Shopping,
        &["shopping", "mall", "market", "store"],
    ),
];

pub fn classify(activity: &str) -> ActivityType {
    let lower = activity.to_lowercase();
    CLASSIFIERS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(ty, _)| *ty)
        .unwrap_or(ActivityType::General)
}

/// Three generic phrasings plus one category-specific phrasing where one exists.
pub fn candidate_queries(location: &str, activity: &str, ty: ActivityType) -> Vec<String> {
    let location = location.trim();
    let activity = activity.trim();

    let mut queries = vec![
        format!("{activity} in {location}"),
        format!("{location} {activity} tourist attraction"),
        format!("{activity} {location} travel photography"),
    ];

    let extra = match ty {
        ActivityType::Food => Some(format!("{location} cuisine {activity}")),
        ActivityType::Cultural => Some(format!("{activity} cultural site {location}")),
        ActivityType::Nature => Some(format!("{activity} nature {location} landscape")),
        ActivityType::Religious => Some(format!("{activity} religious site {location}")),
        ActivityType::Coastal => Some(format!("{activity} beach {location}")),
        ActivityType::Nightlife | ActivityType::Shopping | ActivityType::General => None,
    };
    queries.extend(extra);
    queries
}

/// Fresh query used once every phrasing for an activity has been issued.
pub fn exhausted_variant(location: &str, activity: &str, index: u64) -> String {
    let activity = activity.trim();
    let suffix = short_hash(&format!("{activity}_{index}"));
    format!("{activity} {} view {suffix}", location.trim())
}

/// First six hex characters of a stable 64-bit hash.
pub fn short_hash(s: &str) -> String {
    let mut hex = format!("{:016x}", xxh3_64(s.as_bytes()));
    hex.truncate(6);
    hex
}

/// Style prefix used when describing an image of this category.
pub fn style_prefix(ty: ActivityType) -> &'static str {
    match ty {
        ActivityType::Food => "A professional photograph of ",
        ActivityType::Cultural => "A detailed photograph of ",
        ActivityType::Nature => "A scenic landscape photograph of ",
        ActivityType::Religious => "An architectural photograph of ",
        ActivityType::Coastal => "A beautiful coastal photograph of ",
        ActivityType::Nightlife => "A vibrant nighttime photograph of ",
        ActivityType::Shopping => "A busy photograph of ",
        ActivityType::General => "A high quality travel photograph of ",
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/query.rs"]
mod tests;
