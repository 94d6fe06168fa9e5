//! Coverage-preserving down-sampling of resolved images.

use std::path::PathBuf;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::assets::resolver::CandidateImage;
use crate::itinerary::{Activity, Period};

/// A resolved image tagged with the activity it illustrates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub image: CandidateImage,
    pub caption: String,
    pub day: u32,
    pub period: Period,
    pub importance: i32,
}

impl Candidate {
    pub fn from_activity(activity: &Activity, image: CandidateImage) -> Self {
        Self {
            image,
            caption: activity.caption(),
            day: activity.day,
            period: activity.period,
            importance: activity.importance,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedImage {
    pub path: PathBuf,
    pub caption: String,
    pub day: u32,
    pub period: Period,
    pub importance: i32,
}

impl From<Candidate> for SelectedImage {
    fn from(c: Candidate) -> Self {
        Self {
            path: c.image.local_path,
            caption: c.caption,
            day: c.day,
            period: c.period,
            importance: c.importance,
        }
    }
}

/// Choose at most `max_images` candidates, ordered for display.
///
/// When down-sampling, the top image of the first and of the last day are kept, every day
/// up to the last gets at least one image while room remains, and the rest is filled by
/// importance. The result is ordered by (day, period) and then shuffled within each day with
/// an RNG seeded from `seed`, so identical inputs give identical output.
#[tracing::instrument(skip(candidates), fields(pool = candidates.len()))]
pub fn select(candidates: Vec<Candidate>, max_images: usize, seed: u64) -> Vec<SelectedImage> {
    let mut chosen = if candidates.len() <= max_images {
        candidates
    } else {
        downsample(candidates, max_images)
    };

    chosen.sort_by_key(|c| (c.day, c.period.order()));

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut start = 0;
    while start < chosen.len() {
        let day = chosen[start].day;
        let end = start
            + chosen[start..]
                .iter()
                .take_while(|c| c.day == day)
                .count();
        chosen[start..end].shuffle(&mut rng);
        start = end;
    }
    tracing::debug!(selected = chosen.len(), "selection ordered");

    chosen.into_iter().map(SelectedImage::from).collect()
}

fn downsample(candidates: Vec<Candidate>, max_images: usize) -> Vec<Candidate> {
    let mut ranked: Vec<Option<Candidate>> = candidates.into_iter().map(Some).collect();
    // Stable: equal importance keeps itinerary order.
    ranked.sort_by_key(|c| c.as_ref().map(|c| -(c.importance as i64)));

    let mut chosen = Vec::with_capacity(max_images);
    take_top_of_day(&mut ranked, &mut chosen, 1, max_images);

    if let Some(last_day) = ranked.iter().flatten().map(|c| c.day).max() {
        take_top_of_day(&mut ranked, &mut chosen, last_day, max_images);

        for day in 1..=last_day {
            if !chosen.iter().any(|c| c.day == day) {
                take_top_of_day(&mut ranked, &mut chosen, day, max_images);
            }
        }
    }

    for slot in ranked.iter_mut() {
        if chosen.len() >= max_images {
            break;
        }
        if let Some(c) = slot.take() {
            chosen.push(c);
        }
    }
    chosen
}

fn take_top_of_day(
    ranked: &mut [Option<Candidate>],
    chosen: &mut Vec<Candidate>,
    day: u32,
    max_images: usize,
) {
    if chosen.len() >= max_images {
        return;
    }
    if let Some(slot) = ranked
        .iter_mut()
        .find(|c| c.as_ref().is_some_and(|c| c.day == day))
        && let Some(c) = slot.take()
    {
        chosen.push(c);
    }
}

#[cfg(test)]
#[path = "../tests/unit/select/select.rs"]
mod tests;
