use chrono::TimeZone;

use super::*;

#[test]
fn default_video_path_uses_slug_and_timestamp() {
    let itinerary = Itinerary {
        destination: "  New York City ".to_string(),
        daily_plan: Vec::new(),
    };
    let now = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).single().unwrap();
    let p = default_video_path(Path::new("data/videos"), &itinerary, now);
    assert_eq!(p, Path::new("data/videos/new_york_city_20260304_050607.mp4"));
}

#[test]
fn blank_destination_falls_back_to_trip() {
    let itinerary = Itinerary {
        destination: String::new(),
        daily_plan: Vec::new(),
    };
    let now = Local.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().unwrap();
    let p = default_video_path(Path::new("v"), &itinerary, now);
    assert_eq!(p.file_name().unwrap(), "trip_20260101_000000.mp4");
}

#[test]
fn default_video_path_stays_inside_videos_dir() {
    let itinerary = Itinerary {
        destination: "../../outside/trip".to_string(),
        daily_plan: Vec::new(),
    };
    let now = Local.with_ymd_and_hms(2026, 5, 6, 7, 8, 9).single().unwrap();
    let p = default_video_path(Path::new("data/videos"), &itinerary, now);
    assert_eq!(p.parent(), Some(Path::new("data/videos")));
    assert_eq!(p.file_name().unwrap(), "outside_trip_20260506_070809.mp4");
}
