use super::*;

#[test]
fn beach_heavy_trip_is_relaxing() {
    assert_eq!(
        determine_mood("Bali", "beach day, island hopping, resort spa"),
        Mood::Relaxing
    );
}

#[test]
fn adventure_heavy_trip_is_upbeat() {
    assert_eq!(
        determine_mood("Nepal", "mountain trek and hiking, safari"),
        Mood::Upbeat
    );
}

#[test]
fn cultural_trip_is_inspiring() {
    assert_eq!(
        determine_mood("Rome", "museum, heritage walk, history tour"),
        Mood::Inspiring
    );
}

#[test]
fn ties_and_empty_text_default_to_inspiring() {
    assert_eq!(determine_mood("", ""), Mood::Inspiring);
    // one beach hit, one adventure hit
    assert_eq!(determine_mood("", "beach then trek"), Mood::Inspiring);
}

#[test]
fn destination_counts_towards_the_score() {
    assert_eq!(determine_mood("Gold Coast", ""), Mood::Relaxing);
}

#[test]
fn is_pure_across_repeated_calls() {
    let text = "sunrise hike, outdoor market, beach sunset";
    let first = determine_mood("Cape Town", text);
    for _ in 0..10 {
        assert_eq!(determine_mood("Cape Town", text), first);
    }
}
