use super::*;

#[test]
fn defaults_match_the_documented_render() {
    let cfg = RenderConfig::default();
    assert_eq!(cfg.fps, 24);
    assert_eq!(cfg.hold_frames(), 72);
    assert_eq!(cfg.transition_frames(), 24);
    assert!(cfg.validate().is_ok());
}

#[test]
fn frame_counts_round_to_nearest() {
    let cfg = RenderConfig {
        fps: 24,
        image_duration_s: 2.5,
        transition_duration_s: 0.7,
        ..RenderConfig::default()
    };
    assert_eq!(cfg.hold_frames(), 60);
    // 16.8 rounds up, a floor would give 16.
    assert_eq!(cfg.transition_frames(), 17);
}

#[test]
fn validation_catches_bad_values() {
    let base = RenderConfig::default();
    assert!(RenderConfig { fps: 0, ..base.clone() }.validate().is_err());
    assert!(RenderConfig { width: 11, ..base.clone() }.validate().is_err());
    assert!(RenderConfig { max_images: 0, ..base.clone() }.validate().is_err());
    assert!(
        RenderConfig {
            transition_duration_s: f64::NAN,
            ..base.clone()
        }
        .validate()
        .is_err()
    );
    assert!(
        RenderConfig {
            image_duration_s: 0.0,
            ..base
        }
        .validate()
        .is_err()
    );
}

#[test]
fn quality_presets_set_canvas() {
    let cfg = RenderConfig::default().with_quality(Quality::Standard);
    assert_eq!((cfg.width, cfg.height), (1280, 720));
}

#[test]
fn partial_json_uses_field_defaults() {
    let s: Settings =
        serde_json::from_str(r#"{ "render": { "max_images": 5 }, "seed": 7 }"#).unwrap();
    assert_eq!(s.render.max_images, 5);
    assert_eq!(s.render.fps, 24);
    assert_eq!(s.seed, 7);
    assert_eq!(s.resolver.workers, 1);
}

#[test]
fn resolver_debug_hides_keys() {
    let cfg = ResolverConfig {
        unsplash_access_key: Some("secret-key".to_string()),
        huggingface_api_key: Some("hf-secret".to_string()),
        ..ResolverConfig::default()
    };
    let dbg = format!("{cfg:?}");
    assert!(!dbg.contains("secret-key"));
    assert!(!dbg.contains("hf-secret"));
}

#[test]
fn missing_settings_file_yields_defaults() {
    let path = std::env::temp_dir().join(format!(
        "tripreel_missing_settings_{}.json",
        std::process::id()
    ));
    let s = Settings::load(&path).unwrap();
    assert_eq!(s.render, RenderConfig::default());
}

#[test]
fn zero_threads_is_rejected_but_unset_is_fine() {
    let base = RenderConfig::default();
    assert!(base.validate().is_ok());
    assert!(RenderConfig { threads: Some(0), ..base.clone() }.validate().is_err());
    assert!(RenderConfig { threads: Some(4), ..base }.validate().is_ok());
}

#[test]
fn images_per_activity_is_bounded() {
    let mut cfg = ResolverConfig::default();
    cfg.images_per_activity = 10;
    assert!(cfg.validate().is_ok());
    cfg.images_per_activity = 11;
    assert!(cfg.validate().is_err());
    cfg.images_per_activity = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn file_credentials_win_over_environment() {
    let mut cfg: ResolverConfig =
        serde_json::from_str(r#"{"huggingface_api_key": "from-file"}"#).unwrap();
    cfg.apply_env();
    assert_eq!(cfg.huggingface_api_key.as_deref(), Some("from-file"));
}
