use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::itinerary::Period;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "tripreel_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

struct FakeSource {
    kind: SourceKind,
    result: Result<Vec<String>, SourceError>,
    calls: AtomicUsize,
}

impl FakeSource {
    fn ok(kind: SourceKind, urls: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            kind,
            result: Ok(urls.iter().map(|u| u.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(kind: SourceKind, err: SourceError) -> Arc<Self> {
        Arc::new(Self {
            kind,
            result: Err(err),
            calls: AtomicUsize::new(0),
        })
    }
}

impl ImageSource for FakeSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn search(&self, _query: &str) -> Result<Vec<String>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

#[derive(Default)]
struct FakeDownloader {
    offline: bool,
    garbage: bool,
    seen: Mutex<Vec<String>>,
}

impl Downloader for FakeDownloader {
    fn download(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        self.seen.lock().unwrap().push(url.to_string());
        if self.offline {
            return Err(SourceError::Transport("offline".into()));
        }
        if self.garbage {
            return Ok(b"<html>nope</html>".to_vec());
        }
        Ok(png())
    }
}

fn resolver(
    dir: &std::path::Path,
    sources: Vec<Arc<dyn ImageSource>>,
    downloader: Arc<FakeDownloader>,
) -> ImageResolver {
    ImageResolver::new(ImageCacheStore::open(dir).unwrap(), sources, downloader)
}

#[test]
fn no_sources_yields_a_downloaded_placeholder() {
    let tmp = temp_dir("resolver_no_sources");
    let dl = Arc::new(FakeDownloader::default());
    let r = resolver(&tmp, vec![], dl.clone());

    let img = r.resolve(&ResolveSession::new(), "Paris", "Free time", 7);
    assert_eq!(img.origin, ImageOrigin::Placeholder(FallbackReason::NoSourcesConfigured));
    assert_eq!(img.fingerprint, Fingerprint::placeholder(2));
    assert!(img.local_path.is_file());
    assert_eq!(dl.seen.lock().unwrap().as_slice(), &[PLACEHOLDER_URLS[2]]);

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn second_resolve_is_served_from_cache_without_network() {
    let tmp = temp_dir("resolver_idempotent");
    let src = FakeSource::ok(SourceKind::Unsplash, &["https://img/1", "https://img/2"]);
    let dl = Arc::new(FakeDownloader::default());
    let r = resolver(&tmp, vec![src.clone() as Arc<dyn ImageSource>], dl.clone());

    let first = r.resolve(&ResolveSession::new(), "Paris", "Eiffel Tower", 10);
    assert_eq!(first.origin, ImageOrigin::Fetched(SourceKind::Unsplash));
    assert_eq!(src.calls.load(Ordering::SeqCst), 1);

    let second = r.resolve(&ResolveSession::new(), "Paris", "Eiffel Tower", 10);
    assert_eq!(second.origin, ImageOrigin::Cached(SourceKind::Unsplash));
    assert_eq!(second.local_path, first.local_path);
    assert_eq!(src.calls.load(Ordering::SeqCst), 1);
    assert_eq!(dl.seen.lock().unwrap().len(), 1);
    assert_eq!(r.cache().fetch_count(), 1);

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn urls_are_not_reused_within_a_session() {
    let tmp = temp_dir("resolver_url_dedup");
    let src = FakeSource::ok(SourceKind::Pexels, &["https://img/a", "https://img/b"]);
    let dl = Arc::new(FakeDownloader::default());
    let r = resolver(&tmp, vec![src as Arc<dyn ImageSource>], dl.clone());
    let session = ResolveSession::new();

    let a = r.resolve(&session, "Rome", "Colosseum", 0);
    let b = r.resolve(&session, "Rome", "Pantheon", 10);
    assert!(matches!(a.origin, ImageOrigin::Fetched(_)));
    assert!(matches!(b.origin, ImageOrigin::Fetched(_)));
    assert_eq!(
        dl.seen.lock().unwrap().as_slice(),
        &["https://img/a", "https://img/b"]
    );
    assert_eq!(session.url_count(), 2);

    // Both URLs claimed: the third activity falls back.
    let c = r.resolve(&session, "Rome", "Trevi Fountain", 20);
    match c.origin {
        ImageOrigin::Placeholder(FallbackReason::SourcesFailed(f)) => {
            assert_eq!(f, vec![(SourceKind::Pexels, SourceError::Empty)]);
        }
        other => panic!("unexpected origin {other:?}"),
    }

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn every_source_failing_records_each_reason() {
    let tmp = temp_dir("resolver_all_fail");
    let sources: Vec<Arc<dyn ImageSource>> = vec![
        FakeSource::failing(SourceKind::Unsplash, SourceError::Status(401)) as Arc<dyn ImageSource>,
        FakeSource::failing(SourceKind::Pexels, SourceError::Transport("timeout".into())),
    ];
    let dl = Arc::new(FakeDownloader::default());
    let r = resolver(&tmp, sources, dl);

    let img = r.resolve(&ResolveSession::new(), "Tokyo", "Sushi dinner", 3);
    let ImageOrigin::Placeholder(FallbackReason::SourcesFailed(failures)) = img.origin else {
        panic!("expected placeholder");
    };
    assert_eq!(failures.len(), 2);
    assert!(failures.contains(&(SourceKind::Unsplash, SourceError::Status(401))));
    assert!(img.local_path.is_file());

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn offline_placeholder_is_synthesized_locally() {
    let tmp = temp_dir("resolver_offline");
    let dl = Arc::new(FakeDownloader {
        offline: true,
        ..Default::default()
    });
    let r = resolver(&tmp, vec![], dl);

    let img = r.resolve(&ResolveSession::new(), "Oslo", "Fjord cruise", 4);
    assert_eq!(img.fingerprint, Fingerprint::local_placeholder(4));
    assert!(crate::assets::decode::load_rgba(&img.local_path).is_ok());

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn non_image_payloads_are_rejected() {
    let tmp = temp_dir("resolver_garbage");
    let src = FakeSource::ok(SourceKind::Unsplash, &["https://img/html"]);
    let dl = Arc::new(FakeDownloader {
        garbage: true,
        ..Default::default()
    });
    let r = resolver(&tmp, vec![src as Arc<dyn ImageSource>], dl);

    let img = r.resolve(&ResolveSession::new(), "Lima", "Ceviche lunch", 0);
    assert!(img.origin.is_placeholder());
    // The garbage was never cached under the source fingerprint.
    assert!(img.local_path.file_name().unwrap().to_string_lossy().starts_with("placeholder_0"));

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn queries_are_unique_within_a_session() {
    let session = ResolveSession::new();
    let mut issued = HashSet::new();
    for index in 0..6 {
        let q = session.issue_query("Paris", "Free time", ActivityType::General, index);
        assert!(issued.insert(q), "query reissued at index {index}");
    }
    assert_eq!(session.query_count(), 6);

    session.clear();
    assert_eq!(session.query_count(), 0);
}

fn activity(day: u32, day_idx: usize, period: Period, title: &str) -> Activity {
    Activity {
        day,
        period,
        title: title.to_string(),
        description: String::new(),
        importance: 1,
        day_idx,
    }
}

#[test]
fn resolve_all_keeps_activity_order_and_fans_out() {
    let tmp = temp_dir("resolver_all");
    let dl = Arc::new(FakeDownloader::default());
    let r = resolver(&tmp, vec![], dl)
        .with_workers(3)
        .with_images_per_activity(2);
    let acts = vec![
        activity(1, 0, Period::Morning, "Louvre"),
        activity(1, 0, Period::Evening, "Seine cruise"),
        activity(2, 1, Period::Afternoon, "Montmartre"),
    ];

    let out = r
        .resolve_all(&ResolveSession::new(), "Paris", &acts, &CancelToken::new())
        .unwrap();
    assert_eq!(out.len(), 6);
    let captions: Vec<_> = out.iter().map(|c| c.caption.as_str()).collect();
    assert_eq!(
        captions,
        vec![
            "Day 1 - Morning: Louvre",
            "Day 1 - Morning: Louvre",
            "Day 1 - Evening: Seine cruise",
            "Day 1 - Evening: Seine cruise",
            "Day 2 - Afternoon: Montmartre",
            "Day 2 - Afternoon: Montmartre",
        ]
    );
    // base 0 -> slots 0,1; base 20 -> 0,1; base 110 -> 0,1
    assert_eq!(out[1].image.fingerprint, Fingerprint::placeholder(1));

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn resolve_all_honours_cancellation() {
    let tmp = temp_dir("resolver_cancel");
    let r = resolver(&tmp, vec![], Arc::new(FakeDownloader::default()));
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = r
        .resolve_all(
            &ResolveSession::new(),
            "Paris",
            &[activity(1, 0, Period::Morning, "Louvre")],
            &cancel,
        )
        .unwrap_err();
    assert!(matches!(err, ReelError::Cancelled));

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn clear_cache_removes_files_and_session_state() {
    let tmp = temp_dir("resolver_clear");
    let r = resolver(&tmp, vec![], Arc::new(FakeDownloader::default()));
    let session = ResolveSession::new();
    r.resolve(&session, "Paris", "Louvre", 0);
    r.resolve(&session, "Paris", "Louvre", 1);

    assert_eq!(r.clear_cache(&session).unwrap(), 2);
    assert_eq!(session.query_count(), 0);

    std::fs::remove_dir_all(&tmp).ok();
}

struct FakeGenerator {
    bytes: Vec<u8>,
    prompts: Mutex<Vec<(String, ActivityType)>>,
}

impl FakeGenerator {
    fn returning(bytes: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            bytes,
            prompts: Mutex::new(Vec::new()),
        })
    }
}

impl ImageGenerator for FakeGenerator {
    fn kind(&self) -> SourceKind {
        SourceKind::HuggingFace
    }

    fn generate(&self, query: &str, activity_type: ActivityType) -> Result<Vec<u8>, SourceError> {
        self.prompts
            .lock()
            .unwrap()
            .push((query.to_string(), activity_type));
        Ok(self.bytes.clone())
    }
}

#[test]
fn generated_images_are_cached_under_their_own_fingerprint() {
    let tmp = temp_dir("resolver_generator");
    let generator = FakeGenerator::returning(png());
    let dl = Arc::new(FakeDownloader::default());
    let r = resolver(&tmp, vec![], dl.clone()).with_generator(generator.clone());
    assert_eq!(r.source_kinds(), vec![SourceKind::HuggingFace]);

    let first = r.resolve(&ResolveSession::new(), "Kyoto", "Temple visit", 5);
    assert_eq!(first.origin, ImageOrigin::Fetched(SourceKind::HuggingFace));
    assert_eq!(
        first.fingerprint,
        Fingerprint::new(
            &first.query,
            "huggingface",
            (5 + SourceKind::HuggingFace.index_salt()) % 100,
            ActivityType::Religious
        )
    );
    assert!(first.local_path.is_file());

    let second = r.resolve(&ResolveSession::new(), "Kyoto", "Temple visit", 5);
    assert_eq!(second.origin, ImageOrigin::Cached(SourceKind::HuggingFace));
    assert_eq!(second.local_path, first.local_path);

    let prompts = generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].1, ActivityType::Religious);
    assert!(dl.seen.lock().unwrap().is_empty());

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn generator_returning_garbage_falls_back_to_placeholder() {
    let tmp = temp_dir("resolver_generator_garbage");
    let generator = FakeGenerator::returning(b"{\"error\":\"model loading\"}".to_vec());
    let r = resolver(&tmp, vec![], Arc::new(FakeDownloader::default())).with_generator(generator);

    let img = r.resolve(&ResolveSession::new(), "Kyoto", "Tea ceremony", 2);
    let ImageOrigin::Placeholder(FallbackReason::SourcesFailed(failures)) = img.origin else {
        panic!("expected placeholder");
    };
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0],
        (SourceKind::HuggingFace, SourceError::Malformed(_))
    ));
    assert_eq!(r.cache().fetch_count(), 2);

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn configured_keys_select_the_sources() {
    let tmp = temp_dir("resolver_from_config");
    let cfg = ResolverConfig {
        cache_dir: tmp.clone(),
        unsplash_access_key: Some("u".to_string()),
        huggingface_api_key: Some("h".to_string()),
        curated_catalog: true,
        ..ResolverConfig::default()
    };
    let r = ImageResolver::from_config(&cfg).unwrap();
    assert_eq!(
        r.source_kinds(),
        vec![SourceKind::Unsplash, SourceKind::Catalog, SourceKind::HuggingFace]
    );

    std::fs::remove_dir_all(&tmp).ok();
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn unwritable_cache_is_reported_as_a_warning() {
    let tmp = temp_dir("resolver_cache_gone");
    let src = FakeSource::ok(SourceKind::Unsplash, &["https://img/1"]);
    let dl = Arc::new(FakeDownloader::default());
    let r = resolver(&tmp, vec![src as Arc<dyn ImageSource>], dl.clone());
    std::fs::remove_dir_all(&tmp).unwrap();

    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let img = tracing::subscriber::with_default(subscriber, || {
        r.resolve(&ResolveSession::new(), "Oslo", "Opera house", 3)
    });

    match &img.origin {
        ImageOrigin::Placeholder(FallbackReason::SourcesFailed(failures)) => {
            assert!(
                matches!(failures.as_slice(), [(SourceKind::Unsplash, SourceError::Cache(_))]),
                "{failures:?}"
            );
        }
        other => panic!("unexpected origin {other:?}"),
    }
    // The image itself was fetched; only the write failed.
    assert_eq!(dl.seen.lock().unwrap()[0], "https://img/1");

    let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    let line = logs
        .lines()
        .find(|l| l.contains("image cache write failed"))
        .unwrap_or_else(|| panic!("no cache warning in:\n{logs}"));
    assert!(line.contains("WARN"), "{line}");
}
