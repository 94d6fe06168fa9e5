//! Activity -> local image file resolution.
//!
//! Resolution never fails: every activity ends up with a readable file, in order of preference
//! a cached entry, a freshly fetched image, a downloaded placeholder, or a synthesized gradient.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;

use crate::assets::cache::{CacheError, Fingerprint, ImageCacheStore};
use crate::assets::catalog::{PLACEHOLDER_URLS, SceneCatalog, placeholder_slot, synthesize_placeholder};
use crate::assets::decode::looks_like_image;
use crate::assets::query::{ActivityType, candidate_queries, classify, exhausted_variant};
use crate::assets::source::{
    CatalogSource, Downloader, HttpClient, HuggingFaceSource, ImageGenerator, ImageSource,
    PexelsSource, SourceError, SourceKind, UnsplashSource,
};
use crate::config::ResolverConfig;
use crate::foundation::core::CancelToken;
use crate::foundation::error::{ReelError, ReelResult};
use crate::itinerary::Activity;
use crate::select::Candidate;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    NoSourcesConfigured,
    /// Every configured source was tried, in order, and failed for the recorded reason.
    SourcesFailed(Vec<(SourceKind, SourceError)>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageOrigin {
    Cached(SourceKind),
    Fetched(SourceKind),
    Placeholder(FallbackReason),
}

impl ImageOrigin {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

/// One resolved image for one activity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateImage {
    pub fingerprint: Fingerprint,
    pub origin: ImageOrigin,
    pub query: String,
    pub activity_type: ActivityType,
    pub local_path: PathBuf,
}

/// Per-render dedup state: queries already issued and URLs already claimed.
///
/// Locks are only held for set membership updates, never across network calls.
#[derive(Debug, Default)]
pub struct ResolveSession {
    used_queries: Mutex<HashSet<String>>,
    used_urls: Mutex<HashSet<String>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking resolver thread leaves the sets consistent; keep going.
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ResolveSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick and record a query not issued before in this session.
    ///
    /// The choice among unused candidates rotates with `index`; when all are used a
    /// hash-suffixed variant is issued instead.
    pub fn issue_query(&self, location: &str, activity: &str, ty: ActivityType, index: u64) -> String {
        let candidates = candidate_queries(location, activity, ty);
        let mut used = lock(&self.used_queries);
        let unused: Vec<&String> = candidates.iter().filter(|q| !used.contains(*q)).collect();
        let chosen = if unused.is_empty() {
            exhausted_variant(location, activity, index)
        } else {
            unused[(index % unused.len() as u64) as usize].clone()
        };
        used.insert(chosen.clone());
        chosen
    }

    /// Claim the first URL in `urls` nobody in this session has claimed yet.
    pub fn claim_url<'a>(&self, urls: &'a [String]) -> Option<&'a str> {
        let mut used = lock(&self.used_urls);
        let url = urls.iter().find(|u| !used.contains(u.as_str()))?;
        used.insert(url.clone());
        Some(url.as_str())
    }

    pub fn query_count(&self) -> usize {
        lock(&self.used_queries).len()
    }

    pub fn url_count(&self) -> usize {
        lock(&self.used_urls).len()
    }

    pub fn clear(&self) {
        lock(&self.used_queries).clear();
        lock(&self.used_urls).clear();
    }
}

/// A configured image service: searched for URLs, or asked to generate bytes.
#[derive(Clone)]
enum Provider {
    Search(Arc<dyn ImageSource>),
    Generate(Arc<dyn ImageGenerator>),
}

impl Provider {
    fn kind(&self) -> SourceKind {
        match self {
            Self::Search(s) => s.kind(),
            Self::Generate(g) => g.kind(),
        }
    }
}

pub struct ImageResolver {
    cache: ImageCacheStore,
    providers: Vec<Provider>,
    downloader: Arc<dyn Downloader>,
    workers: usize,
    images_per_activity: usize,
}

impl ImageResolver {
    pub fn new(
        cache: ImageCacheStore,
        sources: Vec<Arc<dyn ImageSource>>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        Self {
            cache,
            providers: sources.into_iter().map(Provider::Search).collect(),
            downloader,
            workers: 1,
            images_per_activity: 1,
        }
    }

    /// Add an image generator to the rotation alongside the search sources.
    pub fn with_generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.providers.push(Provider::Generate(generator));
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_images_per_activity(mut self, n: usize) -> Self {
        self.images_per_activity = n.max(1);
        self
    }

    /// Build the HTTP-backed resolver: one source per configured credential, plus the
    /// curated catalog when enabled. Image generation joins the rotation when a Hugging Face
    /// key is configured.
    pub fn from_config(cfg: &ResolverConfig) -> ReelResult<Self> {
        cfg.validate()?;
        let cache = ImageCacheStore::open(&cfg.cache_dir)?;
        let http = Arc::new(HttpClient::new(cfg.timeout())?);

        let mut sources: Vec<Arc<dyn ImageSource>> = Vec::new();
        if let Some(key) = cfg.unsplash_access_key.as_deref() {
            sources.push(Arc::new(UnsplashSource::new(http.clone(), key, cfg.per_page)));
        }
        if let Some(key) = cfg.pexels_api_key.as_deref() {
            sources.push(Arc::new(PexelsSource::new(http.clone(), key, cfg.per_page)));
        }
        if cfg.curated_catalog {
            sources.push(Arc::new(CatalogSource::new(SceneCatalog::new())));
        }
        let mut resolver = Self::new(cache, sources, http.clone())
            .with_workers(cfg.workers)
            .with_images_per_activity(cfg.images_per_activity);
        if let Some(key) = cfg.huggingface_api_key.as_deref() {
            resolver = resolver.with_generator(Arc::new(HuggingFaceSource::new(http, key)));
        }

        let kinds = resolver.source_kinds();
        if kinds.is_empty() {
            tracing::warn!("no image source credentials configured, all images will be placeholders");
        } else {
            tracing::info!(sources = ?kinds, "image sources configured");
        }
        Ok(resolver)
    }

    pub fn cache(&self) -> &ImageCacheStore {
        &self.cache
    }

    pub fn source_kinds(&self) -> Vec<SourceKind> {
        self.providers.iter().map(Provider::kind).collect()
    }

    /// Resolve one image for `activity` at `location`. Never fails.
    #[tracing::instrument(skip(self, session), fields(query))]
    pub fn resolve(
        &self,
        session: &ResolveSession,
        location: &str,
        activity: &str,
        index: u64,
    ) -> CandidateImage {
        let activity_type = classify(activity);
        let query = session.issue_query(location, activity, activity_type, index);
        tracing::Span::current().record("query", query.as_str());

        if self.providers.is_empty() {
            return self.placeholder(query, activity_type, index, FallbackReason::NoSourcesConfigured);
        }

        let mut order: Vec<&Provider> = self.providers.iter().collect();
        order.shuffle(&mut rand::rngs::StdRng::seed_from_u64(index));

        let mut failures = Vec::with_capacity(order.len());
        for source in order {
            let kind = source.kind();
            let attempt = match source {
                Provider::Search(s) => {
                    self.try_source(session, s.as_ref(), &query, activity_type, index)
                }
                Provider::Generate(g) => self.try_generator(g.as_ref(), &query, activity_type, index),
            };
            match attempt {
                Ok((fingerprint, local_path, fetched)) => {
                    let origin = if fetched {
                        ImageOrigin::Fetched(kind)
                    } else {
                        ImageOrigin::Cached(kind)
                    };
                    return CandidateImage {
                        fingerprint,
                        origin,
                        query,
                        activity_type,
                        local_path,
                    };
                }
                Err(e) => {
                    if let SourceError::Cache(_) = &e {
                        tracing::warn!(source = %kind, error = %e, "image cache write failed");
                    } else if e.is_transient() {
                        tracing::warn!(source = %kind, error = %e, "image source unavailable");
                    } else {
                        tracing::debug!(source = %kind, error = %e, "image source failed");
                    }
                    failures.push((kind, e));
                }
            }
        }

        tracing::warn!(attempts = failures.len(), "all image sources failed, using placeholder");
        self.placeholder(query, activity_type, index, FallbackReason::SourcesFailed(failures))
    }

    fn try_source(
        &self,
        session: &ResolveSession,
        source: &dyn ImageSource,
        query: &str,
        activity_type: ActivityType,
        index: u64,
    ) -> Result<(Fingerprint, PathBuf, bool), SourceError> {
        let kind = source.kind();
        let source_index = (index + kind.index_salt()) % 100;
        let fp = Fingerprint::new(query, kind.as_str(), source_index, activity_type);

        if let Some(path) = self.cache.lookup(&fp) {
            tracing::debug!(fingerprint = %fp, "resolved from cache");
            return Ok((fp, path, false));
        }

        let urls = source.search(query)?;
        let url = session.claim_url(&urls).ok_or(SourceError::Empty)?;

        let entry = self
            .cache
            .get_or_create(&fp, || self.download_image(url))
            .map_err(cache_failure)?;
        Ok((fp, entry.path, entry.fetched))
    }

    fn try_generator(
        &self,
        generator: &dyn ImageGenerator,
        query: &str,
        activity_type: ActivityType,
        index: u64,
    ) -> Result<(Fingerprint, PathBuf, bool), SourceError> {
        let kind = generator.kind();
        let fp = Fingerprint::new(query, kind.as_str(), (index + kind.index_salt()) % 100, activity_type);

        let entry = self
            .cache
            .get_or_create(&fp, || {
                let bytes = generator.generate(query, activity_type)?;
                if !looks_like_image(&bytes) {
                    return Err(SourceError::Malformed(format!("{kind} returned a non-image body")));
                }
                Ok(bytes)
            })
            .map_err(cache_failure)?;
        if !entry.fetched {
            tracing::debug!(fingerprint = %fp, "resolved from cache");
        }
        Ok((fp, entry.path, entry.fetched))
    }

    fn download_image(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let bytes = self.downloader.download(url)?;
        if !looks_like_image(&bytes) {
            return Err(SourceError::Malformed(format!("not an image: {url}")));
        }
        Ok(bytes)
    }

    fn placeholder(
        &self,
        query: String,
        activity_type: ActivityType,
        index: u64,
        reason: FallbackReason,
    ) -> CandidateImage {
        let slot = placeholder_slot(index);
        let remote = Fingerprint::placeholder(slot);

        let (fingerprint, local_path) = match self
            .cache
            .get_or_create(&remote, || self.download_image(PLACEHOLDER_URLS[slot]))
        {
            Ok(entry) => (remote, entry.path),
            Err(e) => {
                let msg = match e {
                    CacheError::Fetch(e) => e.to_string(),
                    CacheError::Io(e) => e.to_string(),
                };
                tracing::warn!(slot, error = %msg, "placeholder download failed, synthesizing");
                let local = Fingerprint::local_placeholder(slot);
                let path = synthesize_placeholder(slot)
                    .and_then(|bytes| self.cache.insert(&local, &bytes))
                    .unwrap_or_else(|e| {
                        tracing::error!(slot, error = %e, "failed to write synthesized placeholder");
                        self.cache.path_for(&local)
                    });
                (local, path)
            }
        };

        CandidateImage {
            fingerprint,
            origin: ImageOrigin::Placeholder(reason),
            query,
            activity_type,
            local_path,
        }
    }

    /// Resolve `images_per_activity` images for every activity, in activity order.
    ///
    /// Image `k` of an activity uses index `base_index + k`.
    #[tracing::instrument(skip_all, fields(activities = activities.len()))]
    pub fn resolve_all(
        &self,
        session: &ResolveSession,
        destination: &str,
        activities: &[Activity],
        cancel: &CancelToken,
    ) -> ReelResult<Vec<Candidate>> {
        let jobs: Vec<(&Activity, u64)> = activities
            .iter()
            .flat_map(|a| (0..self.images_per_activity as u64).map(move |k| (a, a.base_index() + k)))
            .collect();

        let run = |(activity, index): &(&Activity, u64)| -> ReelResult<Candidate> {
            cancel.check()?;
            let image = self.resolve(session, destination, &activity.title, *index);
            Ok(Candidate::from_activity(activity, image))
        };

        let out: Vec<ReelResult<Candidate>> = if self.workers <= 1 {
            jobs.iter().map(run).collect()
        } else {
            build_thread_pool(self.workers)?.install(|| jobs.par_iter().map(run).collect())
        };
        let out = out.into_iter().collect::<ReelResult<Vec<_>>>()?;

        let placeholders = out.iter().filter(|c| c.image.origin.is_placeholder()).count();
        tracing::info!(resolved = out.len(), placeholders, "image resolution finished");
        Ok(out)
    }

    /// Wipe the on-disk cache and the session's dedup sets.
    pub fn clear_cache(&self, session: &ResolveSession) -> ReelResult<usize> {
        session.clear();
        self.cache.clear()
    }
}

fn cache_failure(e: CacheError<SourceError>) -> SourceError {
    match e {
        CacheError::Fetch(e) => e,
        CacheError::Io(e) => SourceError::Cache(e.to_string()),
    }
}

fn build_thread_pool(threads: usize) -> ReelResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| ReelError::resolution(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resolver.rs"]
mod tests;
