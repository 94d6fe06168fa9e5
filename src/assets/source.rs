//! Remote image services and the HTTP plumbing behind them.
//!
//! Search services are a black box `search(query) -> ranked URLs`; generators return image
//! bytes for a prompt built from the query. Any transport error,
//! non-success status or unexpected payload comes back as a [`SourceError`] so the resolver can
//! fall back instead of failing.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assets::catalog::SceneCatalog;
use crate::assets::query::{ActivityType, style_prefix};
use crate::foundation::error::{ReelError, ReelResult};

const UNSPLASH_SEARCH_URL: &str = "https://api.unsplash.com/search/photos";
const PEXELS_SEARCH_URL: &str = "https://api.pexels.com/v1/search";
const HUGGINGFACE_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-xl-base-1.0";
const NEGATIVE_PROMPT: &str = "text, watermark, low quality, blurry";
const GUIDANCE_SCALE: f64 = 7.5;
const USER_AGENT: &str = concat!("tripreel/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Unsplash,
    Pexels,
    HuggingFace,
    Catalog,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unsplash => "unsplash",
            Self::Pexels => "pexels",
            Self::HuggingFace => "huggingface",
            Self::Catalog => "catalog",
        }
    }

    /// Fixed offset mixed into the per-source image index so sources do not share cache slots.
    pub fn index_salt(self) -> u64 {
        match self {
            Self::Unsplash => 17,
            Self::Pexels => 43,
            Self::HuggingFace => 59,
            Self::Catalog => 71,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single source could not supply an image.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceError {
    #[error("credentials for {0} are not configured")]
    MissingCredentials(SourceKind),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("http status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no unused results")]
    Empty,

    #[error("cache write failed: {0}")]
    Cache(String),
}

impl SourceError {
    /// Timeouts and connection failures may succeed on a later render.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status(500..=599))
    }
}

/// A remote image-search service.
pub trait ImageSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Candidate image URLs for `query`, best ranked first.
    fn search(&self, query: &str) -> Result<Vec<String>, SourceError>;
}

/// Fetches raw bytes for a URL.
pub trait Downloader: Send + Sync {
    fn download(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

/// A service that produces a new image for a query instead of searching for one.
pub trait ImageGenerator: Send + Sync {
    fn kind(&self) -> SourceKind;

    fn generate(&self, query: &str, activity_type: ActivityType) -> Result<Vec<u8>, SourceError>;
}

/// POSTs a JSON body and returns the raw response bytes.
pub trait PromptClient: Send + Sync {
    fn post_json(
        &self,
        url: &str,
        authorization: &str,
        body: &serde_json::Value,
    ) -> Result<Vec<u8>, SourceError>;
}

/// Blocking HTTP client with a per-request timeout.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> ReelResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ReelError::validation(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
        authorization: &str,
    ) -> Result<T, SourceError> {
        let resp = self
            .client
            .get(url)
            .query(params)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        resp.json::<T>()
            .map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

impl Downloader for HttpClient {
    fn download(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let bytes = resp
            .bytes()
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        if bytes.is_empty() {
            return Err(SourceError::Malformed("empty body".to_string()));
        }
        Ok(bytes.to_vec())
    }
}

impl PromptClient for HttpClient {
    fn post_json(
        &self,
        url: &str,
        authorization: &str,
        body: &serde_json::Value,
    ) -> Result<Vec<u8>, SourceError> {
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(body)
            .send()
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let bytes = resp
            .bytes()
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[derive(Deserialize)]
struct UnsplashSearch {
    results: Vec<UnsplashPhoto>,
}

#[derive(Deserialize)]
struct UnsplashPhoto {
    urls: UnsplashUrls,
}

#[derive(Deserialize)]
struct UnsplashUrls {
    regular: String,
}

pub struct UnsplashSource {
    http: Arc<HttpClient>,
    access_key: String,
    per_page: u32,
}

impl UnsplashSource {
    pub fn new(http: Arc<HttpClient>, access_key: impl Into<String>, per_page: u32) -> Self {
        Self {
            http,
            access_key: access_key.into(),
            per_page,
        }
    }
}

impl ImageSource for UnsplashSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Unsplash
    }

    fn search(&self, query: &str) -> Result<Vec<String>, SourceError> {
        if self.access_key.is_empty() {
            return Err(SourceError::MissingCredentials(self.kind()));
        }
        let body: UnsplashSearch = self.http.get_json(
            UNSPLASH_SEARCH_URL,
            &[
                ("query", query.to_string()),
                ("per_page", self.per_page.to_string()),
                ("orientation", "landscape".to_string()),
            ],
            &format!("Client-ID {}", self.access_key),
        )?;
        Ok(body.results.into_iter().map(|r| r.urls.regular).collect())
    }
}

#[derive(Deserialize)]
struct PexelsSearch {
    photos: Vec<PexelsPhoto>,
}

#[derive(Deserialize)]
struct PexelsPhoto {
    src: PexelsSrc,
}

#[derive(Deserialize)]
struct PexelsSrc {
    large: String,
}

pub struct PexelsSource {
    http: Arc<HttpClient>,
    api_key: String,
    per_page: u32,
}

impl PexelsSource {
    pub fn new(http: Arc<HttpClient>, api_key: impl Into<String>, per_page: u32) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            per_page,
        }
    }
}

impl ImageSource for PexelsSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Pexels
    }

    fn search(&self, query: &str) -> Result<Vec<String>, SourceError> {
        if self.api_key.is_empty() {
            return Err(SourceError::MissingCredentials(self.kind()));
        }
        let body: PexelsSearch = self.http.get_json(
            PEXELS_SEARCH_URL,
            &[
                ("query", query.to_string()),
                ("per_page", self.per_page.to_string()),
                ("orientation", "landscape".to_string()),
            ],
            &self.api_key,
        )?;
        Ok(body.photos.into_iter().map(|p| p.src.large).collect())
    }
}

/// Text-to-image generation through the Hugging Face inference API.
pub struct HuggingFaceSource {
    client: Arc<dyn PromptClient>,
    api_key: String,
}

impl HuggingFaceSource {
    pub fn new(client: Arc<dyn PromptClient>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    /// `"{style}{query}, travel photography, 4K, high resolution"`
    pub fn prompt(query: &str, activity_type: ActivityType) -> String {
        format!(
            "{}{query}, travel photography, 4K, high resolution",
            style_prefix(activity_type)
        )
    }
}

impl ImageGenerator for HuggingFaceSource {
    fn kind(&self) -> SourceKind {
        SourceKind::HuggingFace
    }

    fn generate(&self, query: &str, activity_type: ActivityType) -> Result<Vec<u8>, SourceError> {
        if self.api_key.is_empty() {
            return Err(SourceError::MissingCredentials(self.kind()));
        }
        let body = serde_json::json!({
            "inputs": Self::prompt(query, activity_type),
            "parameters": {
                "negative_prompt": NEGATIVE_PROMPT,
                "guidance_scale": GUIDANCE_SCALE,
            },
        });
        let bytes = self.client.post_json(
            HUGGINGFACE_MODEL_URL,
            &format!("Bearer {}", self.api_key),
            &body,
        )?;
        if bytes.is_empty() {
            return Err(SourceError::Malformed("empty body".to_string()));
        }
        Ok(bytes)
    }
}

/// Credential-free source answering from the built-in scene catalog.
#[derive(Clone, Debug, Default)]
pub struct CatalogSource {
    catalog: SceneCatalog,
}

impl CatalogSource {
    pub fn new(catalog: SceneCatalog) -> Self {
        Self { catalog }
    }
}

impl ImageSource for CatalogSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Catalog
    }

    fn search(&self, query: &str) -> Result<Vec<String>, SourceError> {
        let scene = self.catalog.lookup(query, "");
        Ok(scene.urls().iter().map(|u| u.to_string()).collect())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
