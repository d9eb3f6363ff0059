//! Source loading: local files and `http(s)` URLs.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

use madforge_shared::{ConvertSettings, MadError, Result, SourceInput};

/// Maximum number of redirects to follow when fetching a URL source.
const MAX_REDIRECTS: usize = 5;

/// User-Agent string for source requests.
const USER_AGENT: &str = concat!("MadForge/", env!("CARGO_PKG_VERSION"));

/// Limits applied while loading a source.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
    /// Largest accepted source, in bytes.
    pub max_bytes: u64,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_bytes: 50 * 1024 * 1024,
        }
    }
}

impl From<&ConvertSettings> for SourceOptions {
    fn from(settings: &ConvertSettings) -> Self {
        Self {
            timeout_secs: settings.timeout_secs,
            max_bytes: settings.max_bytes,
        }
    }
}

/// Whether a location should be fetched over HTTP rather than read from disk.
pub fn is_url(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Load a source document from a path or URL.
///
/// Any failure here is fatal for the conversion: the parser has nothing to
/// work with.
#[instrument(skip(opts))]
pub async fn load_source(location: &str, opts: &SourceOptions) -> Result<SourceInput> {
    if is_url(location) {
        let url = Url::parse(location.trim())
            .map_err(|e| MadError::Source(format!("invalid URL '{location}': {e}")))?;
        fetch_url(&url, opts).await
    } else {
        read_file(Path::new(location), opts).await
    }
}

async fn read_file(path: &Path, opts: &SourceOptions) -> Result<SourceInput> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|_| MadError::Source(format!("file not found: {}", path.display())))?;

    if !meta.is_file() {
        return Err(MadError::Source(format!("not a file: {}", path.display())));
    }
    if meta.len() > opts.max_bytes {
        return Err(MadError::Source(format!(
            "{}: file too large ({} bytes, max {})",
            path.display(),
            meta.len(),
            opts.max_bytes
        )));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| MadError::io(path, e))?;

    debug!(path = %path.display(), size = bytes.len(), "read source file");
    Ok(SourceInput::new(path.to_string_lossy(), bytes))
}

async fn fetch_url(url: &Url, opts: &SourceOptions) -> Result<SourceInput> {
    info!(%url, "fetching source");

    let client = build_client(opts)?;
    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| MadError::Source(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(MadError::Source(format!("{url}: HTTP {status}")));
    }

    if let Some(len) = response.content_length() {
        if len > opts.max_bytes {
            return Err(MadError::Source(format!(
                "{url}: response too large ({len} bytes, max {})",
                opts.max_bytes
            )));
        }
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response
        .bytes()
        .await
        .map_err(|e| MadError::Source(format!("{url}: failed to read body: {e}")))?;

    if body.len() as u64 > opts.max_bytes {
        return Err(MadError::Source(format!(
            "{url}: response too large ({} bytes, max {})",
            body.len(),
            opts.max_bytes
        )));
    }

    debug!(%url, size = body.len(), ?content_type, "fetched source");

    let input = SourceInput::new(url.as_str(), body.to_vec());
    Ok(match content_type {
        Some(ct) => input.with_content_type(&ct),
        None => input,
    })
}

/// Build a reqwest client with appropriate settings.
fn build_client(opts: &SourceOptions) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| MadError::Source(format!("failed to build HTTP client: {e}")))
}
