// Link preview metadata: fetch a page once and pull title, preview image and domain

use reqwest::{redirect, Client, Response};
use scraper::{Html, Selector};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::{Host, Url};

use crate::app_config::MetadataConfig;

pub const FALLBACK_TITLE: &str = "No Title Found";
pub const FALLBACK_IMAGE_URL: &str = "https://placehold.co/600x400?text=No+Preview";

/// Upper bound on how much HTML is read and parsed
const MAX_HTML_BYTES: usize = 1024 * 1024;

const MAX_REDIRECTS: usize = 5;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Client(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkMetadata {
    pub title: String,
    pub image_url: String,
    pub domain: String,
}

/// Owns the pooled HTTP client used for every preview fetch
pub struct MetadataFetcher {
    client: Client,
    allow_private_hosts: bool,
}

impl MetadataFetcher {
    pub fn new(config: &MetadataConfig) -> Result<Self, MetadataError> {
        let allow_private_hosts = config.allow_private_hosts;

        // Every hop of a redirect chain gets the same host check as the saved URL
        let redirect_policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if !allow_private_hosts && is_private_host(attempt.url()) {
                attempt.error("redirect to a private or local address")
            } else {
                attempt.follow()
            }
        });

        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(redirect_policy)
            .build()
            .map_err(|e| MetadataError::Client(e.to_string()))?;

        Ok(Self {
            client,
            allow_private_hosts,
        })
    }

    /// Parse `raw_url` under this fetcher's host policy
    pub fn parse_url(&self, raw_url: &str) -> Result<Url, MetadataError> {
        parse_link_url(raw_url, self.allow_private_hosts)
    }

    /// Fetch `raw_url` and extract its preview metadata.
    ///
    /// Network failures, timeouts and non-2xx answers are `Unreachable`.
    /// A reachable page without usable markup still succeeds with fallbacks.
    #[instrument(skip(self))]
    pub async fn fetch(&self, raw_url: &str) -> Result<LinkMetadata, MetadataError> {
        let url = self.parse_url(raw_url)?;

        let unreachable = |reason: String| MetadataError::Unreachable {
            url: raw_url.to_string(),
            reason,
        };

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            warn!("Failed to fetch URL for metadata {}: {}", raw_url, e);
            unreachable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("URL {} answered with status {}", raw_url, status);
            return Err(unreachable(format!("HTTP status {}", status.as_u16())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(|ct| ct.to_ascii_lowercase());

        let is_html = content_type
            .as_deref()
            .map_or(true, |ct| ct.contains("text/html") || ct.contains("xhtml"));

        if !is_html {
            debug!("URL {} returned non-HTML content: {:?}", raw_url, content_type);
            return Ok(LinkMetadata {
                title: FALLBACK_TITLE.to_string(),
                image_url: FALLBACK_IMAGE_URL.to_string(),
                domain: extract_domain(&url),
            });
        }

        // Relative og:image paths resolve against the page actually served
        let final_url = response.url().clone();
        let body = read_capped_body(response).await.map_err(|e| {
            warn!("Failed to read response body for {}: {}", raw_url, e);
            unreachable(e.to_string())
        })?;

        // Redirects may land elsewhere, but the domain stays the one the user saved
        let mut metadata = extract_metadata(&body, &final_url);
        metadata.domain = extract_domain(&url);
        Ok(metadata)
    }
}

/// Read at most `MAX_HTML_BYTES` of the body, decoding lossily
async fn read_capped_body(mut response: Response) -> Result<String, reqwest::Error> {
    let mut buffer = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if append_capped(&mut buffer, &chunk, MAX_HTML_BYTES) {
            debug!("Body of {} exceeded {} bytes, truncating", response.url(), MAX_HTML_BYTES);
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Append as much of `chunk` as fits under `cap`. Returns true once the cap is reached.
fn append_capped(buffer: &mut Vec<u8>, chunk: &[u8], cap: usize) -> bool {
    let room = cap.saturating_sub(buffer.len());
    buffer.extend_from_slice(&chunk[..chunk.len().min(room)]);
    buffer.len() >= cap
}

/// Parse and check a user-supplied link URL.
///
/// Loopback, private, link-local and `localhost` targets are rejected unless
/// `allow_private_hosts` is set.
pub fn parse_link_url(raw_url: &str, allow_private_hosts: bool) -> Result<Url, MetadataError> {
    let url = Url::parse(raw_url.trim())
        .map_err(|e| MetadataError::InvalidUrl(format!("{}: {}", raw_url, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(MetadataError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(MetadataError::InvalidUrl("URL has no host".to_string()));
    }
    if !allow_private_hosts && is_private_host(&url) {
        return Err(MetadataError::InvalidUrl(format!(
            "private or local address not allowed: {}",
            url.host_str().unwrap_or_default()
        )));
    }

    Ok(url)
}

/// Whether the URL names a host on a loopback, private or link-local network
pub fn is_private_host(url: &Url) -> bool {
    match url.host() {
        Some(Host::Ipv4(ip)) => is_private_ipv4(ip),
        Some(Host::Ipv6(ip)) => is_private_ipv6(ip),
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        },
        None => true,
    }
}

fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        // Carrier-grade NAT, 100.64.0.0/10
        || (a == 100 && (64..=127).contains(&b))
}

fn is_private_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_private_ipv4(mapped);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // Unique local fc00::/7 and link-local fe80::/10
        || (first & 0xfe00) == 0xfc00
        || (first & 0xffc0) == 0xfe80
}

/// Pure extraction over an HTML document
pub fn extract_metadata(html: &str, page_url: &Url) -> LinkMetadata {
    let document = Html::parse_document(html);

    let title = extract_meta_property(&document, "og:title")
        .or_else(|| extract_title(&document))
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());

    let image_url = extract_meta_property(&document, "og:image")
        .and_then(|image| page_url.join(&image).ok())
        .map(|image| image.to_string())
        .unwrap_or_else(|| FALLBACK_IMAGE_URL.to_string());

    LinkMetadata {
        title,
        image_url,
        domain: extract_domain(page_url),
    }
}

/// Host name with one leading `www.` removed
pub fn extract_domain(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    non_empty(&title)
}

fn extract_meta_property(document: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[property="{}"]"#, property)).ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .find_map(non_empty)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
