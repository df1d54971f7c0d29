use async_trait::async_trait;
use market_core::{MarketError, MarketResult, TextFetcher};
use reqwest::{header, Client, Url};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// Several upstreams reject requests without a browser-like agent.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120 Safari/537.36";

const ACCEPT_ANY: &str =
    "application/json, application/rss+xml, application/xml, text/xml, text/plain, */*";

/// Shared reqwest-backed fetcher used by every upstream adapter.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(default_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(default_timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }
}

#[async_trait]
impl TextFetcher for HttpFetcher {
    async fn get_text(&self, url: &str, timeout: Duration) -> MarketResult<String> {
        let mut request = self
            .client
            .get(url)
            .timeout(timeout)
            .header(header::ACCEPT, ACCEPT_ANY)
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9");

        // Yahoo answers 401/403 more often without a finance.yahoo.com referer
        if host_of(url).ends_with("yahoo.com") {
            request = request.header(header::REFERER, "https://finance.yahoo.com/");
        }

        let response = request.send().await.map_err(|e| map_transport_error(url, e))?;
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(MarketError::RateLimited {
                provider: host_of(url),
            });
        }

        if !status.is_success() {
            return Err(MarketError::Http {
                status: status.as_u16(),
                url: redact(url),
            });
        }

        response.text().await.map_err(|e| map_transport_error(url, e))
    }
}

fn map_transport_error(url: &str, err: reqwest::Error) -> MarketError {
    if err.is_timeout() {
        MarketError::Timeout(redact(url))
    } else {
        MarketError::Network(format!("{}: {}", redact(url), err.without_url()))
    }
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// True for `http`/`https` URLs whose host is a public name or address. Loopback,
/// private, link-local and unspecified targets are refused, as is `localhost`.
pub fn is_public_web_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };

    let host = host.trim_start_matches('[').trim_end_matches(']');
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => is_public_v4(ip),
        Ok(IpAddr::V6(ip)) => is_public_v6(ip),
        Err(_) => {
            let host = host.trim_end_matches('.').to_ascii_lowercase();
            host != "localhost" && !host.ends_with(".localhost")
        }
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    !(ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified() || ip.is_broadcast())
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_public_v4(v4);
    }
    let first = ip.segments()[0];
    let unique_local = first & 0xfe00 == 0xfc00;
    let link_local = first & 0xffc0 == 0xfe80;
    !(ip.is_loopback() || ip.is_unspecified() || unique_local || link_local)
}

/// Drop the query string so API keys never reach logs or error bodies.
pub fn redact(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => base.to_string(),
        None => url.to_string(),
    }
}

/// Join path segments (percent-encoded) and query pairs onto a base URL.
pub fn build_url(base: &str, segments: &[&str], params: &[(&str, &str)]) -> MarketResult<String> {
    let mut url = Url::parse(base)
        .map_err(|e| MarketError::Config(format!("invalid base url {}: {}", base, e)))?;

    if !segments.is_empty() {
        url.path_segments_mut()
            .map_err(|_| MarketError::Config(format!("{} cannot take path segments", base)))?
            .pop_if_empty()
            .extend(segments);
    }

    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }

    Ok(url.into())
}
