//! Session bootstrap capability
//!
//! Bootstrapping establishes an authenticated session and discovers the
//! total page count before bulk fetching starts. The capability is a trait
//! so the crawl core never depends on how the session is actually obtained;
//! the in-repo implementation drives the search page over plain HTTP with
//! an explicit content-ready predicate and an explicit overall timeout.

use crate::config::{EgressConfig, SectionConfig, SourceConfig};
use crate::session::types::{CookiePair, Session};
use crate::HarvestError;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::{Client, Proxy, StatusCode};
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Result of a successful bootstrap
#[derive(Debug, Clone)]
pub struct BootstrapOutcome {
    pub session: Session,

    /// Total pages the section spans at the effective page size
    pub total_pages: u32,
}

/// Establishes a session for one section
///
/// Implementations must release every resource they privately allocate
/// (clients, profiles, temp state) on all exit paths, success or failure,
/// and must have no durable side effects beyond the returned descriptor.
#[async_trait]
pub trait SessionBootstrap: Send + Sync {
    async fn acquire(
        &self,
        section: &SectionConfig,
        page_size: u32,
    ) -> Result<BootstrapOutcome, HarvestError>;
}

/// Client identity strings rotated per session
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
];

/// HTTP-based session bootstrapper
///
/// Polls the keyword search page until the configured content-ready selector
/// matches, then reads the total result count and captures the cookies the
/// source handed out along the way. Everything it allocates is scoped to the
/// `acquire` call.
pub struct HttpBootstrap {
    source: SourceConfig,
    egress: Option<EgressConfig>,
}

impl HttpBootstrap {
    pub fn new(source: SourceConfig, egress: Option<EgressConfig>) -> Self {
        Self { source, egress }
    }

    fn search_url(&self, keyword: &str) -> Result<Url, HarvestError> {
        let mut url = Url::parse(&self.source.base_url)?.join(&self.source.search_path)?;
        url.query_pairs_mut().append_pair("Keyword", keyword);
        Ok(url)
    }

    fn build_client(&self, section: &SectionConfig, user_agent: &str) -> Result<Client, HarvestError> {
        let mut builder = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .gzip(true)
            .brotli(true);

        if let (Some(egress), Some(port)) = (&self.egress, section.proxy_port) {
            builder = builder.proxy(egress_proxy(egress, port)?);
        }

        builder.build().map_err(HarvestError::from)
    }

    /// Checks one snapshot of the search page
    ///
    /// Returns `Some(total_items)` once the ready selector matches. A page
    /// that is ready but has no parseable total counts as zero results,
    /// which the caller turns into zero pages.
    fn probe(&self, body: &str) -> Option<u64> {
        let ready = Selector::parse(&self.source.ready_selector).ok()?;
        let total = Selector::parse(&self.source.total_selector).ok()?;

        let document = Html::parse_document(body);
        document.select(&ready).next()?;

        let count = document
            .select(&total)
            .next()
            .map(|el| el.text().collect::<String>())
            .and_then(|text| text.trim().replace(',', "").parse::<u64>().ok())
            .unwrap_or(0);

        Some(count)
    }
}

#[async_trait]
impl SessionBootstrap for HttpBootstrap {
    async fn acquire(
        &self,
        section: &SectionConfig,
        page_size: u32,
    ) -> Result<BootstrapOutcome, HarvestError> {
        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
            .to_string();

        let client = self.build_client(section, &user_agent)?;
        let url = self.search_url(&section.keyword)?;

        let deadline = Instant::now() + Duration::from_secs(self.source.bootstrap_timeout_secs);
        let poll = Duration::from_millis(self.source.bootstrap_poll_ms);

        // Cookies accumulate across polls; a later Set-Cookie for the same
        // name wins, like a browser jar.
        let mut cookies: BTreeMap<String, String> = BTreeMap::new();

        loop {
            match client.get(url.clone()).send().await {
                Ok(response) => {
                    if response.status() == StatusCode::PROXY_AUTHENTICATION_REQUIRED {
                        return Err(HarvestError::Auth(format!(
                            "proxy rejected credentials for '{}'",
                            section.keyword
                        )));
                    }

                    for value in response.headers().get_all(reqwest::header::SET_COOKIE) {
                        if let Ok(raw) = value.to_str() {
                            if let Some((name, val)) = parse_set_cookie(raw) {
                                cookies.insert(name, val);
                            }
                        }
                    }

                    let status = response.status();
                    if status.is_success() {
                        let body = response.text().await.map_err(|e| {
                            HarvestError::Bootstrap {
                                keyword: section.keyword.clone(),
                                message: format!("failed to read search page: {}", e),
                            }
                        })?;

                        if let Some(total_items) = self.probe(&body) {
                            let total_pages = total_items.div_ceil(page_size as u64) as u32;
                            tracing::info!(
                                total_items,
                                total_pages,
                                "search page ready, session established"
                            );

                            let session = Session {
                                cookies: cookies
                                    .into_iter()
                                    .map(|(name, value)| CookiePair { name, value })
                                    .collect(),
                                user_agent,
                            };

                            return Ok(BootstrapOutcome {
                                session,
                                total_pages,
                            });
                        }

                        tracing::debug!("search page not ready yet");
                    } else {
                        tracing::debug!(status = %status, "search page returned non-success");
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "bootstrap request failed, will re-poll");
                }
            }

            if Instant::now() + poll > deadline {
                return Err(HarvestError::Bootstrap {
                    keyword: section.keyword.clone(),
                    message: format!(
                        "content-ready predicate '{}' not satisfied within {}s",
                        self.source.ready_selector, self.source.bootstrap_timeout_secs
                    ),
                });
            }

            tokio::time::sleep(poll).await;
        }
    }
}

/// Builds the egress proxy for a section's dedicated port
pub(crate) fn egress_proxy(egress: &EgressConfig, port: u16) -> Result<Proxy, HarvestError> {
    let proxy = Proxy::all(format!("http://{}:{}", egress.host, port))?;

    Ok(match (&egress.username, &egress.password) {
        (Some(user), Some(pass)) => proxy.basic_auth(user, pass),
        _ => proxy,
    })
}

fn parse_set_cookie(raw: &str) -> Option<(String, String)> {
    let pair = raw.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_source() -> SourceConfig {
        SourceConfig {
            base_url: "https://listings.example.com".to_string(),
            search_path: "/Search".to_string(),
            ready_selector: "div.result-card".to_string(),
            total_selector: "#totalCount".to_string(),
            bootstrap_timeout_secs: 5,
            bootstrap_poll_ms: 100,
        }
    }

    #[test]
    fn test_search_url_carries_keyword() {
        let bootstrap = HttpBootstrap::new(test_source(), None);
        let url = bootstrap.search_url("bmw").unwrap();
        assert_eq!(
            url.as_str(),
            "https://listings.example.com/Search?Keyword=bmw"
        );
    }

    #[test]
    fn test_probe_not_ready() {
        let bootstrap = HttpBootstrap::new(test_source(), None);
        assert!(bootstrap.probe("<html><body>loading...</body></html>").is_none());
    }

    #[test]
    fn test_probe_ready_with_total() {
        let bootstrap = HttpBootstrap::new(test_source(), None);
        let body = r#"<html><body>
            <span id="totalCount">1,234</span>
            <div class="result-card"><a href="/detail/1">x</a></div>
        </body></html>"#;
        assert_eq!(bootstrap.probe(body), Some(1_234));
    }

    #[test]
    fn test_probe_ready_without_total_is_zero() {
        let bootstrap = HttpBootstrap::new(test_source(), None);
        let body = r#"<div class="result-card">x</div>"#;
        assert_eq!(bootstrap.probe(body), Some(0));
    }

    #[test]
    fn test_parse_set_cookie() {
        assert_eq!(
            parse_set_cookie("sid=abc123; Path=/; HttpOnly"),
            Some(("sid".to_string(), "abc123".to_string()))
        );
        assert_eq!(parse_set_cookie("malformed"), None);
    }
}
