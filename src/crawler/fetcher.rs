//! Page fetcher
//!
//! Performs one paginated retrieval at a time against the source's search
//! endpoint, replaying the session identity captured at bootstrap. Every
//! request carries a freshly randomized forwarded-for header so requests
//! within one session correlate less; the egress proxy itself stays pinned
//! to the section's dedicated port.

use crate::config::{EgressConfig, SectionConfig, SourceConfig};
use crate::session::{egress_proxy, Session};
use crate::HarvestError;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE, ORIGIN, REFERER};
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use url::Url;

/// Fetches numbered pages for one section with one session
pub struct PageFetcher {
    client: Client,
    search_url: Url,
    keyword: String,
    page_size: u32,
}

impl PageFetcher {
    /// Builds a fetcher bound to a session
    ///
    /// The client pins the session's client identity string and cookie set
    /// as default headers, routes through the section's egress port when an
    /// egress proxy is configured, and bounds connect and read time
    /// independently. Connection reuse across pages is intentional; only the
    /// forwarded identity rotates per request.
    pub fn new(
        source: &SourceConfig,
        egress: Option<&EgressConfig>,
        section: &SectionConfig,
        session: &Session,
        page_size: u32,
    ) -> Result<Self, HarvestError> {
        let base = Url::parse(&source.base_url)?;
        let mut search_url = base.join(&source.search_path)?;
        search_url
            .query_pairs_mut()
            .append_pair("Keyword", &section.keyword);

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        if let Ok(value) = HeaderValue::from_str(search_url.as_str()) {
            headers.insert(REFERER, value);
        }
        if let Ok(value) = HeaderValue::from_str(base.as_str().trim_end_matches('/')) {
            headers.insert(ORIGIN, value);
        }
        if let Some(cookie_header) = session.cookie_header() {
            if let Ok(value) = HeaderValue::from_str(&cookie_header) {
                headers.insert(COOKIE, value);
            }
        }

        let mut builder = Client::builder()
            .user_agent(session.user_agent.clone())
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .gzip(true)
            .brotli(true);

        if let (Some(egress), Some(port)) = (egress, section.proxy_port) {
            builder = builder.proxy(egress_proxy(egress, port)?);
        }

        Ok(Self {
            client: builder.build()?,
            search_url,
            keyword: section.keyword.clone(),
            page_size,
        })
    }

    /// Retrieves one page's raw payload
    ///
    /// Exactly one transport-level retry on connection failures (the request
    /// never reached the server, so resending is idempotent). Everything
    /// else propagates for the supervisor to classify.
    pub async fn fetch(&self, page: u32) -> Result<String, HarvestError> {
        match self.send(page).await {
            Ok(payload) => Ok(payload),
            Err(HarvestError::Reqwest(e)) if e.is_connect() => {
                tracing::debug!(page, error = %e, "connect failure, one transport retry");
                self.send(page).await
            }
            Err(e) => Err(e),
        }
        .map_err(|e| match e {
            HarvestError::Auth(_) => e,
            HarvestError::Transport { .. } => e,
            other => HarvestError::Transport {
                page,
                message: other.to_string(),
            },
        })
    }

    async fn send(&self, page: u32) -> Result<String, HarvestError> {
        let body = json!({
            "keyword": self.keyword,
            "pageSize": self.page_size,
            "currentPage": page,
        });

        let response = self
            .client
            .post(self.search_url.clone())
            .header("X-Forwarded-For", random_forwarded_ip())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::PROXY_AUTHENTICATION_REQUIRED {
            return Err(HarvestError::Auth(format!(
                "proxy rejected credentials on page {}",
                page
            )));
        }

        if !status.is_success() {
            return Err(HarvestError::Transport {
                page,
                message: format!("HTTP {}", status),
            });
        }

        response.text().await.map_err(|e| HarvestError::Transport {
            page,
            message: e.to_string(),
        })
    }
}

/// Generates a random forwarded-for IP, one per request
fn random_forwarded_ip() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "{}.{}.{}.{}",
        rng.gen_range(1..=255),
        rng.gen_range(1..=255),
        rng.gen_range(1..=255),
        rng.gen_range(1..=255)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::CookiePair;

    fn test_session() -> Session {
        Session {
            cookies: vec![CookiePair {
                name: "sid".to_string(),
                value: "abc".to_string(),
            }],
            user_agent: "TestAgent/1.0".to_string(),
        }
    }

    fn test_source(base: &str) -> SourceConfig {
        SourceConfig {
            base_url: base.to_string(),
            search_path: "/Search".to_string(),
            ready_selector: "div.result-card".to_string(),
            total_selector: "#totalCount".to_string(),
            bootstrap_timeout_secs: 5,
            bootstrap_poll_ms: 100,
        }
    }

    fn test_section() -> SectionConfig {
        SectionConfig {
            keyword: "bmw".to_string(),
            proxy_port: None,
            page_size: None,
        }
    }

    #[test]
    fn test_build_fetcher() {
        let fetcher = PageFetcher::new(
            &test_source("https://listings.example.com"),
            None,
            &test_section(),
            &test_session(),
            50,
        );
        assert!(fetcher.is_ok());
    }

    #[test]
    fn test_random_forwarded_ip_shape() {
        for _ in 0..20 {
            let ip = random_forwarded_ip();
            let octets: Vec<_> = ip.split('.').collect();
            assert_eq!(octets.len(), 4);
            for octet in octets {
                let value: u16 = octet.parse().unwrap();
                assert!((1..=255).contains(&value));
            }
        }
    }

    // Wire-level behavior (status mapping, the single transport retry) is
    // covered against a mock server in tests/harvest_tests.rs.
}
