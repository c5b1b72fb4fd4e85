/// One cookie captured during session bootstrap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePair {
    pub name: String,
    pub value: String,
}

/// An authenticated session descriptor
///
/// Exclusively owned by one crawl attempt; never shared across sections or
/// reused after a restart.
#[derive(Debug, Clone)]
pub struct Session {
    /// Cookies to replay on every paginated request
    pub cookies: Vec<CookiePair>,

    /// Client identity string the session was established under
    pub user_agent: String,
}

impl Session {
    /// Renders the cookie set as a `Cookie` request header value
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        Some(
            self.cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header_empty() {
        let session = Session {
            cookies: vec![],
            user_agent: "TestAgent/1.0".to_string(),
        };
        assert!(session.cookie_header().is_none());
    }

    #[test]
    fn test_cookie_header_joined() {
        let session = Session {
            cookies: vec![
                CookiePair {
                    name: "sid".to_string(),
                    value: "abc".to_string(),
                },
                CookiePair {
                    name: "geo".to_string(),
                    value: "us".to_string(),
                },
            ],
            user_agent: "TestAgent/1.0".to_string(),
        };
        assert_eq!(session.cookie_header().unwrap(), "sid=abc; geo=us");
    }
}
