//! Block-signature detection
//!
//! The source answers over-eager clients with challenge pages instead of
//! result data. Detection is a capability so the substring heuristic can be
//! swapped out; substring matching can both false-positive (a listing that
//! mentions "captcha") and false-negative (a marker we have not seen), and
//! the source gives us no way to validate marker completeness.

/// Decides whether a raw payload is a challenge instead of data
pub trait BlockDetector: Send + Sync {
    /// Returns the matched marker when the payload looks blocked
    fn detect(&self, payload: &str) -> Option<String>;
}

/// Case-insensitive substring matcher over a configured marker set
#[derive(Debug, Clone)]
pub struct MarkerBlockList {
    markers: Vec<String>,
}

impl MarkerBlockList {
    pub fn new(markers: &[String]) -> Self {
        Self {
            markers: markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }
}

impl BlockDetector for MarkerBlockList {
    fn detect(&self, payload: &str) -> Option<String> {
        let haystack = payload.to_lowercase();
        self.markers
            .iter()
            .find(|marker| haystack.contains(marker.as_str()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> MarkerBlockList {
        MarkerBlockList::new(&["captcha".to_string(), "incapsula".to_string()])
    }

    #[test]
    fn test_clean_payload_passes() {
        assert!(detector().detect("<html><body>50 results</body></html>").is_none());
    }

    #[test]
    fn test_marker_detected() {
        assert_eq!(
            detector().detect("please solve this captcha to continue"),
            Some("captcha".to_string())
        );
    }

    #[test]
    fn test_detection_is_case_insensitive() {
        assert_eq!(
            detector().detect("<title>Incapsula incident ID</title>"),
            Some("incapsula".to_string())
        );
        assert_eq!(
            detector().detect("CAPTCHA REQUIRED"),
            Some("captcha".to_string())
        );
    }

    #[test]
    fn test_mixed_case_markers_normalized() {
        let detector = MarkerBlockList::new(&["CapTcha".to_string()]);
        assert!(detector.detect("a captcha appeared").is_some());
    }
}
