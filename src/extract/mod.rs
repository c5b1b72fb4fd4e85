//! Item extraction
//!
//! Converts one raw page payload into an ordered sequence of opaque records.
//! The crawl core only appends and counts items; which fields an item
//! carries is owned entirely by the extractor configuration.

use crate::config::ExtractorConfig;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

/// One extracted record. Opaque to the crawl core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(pub Value);

/// Converts a raw payload into an ordered item sequence
///
/// Implementations must preserve document order; checkpoint arithmetic
/// depends on pages appending a stable count of items.
pub trait ItemExtractor: Send + Sync {
    fn extract(&self, raw: &str) -> Result<Vec<Item>, String>;
}

/// Selector-driven extractor
///
/// Walks every card element, takes title and link from the configured
/// anchor, and adds one entry per configured field selector. Cards without
/// an anchor are skipped, matching how listing sites pad result grids with
/// placeholder cells.
pub struct SelectorExtractor {
    card: Selector,
    link: Selector,
    fields: Vec<(String, Selector)>,
    base_url: Url,
}

impl SelectorExtractor {
    /// Builds an extractor from validated configuration
    ///
    /// Selectors were already parse-checked during config validation, so a
    /// failure here means the config bypassed `validate`.
    pub fn new(config: &ExtractorConfig, base_url: &Url) -> Result<Self, String> {
        let card = Selector::parse(&config.card_selector)
            .map_err(|e| format!("card selector: {:?}", e))?;
        let link = Selector::parse(&config.link_selector)
            .map_err(|e| format!("link selector: {:?}", e))?;

        let mut fields = Vec::with_capacity(config.fields.len());
        for (name, selector) in &config.fields {
            let parsed =
                Selector::parse(selector).map_err(|e| format!("field '{}': {:?}", name, e))?;
            fields.push((name.clone(), parsed));
        }

        Ok(Self {
            card,
            link,
            fields,
            base_url: base_url.clone(),
        })
    }

    fn field_text(card: &ElementRef<'_>, selector: &Selector) -> Option<String> {
        card.select(selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl ItemExtractor for SelectorExtractor {
    fn extract(&self, raw: &str) -> Result<Vec<Item>, String> {
        let document = Html::parse_document(raw);
        let mut items = Vec::new();

        for card in document.select(&self.card) {
            let anchor = match card.select(&self.link).next() {
                Some(a) => a,
                None => continue,
            };

            let title = anchor.text().collect::<String>().trim().to_string();
            let link = anchor
                .value()
                .attr("href")
                .and_then(|href| self.base_url.join(href).ok())
                .map(|u| u.to_string());

            let mut record = json!({
                "title": title,
                "link": link,
            });

            for (name, selector) in &self.fields {
                let value = Self::field_text(&card, selector)
                    .map(Value::String)
                    .unwrap_or(Value::Null);
                record[name.as_str()] = value;
            }

            items.push(Item(record));
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn test_config() -> ExtractorConfig {
        let mut fields = BTreeMap::new();
        fields.insert("odometer".to_string(), "span.odometer".to_string());
        fields.insert("damage".to_string(), "span.damage".to_string());

        ExtractorConfig {
            card_selector: "div.result-card".to_string(),
            link_selector: "a".to_string(),
            fields,
        }
    }

    fn extractor() -> SelectorExtractor {
        let base = Url::parse("https://listings.example.com").unwrap();
        SelectorExtractor::new(&test_config(), &base).unwrap()
    }

    const SAMPLE: &str = r#"
        <html><body>
          <div class="result-card">
            <a href="/detail/1">First Lot</a>
            <span class="odometer">120,000 mi</span>
            <span class="damage">Front End</span>
          </div>
          <div class="result-card">
            <a href="/detail/2">Second Lot</a>
          </div>
          <div class="result-card"><span class="odometer">no anchor</span></div>
        </body></html>
    "#;

    #[test]
    fn test_extracts_items_in_document_order() {
        let items = extractor().extract(SAMPLE).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].0["title"], "First Lot");
        assert_eq!(items[1].0["title"], "Second Lot");
    }

    #[test]
    fn test_links_resolved_against_base_url() {
        let items = extractor().extract(SAMPLE).unwrap();
        assert_eq!(
            items[0].0["link"],
            "https://listings.example.com/detail/1"
        );
    }

    #[test]
    fn test_missing_field_is_null() {
        let items = extractor().extract(SAMPLE).unwrap();
        assert_eq!(items[0].0["odometer"], "120,000 mi");
        assert_eq!(items[1].0["odometer"], Value::Null);
    }

    #[test]
    fn test_cards_without_anchor_skipped() {
        let items = extractor().extract(SAMPLE).unwrap();
        assert!(items.iter().all(|i| i.0["title"] != "no anchor"));
    }

    #[test]
    fn test_empty_payload_yields_no_items() {
        let items = extractor().extract("<html><body></body></html>").unwrap();
        assert!(items.is_empty());
    }
}
