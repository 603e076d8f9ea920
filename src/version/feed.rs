//! Atom and RSS document shapes used by the forge fetchers

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::version::error::FetchError;

#[derive(Debug, Deserialize)]
pub struct AtomFeed {
    #[serde(rename = "entry", default)]
    pub entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AtomEntry {
    #[serde(rename = "link", default)]
    pub links: Vec<AtomLink>,
    pub updated: Option<String>,
}

impl AtomEntry {
    pub fn href(&self) -> Option<&str> {
        self.links.first().map(|link| link.href.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub struct AtomLink {
    #[serde(rename = "@href")]
    pub href: String,
}

#[derive(Debug, Deserialize)]
pub struct RssDocument {
    pub channel: RssChannel,
}

#[derive(Debug, Deserialize)]
pub struct RssChannel {
    #[serde(rename = "item", default)]
    pub items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
pub struct RssItem {
    pub title: Option<String>,
}

/// Parse an XML feed body into one of the document shapes above
pub fn parse<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, FetchError> {
    quick_xml::de::from_str(body)
        .map_err(|e| FetchError::InvalidResponse(format!("{url}: malformed feed: {e}")))
}

/// Last path segment of a link, percent-decoded
///
/// Release and commit links end in the tag name or commit hash.
pub fn last_path_segment(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    if segment.is_empty() {
        return None;
    }
    Some(
        percent_encoding::percent_decode_str(segment)
            .decode_utf8_lossy()
            .into_owned(),
    )
}
