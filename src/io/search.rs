//! Granule search against NASA's Common Metadata Repository (CMR).

use crate::constants::{CMR_GRANULE_SEARCH_URL, SHORT_NAME, VERSION};
use crate::types::{BoundingBox, Geolocation, Vnp21Error, Vnp21Result};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// CMR endpoint and collection selection
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub cmr_url: String,
    /// When set, searched instead of short name + version
    pub collection_concept_id: Option<String>,
    pub short_name: String,
    pub version: String,
    pub page_size: usize,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cmr_url: CMR_GRANULE_SEARCH_URL.to_string(),
            collection_concept_id: None,
            short_name: SHORT_NAME.to_string(),
            version: VERSION.to_string(),
            page_size: 2000,
            timeout_secs: 30,
        }
    }
}

/// Temporal and spatial filters. Dates are UTC and inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub bbox: Option<BoundingBox>,
    /// (lon, lat)
    pub point: Option<(f64, f64)>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a single day
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn point(mut self, lon: f64, lat: f64) -> Self {
        self.point = Some((lon, lat));
        self
    }

    /// Search over the extent of an existing swath
    pub fn geometry(mut self, geometry: &Geolocation) -> Self {
        self.bbox = geometry.bounding_box();
        self
    }

    /// CMR `temporal` value, or `None` when unconstrained
    fn temporal(&self) -> Vnp21Result<Option<String>> {
        let (start, end) = match self.date {
            Some(date) => (Some(date), Some(date)),
            None => (self.start_date, self.end_date),
        };

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(Vnp21Error::InvalidArgument(format!(
                    "start date {} is after end date {}",
                    start, end
                )));
            }
        }

        if start.is_none() && end.is_none() {
            return Ok(None);
        }

        let start = start
            .map(|d| format!("{}T00:00:00Z", d.format("%Y-%m-%d")))
            .unwrap_or_default();
        let end = end
            .map(|d| format!("{}T23:59:59Z", d.format("%Y-%m-%d")))
            .unwrap_or_default();

        Ok(Some(format!("{},{}", start, end)))
    }

    /// Full CMR request URL for one page of results (pages start at 1)
    pub fn to_url(&self, config: &SearchConfig, page_num: usize) -> Vnp21Result<Url> {
        if config.page_size == 0 {
            return Err(Vnp21Error::InvalidArgument("page_size must be at least 1".to_string()));
        }

        let mut url = Url::parse(&config.cmr_url)
            .map_err(|e| Vnp21Error::InvalidArgument(format!("Invalid CMR URL {}: {}", config.cmr_url, e)))?;
        let temporal = self.temporal()?;

        {
            let mut pairs = url.query_pairs_mut();

            match &config.collection_concept_id {
                Some(concept_id) => {
                    pairs.append_pair("collection_concept_id", concept_id);
                }
                None => {
                    pairs.append_pair("short_name", &config.short_name);
                    pairs.append_pair("version", &config.version);
                }
            }

            if let Some(temporal) = &temporal {
                pairs.append_pair("temporal", temporal);
            }

            if let Some(bbox) = &self.bbox {
                pairs.append_pair(
                    "bounding_box",
                    &format!("{},{},{},{}", bbox.min_lon, bbox.min_lat, bbox.max_lon, bbox.max_lat),
                );
            }

            if let Some((lon, lat)) = self.point {
                pairs.append_pair("point", &format!("{},{}", lon, lat));
            }

            pairs.append_pair("sort_key", "start_date");
            pairs.append_pair("page_size", &config.page_size.to_string());
            pairs.append_pair("page_num", &page_num.to_string());
        }

        Ok(url)
    }
}

/// A granule found in the remote archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteGranule {
    pub id: String,
    pub title: String,
    pub time_start: Option<DateTime<Utc>>,
    pub time_end: Option<DateTime<Utc>>,
    pub data_url: String,
    pub size_mb: Option<f64>,
}

impl RemoteGranule {
    /// Last path segment of the data URL, or the title when the URL has none
    pub fn filename(&self) -> String {
        Url::parse(&self.data_url)
            .ok()
            .and_then(|url| {
                url.path_segments()
                    .and_then(|segments| segments.last().map(|s| s.to_string()))
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.title.clone())
    }
}

#[derive(Debug, Deserialize)]
struct CmrResponse {
    feed: CmrFeed,
}

#[derive(Debug, Deserialize)]
struct CmrFeed {
    #[serde(default)]
    entry: Vec<CmrEntry>,
}

#[derive(Debug, Deserialize)]
struct CmrEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    producer_granule_id: Option<String>,
    #[serde(default)]
    time_start: Option<String>,
    #[serde(default)]
    time_end: Option<String>,
    #[serde(default)]
    granule_size: Option<String>,
    #[serde(default)]
    links: Vec<CmrLink>,
}

#[derive(Debug, Deserialize)]
struct CmrLink {
    href: String,
    #[serde(default)]
    rel: String,
    #[serde(default)]
    inherited: bool,
}

const DATA_REL_SUFFIX: &str = "/data#";

fn parse_time(value: &Option<String>) -> Option<DateTime<Utc>> {
    value
        .as_deref()
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|t| t.with_timezone(&Utc))
}

impl CmrEntry {
    fn data_url(&self) -> Option<&str> {
        let data_links: Vec<&CmrLink> = self
            .links
            .iter()
            .filter(|l| l.rel.ends_with(DATA_REL_SUFFIX) && !l.inherited)
            .collect();

        data_links
            .iter()
            .find(|l| l.href.ends_with(".nc"))
            .or_else(|| data_links.first())
            .map(|l| l.href.as_str())
    }
}

/// One page of CMR results
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub granules: Vec<RemoteGranule>,
    /// Entries CMR returned, including any skipped for lacking a data link
    pub entry_count: usize,
}

impl SearchPage {
    /// A page with fewer entries than requested is the last one
    pub fn is_last(&self, page_size: usize) -> bool {
        self.entry_count < page_size
    }
}

/// Parse a CMR `granules.json` body; entries without a data link are skipped
pub fn parse_search_response(body: &str) -> Vnp21Result<Vec<RemoteGranule>> {
    Ok(parse_search_page(body)?.granules)
}

pub fn parse_search_page(body: &str) -> Vnp21Result<SearchPage> {
    let response: CmrResponse = serde_json::from_str(body)
        .map_err(|e| Vnp21Error::InvalidFormat(format!("Failed to parse CMR response: {}", e)))?;

    let mut granules = Vec::with_capacity(response.feed.entry.len());

    for entry in &response.feed.entry {
        let data_url = match entry.data_url() {
            Some(url) => url.to_string(),
            None => {
                log::warn!("CMR entry {} has no data link, skipping", entry.id);
                continue;
            }
        };

        granules.push(RemoteGranule {
            id: entry.id.clone(),
            title: entry
                .producer_granule_id
                .clone()
                .unwrap_or_else(|| entry.title.clone()),
            time_start: parse_time(&entry.time_start),
            time_end: parse_time(&entry.time_end),
            data_url,
            size_mb: entry.granule_size.as_deref().and_then(|s| s.parse().ok()),
        });
    }

    Ok(SearchPage {
        granules,
        entry_count: response.feed.entry.len(),
    })
}

/// Find VNP21IMG-NRT granules matching `query`
pub fn search_granules(query: &SearchQuery, config: &SearchConfig) -> Vnp21Result<Vec<RemoteGranule>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let mut granules = Vec::new();

    for page_num in 1.. {
        let url = query.to_url(config, page_num)?;
        log::debug!("Requesting CMR page {}: {}", page_num, url);

        let response = client.get(url).send()?;
        if !response.status().is_success() {
            return Err(Vnp21Error::Search(format!(
                "CMR returned {} for page {}",
                response.status(),
                page_num
            )));
        }

        let page = parse_search_page(&response.text()?)?;
        let last = page.is_last(config.page_size);
        granules.extend(page.granules);

        if last {
            break;
        }
    }

    log::info!("Found {} {} granules", granules.len(), config.short_name);

    Ok(granules)
}
