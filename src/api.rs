// API client module: a small blocking HTTP client plus the two search
// pipelines built on top of it.
//
// - Wikipedia is a two-step lookup: opensearch maps free text to a page
//   title, then the page-images query maps that title to its original image.
// - Google Images is a single page fetch whose HTML is handed to `extract`.
//
// All network access goes through the `Fetch` trait so the pipelines can be
// exercised against canned bodies.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{Config, Endpoints};
use crate::error::SearchError;
use crate::extract::extract_first_image;

/// Stored in `PageImageRecord::image_url` when the page has no original image.
pub const NO_IMAGE: &str = "no-image";

/// Anything that can GET a URL and hand back the body as text.
pub trait Fetch {
    fn get_text(&self, url: &str) -> Result<String, SearchError>;
}

/// `Fetch` over a reqwest blocking client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpFetcher { client })
    }
}

impl Fetch for HttpFetcher {
    fn get_text(&self, url: &str) -> Result<String, SearchError> {
        log::debug!("GET {}", url);
        let res = self.client.get(url).send()?;
        let status = res.status();
        if !status.is_success() {
            log::debug!("{} answered with {}", url, status);
            return Err(SearchError::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(res.text()?)
    }
}

/// The opensearch answer `[term, [titles], [descriptions], [urls]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpensearchResult {
    pub term: String,
    pub titles: Vec<String>,
    pub descriptions: Vec<String>,
    pub urls: Vec<String>,
}

/// A Wikipedia page title and its original image URL (or `NO_IMAGE`).
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PageImageRecord {
    pub name: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

/// What was found on the Google Images page. Either field may be missing
/// when the page did not render an image the way we expect.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeRecord {
    #[serde(rename = "Search")]
    pub search: Option<String>,
    #[serde(rename = "Image_url")]
    pub image_url: Option<String>,
}

#[derive(Deserialize, Debug)]
struct PageImagesResponse {
    query: Option<PageImagesQuery>,
}

#[derive(Deserialize, Debug)]
struct PageImagesQuery {
    #[serde(default)]
    pages: BTreeMap<String, PageEntry>,
}

#[derive(Deserialize, Debug)]
struct PageEntry {
    original: Option<OriginalImage>,
}

#[derive(Deserialize, Debug)]
struct OriginalImage {
    source: String,
}

pub fn opensearch_url(base: &str, term: &str) -> String {
    format!(
        "{}?action=opensearch&search={}&limit=1&namespace=0",
        base,
        urlencoding::encode(term)
    )
}

pub fn page_images_url(base: &str, title: &str) -> String {
    format!(
        "{}?action=query&prop=pageimages&piprop=original&titles={}&format=json",
        base,
        urlencoding::encode(title)
    )
}

pub fn google_images_url(base: &str, term: &str) -> String {
    format!("{}?q={}", base, urlencoding::encode(term))
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Parse an opensearch body, rejecting answers that matched no page.
pub fn parse_opensearch(body: &str) -> Result<OpensearchResult, SearchError> {
    let values: Vec<Value> = serde_json::from_str(body)?;
    if values.is_empty() {
        return Err(SearchError::invalid_response("empty opensearch response"));
    }
    if values.len() < 2 {
        return Err(SearchError::invalid_response(
            "opensearch response has no title list",
        ));
    }

    let result = OpensearchResult {
        term: values[0].as_str().unwrap_or_default().to_string(),
        titles: string_list(values.get(1)),
        descriptions: string_list(values.get(2)),
        urls: string_list(values.get(3)),
    };
    if result.titles.is_empty() || result.urls.is_empty() {
        return Err(SearchError::InvalidResponse(format!(
            "no page matches {:?}",
            result.term
        )));
    }
    Ok(result)
}

/// Pick the image URL out of a page-images body.
///
/// Only one title is ever requested, so there is normally a single page.
/// When there are several, page ids are compared numerically and
/// non-numeric keys such as `"-1"` come last.
pub fn parse_page_image(body: &str) -> Result<String, SearchError> {
    let response: PageImagesResponse = serde_json::from_str(body)?;
    let page = response
        .query
        .and_then(|q| {
            q.pages
                .into_iter()
                .min_by_key(|(id, _)| id.parse::<u64>().map_or((1, 0), |n| (0, n)))
        })
        .map(|(_, page)| page)
        .ok_or_else(|| SearchError::invalid_response("page-images response has no page"))?;

    Ok(page
        .original
        .map(|image| image.source)
        .unwrap_or_else(|| NO_IMAGE.to_string()))
}

/// Holds the fetcher and the endpoints the pipelines talk to.
pub struct ApiClient<F = HttpFetcher> {
    fetcher: F,
    endpoints: Endpoints,
}

impl ApiClient<HttpFetcher> {
    /// Create an ApiClient configured from the environment. See
    /// `Config::from_env` for the variables and their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_config(&Config::from_env())
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(config)?;
        Ok(ApiClient::with_fetcher(fetcher, config.endpoints.clone()))
    }
}

impl<F: Fetch> ApiClient<F> {
    pub fn with_fetcher(fetcher: F, endpoints: Endpoints) -> Self {
        ApiClient { fetcher, endpoints }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Map a free-text term to the best matching Wikipedia page.
    pub fn search_wiki(&self, term: &str) -> Result<OpensearchResult, SearchError> {
        let url = opensearch_url(&self.endpoints.wikipedia_api, term);
        let body = self.fetcher.get_text(&url)?;
        let result = parse_opensearch(&body)?;
        log::info!("Wikipedia matched {:?} for {:?}", result.titles, term);
        Ok(result)
    }

    /// Look up the original image of the first page in `result`.
    pub fn search_image(&self, result: &OpensearchResult) -> Result<PageImageRecord, SearchError> {
        let title = result
            .titles
            .first()
            .ok_or_else(|| SearchError::invalid_response("opensearch result has no title"))?;
        if title.is_empty() {
            return Err(SearchError::invalid_response("matched page title is empty"));
        }

        let url = page_images_url(&self.endpoints.wikipedia_api, title);
        let body = self.fetcher.get_text(&url)?;
        let image_url = parse_page_image(&body)?;
        log::info!("Page {:?} image: {}", title, image_url);

        Ok(PageImageRecord {
            name: title.clone(),
            image_url,
        })
    }

    /// Both Wikipedia steps in sequence.
    pub fn lookup_wikipedia(&self, term: &str) -> Result<PageImageRecord, SearchError> {
        let result = self.search_wiki(term)?;
        self.search_image(&result)
    }

    /// Fetch the Google Images page for `term` and report its first image.
    pub fn search_google(&self, term: &str) -> Result<ScrapeRecord, SearchError> {
        let url = google_images_url(&self.endpoints.google_images, term);
        let html = self.fetcher.get_text(&url)?;

        let record = match extract_first_image(&html) {
            Some(image) => ScrapeRecord {
                search: image.alt,
                image_url: image.src,
            },
            None => {
                log::debug!("No <img> found on the Google results page for {:?}", term);
                ScrapeRecord::default()
            }
        };
        Ok(record)
    }
}
