use std::future::Future;

use log::{debug, warn};
use reqwest::{Client, Url, header::ACCEPT};

use crate::clients::{
    entities::{SearchResult, Song},
    errors::{Error, Result},
};
use crate::config::{Config, parse_api_url};

/// Anything that can turn a query into a list of songs.
///
/// The browser only talks to this trait, which lets tests script completion
/// order without a network.
pub trait SongSearch {
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<Song>>> + Send;
}

/// Lowercases the query and replaces every space with `+`.
pub fn normalize(query: &str) -> String {
    query.to_lowercase().replace(' ', "+")
}

/// Decodes a raw response body into songs, in server order.
/// A single malformed entry fails the whole body.
pub fn decode(body: &[u8]) -> Result<Vec<Song>> {
    let envelope: SearchResult = serde_json::from_slice(body)?;
    Ok(envelope.results)
}

pub struct SearchClient {
    http: Client,
    api_url: Url,
    entity: String,
    limit: Option<u32>,
}

impl SearchClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_url = parse_api_url(&config.api_url)?;

        // No timeout unless configured, the platform default applies
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::ConfigurationError(format!("failed to build HTTP client: {e}")))?;

        Ok(SearchClient {
            http,
            api_url,
            entity: config.entity.clone(),
            limit: config.limit,
        })
    }

    // Create a SearchClient from environment variables or raise a configuration error
    pub fn try_default() -> Result<Self> {
        let config = crate::config::ConfigBuilder::new().build()?;
        Self::new(&config)
    }

    /// Builds the request url for `query`.
    ///
    /// The term goes through the form encoder, so spaces become `+` just like
    /// [`normalize`] while reserved characters (`&`, `#`, `/`, `+`) are
    /// percent-encoded instead of breaking the query string.
    pub fn search_url(&self, query: &str) -> Url {
        let mut url = self.api_url.clone();
        url.set_query(None);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("term", &query.to_lowercase());
            pairs.append_pair("entity", &self.entity);
            if let Some(limit) = self.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        url
    }

    /// Runs one search. Each call is independent: nothing is cached and an
    /// earlier call still in flight is left alone.
    pub async fn search(&self, query: &str) -> Result<Vec<Song>> {
        let url = self.search_url(query);
        debug!("GET {url}");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!("Network error while searching for {query:?}: {e}");
                Error::from(e)
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!("Network error while reading results for {query:?}: {e}");
            Error::from(e)
        })?;
        debug!("Received {} bytes with status {status}", body.len());

        let songs = decode(&body).inspect_err(|e| {
            warn!("Decode error for {query:?} (status {status}): {e}");
        })?;
        debug!("Decoded {} songs for {query:?}", songs.len());
        Ok(songs)
    }
}

impl SongSearch for SearchClient {
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<Song>>> + Send {
        SearchClient::search(self, query)
    }
}
