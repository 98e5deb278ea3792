//! Elasticsearch client module
//!
//! Provides `ElasticsearchClient`, the [`SearchBackend`] used against a live cluster.

use super::{Auth, SearchBackend, SearchResponse, SearchResponseBody};
use eyre::{Context, Result, eyre};
use reqwest::{Client, Method};
use serde_json::Value;
use url::Url;

/// Elasticsearch client for search and connectivity checks.
///
/// # Example
/// ```no_run
/// use chunked_extractor::client::{Auth, ElasticsearchClient, SearchBackend};
/// use serde_json::json;
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let url = Url::parse("http://localhost:9200")?;
/// let client = ElasticsearchClient::try_new(url, Auth::None)?;
///
/// let indices = vec!["logs-*".to_string()];
/// let response = client.search(&indices, &json!({"size": 0})).await?;
/// println!("{} hits", response.total_hits());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ElasticsearchClient {
    client: Client,
    url: Url,
}

impl ElasticsearchClient {
    /// Create a new client from a base URL and authentication method.
    ///
    /// # Errors
    /// Returns an error if the credentials do not form a valid header or
    /// the HTTP client cannot be built.
    pub fn try_new(url: Url, auth: Auth) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::CONTENT_TYPE, "application/json".parse()?);
        if let Some(value) = auth.header_value()? {
            headers.insert(Auth::header_name(), value);
        }
        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self { client, url })
    }

    /// Build a client from `ELASTICSEARCH_URL` and the credential variables
    /// understood by [`Auth::from_env`].
    pub fn from_env() -> Result<Self> {
        let url_str = std::env::var("ELASTICSEARCH_URL")
            .context("ELASTICSEARCH_URL environment variable not set")?;
        let url = Url::parse(&url_str)
            .with_context(|| format!("Invalid ELASTICSEARCH_URL: {}", url_str))?;
        let auth = Auth::from_env();
        log::debug!("Using {} authentication", auth);
        Self::try_new(url, auth).context("Failed to create Elasticsearch client")
    }

    /// Get the base URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Verify the connection and authentication to Elasticsearch.
    ///
    /// Makes a GET request to `/` and returns the cluster info document.
    pub async fn test_connection(&self) -> Result<Value> {
        let url = self.endpoint(&[])?;
        let response = self.request(Method::GET, url, None).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            eyre::bail!("Connection test failed ({}): {}", status, body);
        }
        response
            .json()
            .await
            .with_context(|| "Failed to parse cluster info")
    }

    /// Append path segments to the base URL, keeping any path prefix it has
    ///
    /// Each segment is percent-encoded, so a `/` inside an index name cannot
    /// change which endpoint is hit.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| eyre!("Cannot use {} as a base URL", self.url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL of the `_search` endpoint for a set of indices
    fn search_url(&self, indices: &[String]) -> Result<Url> {
        if indices.is_empty() {
            self.endpoint(&["_search"])
        } else {
            let joined = indices.join(",");
            self.endpoint(&[joined.as_str(), "_search"])
        }
    }

    async fn request(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        log::trace!("{} {}", method, url);
        let request = self.client.request(method, url);
        let request = match body {
            Some(body) => request.body(serde_json::to_vec(body)?),
            None => request,
        };
        request
            .send()
            .await
            .map_err(|e| eyre!("Failed to send request: {}", e))
    }
}

impl SearchBackend for ElasticsearchClient {
    async fn search(&self, indices: &[String], body: &Value) -> Result<SearchResponse> {
        let url = self.search_url(indices)?;
        let response = self.request(Method::POST, url, Some(body)).await?;
        let status = response.status();

        let text = response
            .text()
            .await
            .with_context(|| "Failed to read search response")?;

        if !status.is_success() {
            // Error bodies don't follow the search response shape
            let error = serde_json::from_str(&text).unwrap_or(Value::String(text));
            let body = SearchResponseBody {
                error: Some(error),
                ..Default::default()
            };
            return Ok(SearchResponse::new(status, body));
        }

        let body = serde_json::from_str(&text).with_context(|| "Failed to parse search response")?;
        Ok(SearchResponse::new(status, body))
    }
}

impl std::fmt::Display for ElasticsearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn client(base: &str) -> ElasticsearchClient {
        ElasticsearchClient::try_new(Url::parse(base).unwrap(), Auth::None).unwrap()
    }

    #[test]
    fn test_search_url() {
        let client = client("http://localhost:9200");
        assert_eq!(
            client.search_url(&[]).unwrap().as_str(),
            "http://localhost:9200/_search"
        );
        assert_eq!(
            client
                .search_url(&["index-1".to_string(), "index-2".to_string()])
                .unwrap()
                .as_str(),
            "http://localhost:9200/index-1,index-2/_search"
        );
        assert_eq!(
            client.endpoint(&[]).unwrap().as_str(),
            "http://localhost:9200/"
        );
    }

    #[test]
    fn test_search_url_keeps_base_path_and_encodes_indices() {
        let indices = vec!["logs-1".to_string(), "a/b".to_string()];
        for base in ["https://host/es", "https://host/es/"] {
            assert_eq!(
                client(base).search_url(&indices).unwrap().as_str(),
                "https://host/es/logs-1,a%2Fb/_search"
            );
        }
        assert_eq!(
            client("https://host/es/").endpoint(&[]).unwrap().as_str(),
            "https://host/es"
        );
    }

    #[test]
    fn test_client_creation() {
        let url = Url::parse("http://localhost:9200").unwrap();
        let client = ElasticsearchClient::try_new(
            url,
            Auth::Basic("elastic".to_string(), "changeme".to_string()),
        )
        .unwrap();
        assert_eq!(client.url().as_str(), "http://localhost:9200/");
        assert_eq!(client.to_string(), "http://localhost:9200/");
    }

    #[test]
    #[serial]
    fn test_from_env() {
        unsafe {
            std::env::remove_var("ELASTICSEARCH_URL");
        }
        let result = ElasticsearchClient::from_env();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("ELASTICSEARCH_URL")
        );

        unsafe {
            std::env::set_var("ELASTICSEARCH_URL", "http://es.local:9200");
        }
        let client = ElasticsearchClient::from_env().unwrap();
        assert_eq!(client.url().host_str(), Some("es.local"));
        unsafe {
            std::env::remove_var("ELASTICSEARCH_URL");
        }
    }
}
