use base64::Engine;
use eyre::Result;
use reqwest::header::{AUTHORIZATION, HeaderValue};

#[derive(Clone, Debug, PartialEq)]
pub enum Auth {
    /// Use an API key authentication via headers
    Apikey(String),
    /// Use username and password authentication via Basic Auth headers
    Basic(String, String),
    /// Don't use any authentication
    None,
}

impl Auth {
    /// Resolve credentials from `ELASTICSEARCH_*` environment variables
    ///
    /// An API key wins over username/password when both are present.
    pub fn from_env() -> Self {
        if let Ok(apikey) = std::env::var("ELASTICSEARCH_APIKEY") {
            Self::Apikey(apikey)
        } else if let (Ok(username), Ok(password)) = (
            std::env::var("ELASTICSEARCH_USERNAME"),
            std::env::var("ELASTICSEARCH_PASSWORD"),
        ) {
            Self::Basic(username, password)
        } else {
            Self::None
        }
    }

    /// Authorization header value, if any
    pub fn header_value(&self) -> Result<Option<HeaderValue>> {
        let value = match self {
            Self::Basic(username, password) => {
                let credentials = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                Some(format!("Basic {}", credentials).parse()?)
            }
            Self::Apikey(apikey) => Some(format!("ApiKey {}", apikey).parse()?),
            Self::None => None,
        };
        Ok(value)
    }

    /// Header name the value from [`Auth::header_value`] belongs under
    pub fn header_name() -> reqwest::header::HeaderName {
        AUTHORIZATION
    }
}

impl std::fmt::Display for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apikey(_) => write!(f, "Apikey"),
            Self::Basic(_, _) => write!(f, "Basic"),
            Self::None => write!(f, "None"),
        }
    }
}
