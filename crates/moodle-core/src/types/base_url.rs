//! Base URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated base URL of a Moodle site or identity provider.
///
/// This type ensures the URL is absolute, uses HTTPS (or HTTP for localhost),
/// and never ends with a slash so paths can be appended directly.
///
/// # Example
///
/// ```
/// use moodle_core::BaseUrl;
///
/// let base = BaseUrl::new("https://moodle.innopolis.university/").unwrap();
/// assert_eq!(base.join("/webservice/rest/server.php"),
///            "https://moodle.innopolis.university/webservice/rest/server.php");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Create a new base URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let mut url = Url::parse(s).map_err(|e| InvalidInputError::BaseUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        url.set_query(None);
        url.set_fragment(None);
        let trimmed = url.path().trim_end_matches('/').to_string();
        url.set_path(&trimmed);

        Ok(Self(url))
    }

    /// Returns the base without a trailing slash.
    pub fn as_str(&self) -> &str {
        // `Url` keeps a "/" path for http(s) roots
        self.0.as_str().trim_end_matches('/')
    }

    /// Appends an absolute path (starting with `/`) to the base.
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.as_str(), path)
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        if url.cannot_be_a_base() {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        // Must be HTTPS (or HTTP for localhost)
        let scheme = url.scheme();
        let is_localhost = url
            .host_str()
            .is_some_and(|h| h == "localhost" || h == "127.0.0.1" || h == "[::1]");

        if scheme != "https" && !(scheme == "http" && is_localhost) {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must use HTTPS (HTTP allowed only for localhost)".to_string(),
            }
            .into());
        }

        if url.host_str().is_none() {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaseUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for BaseUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BaseUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_url() {
        let base = BaseUrl::new("https://moodle.innopolis.university").unwrap();
        assert_eq!(base.host(), Some("moodle.innopolis.university"));
        assert_eq!(base.as_str(), "https://moodle.innopolis.university");
    }

    #[test]
    fn valid_localhost_http() {
        let base = BaseUrl::new("http://127.0.0.1:2583").unwrap();
        assert_eq!(base.join("/login"), "http://127.0.0.1:2583/login");
    }

    #[test]
    fn normalizes_trailing_slash() {
        let base = BaseUrl::new("https://sso.university.innopolis.ru/").unwrap();
        assert_eq!(
            base.join("/adfs/oauth2/authorize"),
            "https://sso.university.innopolis.ru/adfs/oauth2/authorize"
        );
    }

    #[test]
    fn keeps_sub_path() {
        let base = BaseUrl::new("https://example.edu/moodle/").unwrap();
        assert_eq!(
            base.join("/webservice/rest/server.php"),
            "https://example.edu/moodle/webservice/rest/server.php"
        );
    }

    #[test]
    fn invalid_http_non_localhost() {
        assert!(BaseUrl::new("http://moodle.innopolis.university").is_err());
    }

    #[test]
    fn invalid_relative_url() {
        assert!(BaseUrl::new("/webservice/rest/server.php").is_err());
    }
}
