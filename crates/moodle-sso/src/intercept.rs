//! Redirect traversal that stops at the token sentinel.
//!
//! The last hop of the sign-in redirects to a custom-scheme URI such as
//! `moodlemobile://token=<value>`. Nothing can dereference it, so the chain
//! is walked by hand and every `Location` is checked before it is followed.

use regex::Regex;
use reqwest::header::LOCATION;
use reqwest::{Method, StatusCode};
use tracing::{debug, instrument, trace};
use url::Url;

use moodle_core::Result;
use moodle_core::error::{InvalidInputError, TransportError};

use crate::transport::{Form, Session};

/// Matches redirect targets that carry the token.
#[derive(Debug, Clone)]
pub struct SentinelPattern {
    regex: Regex,
}

impl SentinelPattern {
    /// Sentinel for `<scheme>://token=<value>`.
    pub fn new(scheme: &str) -> Result<Self> {
        let pattern = format!(r"{}://token=(\S+)\s*$", regex::escape(scheme));
        let regex = Regex::new(&pattern).map_err(|e| InvalidInputError::Other {
            message: format!("invalid url scheme '{scheme}': {e}"),
        })?;
        Ok(Self { regex })
    }

    /// Returns the embedded value if `target` is a sentinel.
    pub fn capture(&self, target: &str) -> Option<String> {
        self.regex
            .captures(target)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// How an intercepted request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Traversal {
    /// A redirect pointed at the sentinel; its value, unresolved.
    Captured { value: String, hops: usize },
    /// The chain finished without a sentinel.
    Completed { final_url: Url, status: StatusCode },
}

/// Send one request and walk its redirect chain, stopping at the sentinel.
///
/// Redirects follow the usual browser rules: 303, and 301/302 after a
/// POST, continue as a body-less GET; 307/308 replay method and body.
#[instrument(skip(session, sentinel, body), fields(%url))]
pub async fn follow_intercepting(
    session: &Session,
    sentinel: &SentinelPattern,
    method: Method,
    url: Url,
    body: Option<&Form>,
    max_redirects: usize,
) -> std::result::Result<Traversal, TransportError> {
    let mut method = method;
    let mut url = url;
    let mut body = body.map(Form::encode);

    for hop in 0..=max_redirects {
        let response = session
            .send_unfollowed(method.clone(), &url, body.as_deref())
            .await?;
        let status = response.status();
        trace!(hop, %status, %url, "Intercepted response");

        if !status.is_redirection() {
            return Ok(Traversal::Completed {
                final_url: url,
                status,
            });
        }

        let Some(location) = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
        else {
            return Ok(Traversal::Completed {
                final_url: url,
                status,
            });
        };

        if let Some(value) = sentinel.capture(location) {
            debug!(hops = hop + 1, "Token sentinel captured");
            return Ok(Traversal::Captured {
                value,
                hops: hop + 1,
            });
        }

        let next = url
            .join(location.trim())
            .map_err(|e| TransportError::Redirect {
                message: format!("invalid redirect target '{location}': {e}"),
            })?;

        match status.as_u16() {
            307 | 308 => {}
            303 => {
                method = Method::GET;
                body = None;
            }
            _ if method == Method::POST => {
                method = Method::GET;
                body = None;
            }
            _ => {}
        }

        debug!(from = %url, to = %next, %status, "Following redirect");
        url = next;
    }

    Err(TransportError::Redirect {
        message: format!("more than {max_redirects} redirects"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_token_value() {
        let sentinel = SentinelPattern::new("moodlemobile").unwrap();
        assert_eq!(
            sentinel.capture("moodlemobile://token=bTo6OlRPSw=="),
            Some("bTo6OlRPSw==".to_string())
        );
    }

    #[test]
    fn tolerates_trailing_whitespace() {
        let sentinel = SentinelPattern::new("moodlemobile").unwrap();
        assert_eq!(
            sentinel.capture("moodlemobile://token=abc123 \r\n"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn ignores_http_targets() {
        let sentinel = SentinelPattern::new("moodlemobile").unwrap();
        assert!(
            sentinel
                .capture("https://moodle.innopolis.university/login/index.php")
                .is_none()
        );
        assert!(sentinel.capture("othermobile://token=abc").is_none());
    }

    #[test]
    fn scheme_is_literal() {
        let sentinel = SentinelPattern::new("my.app").unwrap();
        assert!(sentinel.capture("myxapp://token=abc").is_none());
        assert_eq!(
            sentinel.capture("my.app://token=abc"),
            Some("abc".to_string())
        );
    }
}
