//! Named patterns that pull single attribute values out of HTML pages.
//!
//! Each step of the sign-in depends on one or more of these. When the
//! provider changes its markup only the affected pattern stops matching, and
//! the failure names it.

use std::sync::LazyLock;

use regex::Regex;

use moodle_core::error::{InvalidInputError, PatternNotFound};
use moodle_core::{BaseUrl, Result};

/// A compiled, named extraction pattern.
#[derive(Debug, Clone)]
pub struct ExtractionPattern {
    name: &'static str,
    regex: Regex,
    group: usize,
}

impl ExtractionPattern {
    /// Compile a pattern whose value is capture group `group`.
    pub fn new(name: &'static str, pattern: &str, group: usize) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| InvalidInputError::Other {
            message: format!("pattern `{name}` does not compile: {e}"),
        })?;
        Ok(Self { name, regex, group })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the captured value of the first match, HTML-unescaped.
    pub fn extract(&self, html: &str) -> std::result::Result<String, PatternNotFound> {
        self.regex
            .captures(html)
            .and_then(|caps| caps.get(self.group))
            .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
            .ok_or(PatternNotFound { pattern: self.name })
    }
}

/// Apply `pattern` to a whole document.
pub fn extract(
    pattern: &ExtractionPattern,
    html: &str,
) -> std::result::Result<String, PatternNotFound> {
    pattern.extract(html)
}

fn fixed(name: &'static str, pattern: &str) -> ExtractionPattern {
    match ExtractionPattern::new(name, pattern, 1) {
        Ok(pattern) => pattern,
        Err(err) => unreachable!("built-in pattern is invalid: {err}"),
    }
}

/// `action` of the identity provider's login form.
pub static PROVIDER_LOGIN_FORM: LazyLock<ExtractionPattern> =
    LazyLock::new(|| fixed("provider_login_form", r#"action="(/adfs/oauth2/authorize[^"]+)""#));

/// `action` of the auto-submitting token form.
pub static TOKEN_FORM_ACTION: LazyLock<ExtractionPattern> =
    LazyLock::new(|| fixed("token_form_action", r#"action="([^"]+)""#));

/// Hidden `code` input of the token form.
pub static TOKEN_FORM_CODE: LazyLock<ExtractionPattern> =
    LazyLock::new(|| fixed("token_form_code", r#"name="code"\s+value="([^"]+)""#));

/// Hidden `state` input of the token form.
pub static TOKEN_FORM_STATE: LazyLock<ExtractionPattern> =
    LazyLock::new(|| fixed("token_form_state", r#"name="state"\s+value="([^"]+)""#));

/// The link on the launch page that leads to the federated login.
///
/// Anchored to the platform origin, so it is built per configuration.
pub fn entry_login_link(platform: &BaseUrl) -> Result<ExtractionPattern> {
    let pattern = format!(
        r#"href="({}/auth/oauth2/login\.php\?[^"]+)""#,
        regex::escape(platform.as_str())
    );
    ExtractionPattern::new("entry_login_link", &pattern, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN_PAGE: &str = r#"<html><head><title>Working...</title></head>
<body><form method="POST" name="hiddenform" action="https://moodle.innopolis.university/admin/oauth2callback.php">
<input type="hidden" name="code" value="AAABAAAAiL9Kn2Z27Uu&amp;xyz" />
<input type="hidden" name="state" value="sesskey=abc&amp;id=1" />
<noscript><p>Script is disabled. Click Submit to continue.</p><input type="submit" value="Submit" /></noscript>
</form></body></html>"#;

    #[test]
    fn extracts_token_form_fields() {
        assert_eq!(
            TOKEN_FORM_ACTION.extract(TOKEN_PAGE).unwrap(),
            "https://moodle.innopolis.university/admin/oauth2callback.php"
        );
        assert_eq!(
            TOKEN_FORM_CODE.extract(TOKEN_PAGE).unwrap(),
            "AAABAAAAiL9Kn2Z27Uu&xyz"
        );
        assert_eq!(
            TOKEN_FORM_STATE.extract(TOKEN_PAGE).unwrap(),
            "sesskey=abc&id=1"
        );
    }

    #[test]
    fn missing_field_names_pattern() {
        let err = TOKEN_FORM_CODE.extract("<form action=\"/x\"></form>").unwrap_err();
        assert_eq!(err.pattern, "token_form_code");
    }

    #[test]
    fn provider_form_action_is_unescaped() {
        let html = r#"<form id="loginForm" autocomplete="off" novalidate="novalidate" method="post" action="/adfs/oauth2/authorize?client_id=abc&amp;redirect_uri=https%3a%2f%2fmoodle&amp;client-request-id=42">"#;
        assert_eq!(
            extract(&PROVIDER_LOGIN_FORM, html).unwrap(),
            "/adfs/oauth2/authorize?client_id=abc&redirect_uri=https%3a%2f%2fmoodle&client-request-id=42"
        );
    }

    #[test]
    fn first_match_wins() {
        let html = r#"<form action="/first"></form><form action="/second"></form>"#;
        assert_eq!(TOKEN_FORM_ACTION.extract(html).unwrap(), "/first");
    }

    #[test]
    fn entry_link_is_anchored_to_platform() {
        let platform = BaseUrl::new("https://moodle.innopolis.university").unwrap();
        let pattern = entry_login_link(&platform).unwrap();
        let html = r#"<a class="btn" href="https://evil.example/auth/oauth2/login.php?id=1">x</a>
<a class="btn" href="https://moodle.innopolis.university/auth/oauth2/login.php?id=1&amp;wantsurl=%2F&amp;sesskey=s1">Innopolis SSO</a>"#;
        assert_eq!(
            pattern.extract(html).unwrap(),
            "https://moodle.innopolis.university/auth/oauth2/login.php?id=1&wantsurl=%2F&sesskey=s1"
        );
        assert_eq!(pattern.name(), "entry_login_link");
    }

    #[test]
    fn no_partial_matching() {
        let html = r#"<form action="/adfs/ls/?wa=wsignin1.0">"#;
        assert!(PROVIDER_LOGIN_FORM.extract(html).is_err());
    }
}
