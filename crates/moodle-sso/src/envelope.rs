//! Web-service envelope: batched request encoding and response decoding.

use serde::Deserialize;

use moodle_core::error::RpcError;
use moodle_core::{RpcCall, RpcCallResult, Token};

use crate::transport::Form;

// ============================================================================
// Endpoint
// ============================================================================

/// REST entry point of the web services.
pub const REST_PATH: &str = "/webservice/rest/server.php";

/// Wrapper function that fans a batch out to the named functions.
pub const CALL_EXTERNAL_FUNCTIONS: &str = "tool_mobile_call_external_functions";

/// Language requested for strings inside payloads.
pub const LANGUAGE: &str = "en_us";

// ============================================================================
// Function Names
// ============================================================================

/// core_course_get_recent_courses
pub const GET_RECENT_COURSES: &str = "core_course_get_recent_courses";

/// core_course_get_contents
pub const GET_COURSE_CONTENTS: &str = "core_course_get_contents";

// ============================================================================
// Encoding
// ============================================================================

/// Query string selecting JSON output and the fan-out wrapper.
pub fn query() -> [(&'static str, &'static str); 2] {
    [
        ("moodlewsrestformat", "json"),
        ("wsfunction", CALL_EXTERNAL_FUNCTIONS),
    ]
}

/// Form body for a batch; call `i` is keyed `requests[i][...]`.
pub fn encode_batch(calls: &[RpcCall], token: &Token) -> Form {
    let mut form = Form::new();
    for (i, call) in calls.iter().enumerate() {
        form.push(format!("requests[{i}][function]"), call.function());
        if !call.arguments().is_empty() {
            form.push(format!("requests[{i}][arguments]"), call.arguments());
        }
        form.push(format!("requests[{i}][settingfilter]"), "1");
        form.push(format!("requests[{i}][settingfileurl]"), "1");
    }
    form.push("moodlewssettinglang", LANGUAGE);
    form.push("wsfunction", CALL_EXTERNAL_FUNCTIONS);
    form.push("wstoken", token.as_str());
    form
}

// ============================================================================
// Decoding
// ============================================================================

/// Successful envelope.
#[derive(Debug, Deserialize)]
struct EnvelopeResponse {
    responses: Vec<CallResponse>,
}

#[derive(Debug, Deserialize)]
struct CallResponse {
    #[serde(default)]
    data: Option<String>,
    error: bool,
}

/// Exception raised for the whole request (bad token, disabled service...).
#[derive(Debug, Deserialize)]
struct ExceptionResponse {
    #[allow(dead_code)]
    exception: String,
    errorcode: String,
    #[serde(default)]
    message: String,
}

/// Decode a response body into results aligned with `expected` calls.
pub fn decode_batch(
    status: u16,
    body: &str,
    expected: usize,
) -> Result<Vec<RpcCallResult>, RpcError> {
    let envelope = match serde_json::from_str::<EnvelopeResponse>(body) {
        Ok(envelope) => envelope,
        Err(err) => {
            return Err(match serde_json::from_str::<ExceptionResponse>(body) {
                Ok(exception) => RpcError::Exception {
                    errorcode: exception.errorcode,
                    message: exception.message,
                },
                Err(_) => RpcError::MalformedResponse {
                    status,
                    message: err.to_string(),
                },
            });
        }
    };

    if envelope.responses.len() != expected {
        return Err(RpcError::LengthMismatch {
            expected,
            actual: envelope.responses.len(),
        });
    }

    Ok(envelope
        .responses
        .into_iter()
        .map(|response| match response {
            CallResponse { error: true, .. } => RpcCallResult::Failed,
            CallResponse { data, .. } => RpcCallResult::Success(data.unwrap_or_default()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_calls_by_index() {
        let calls = [
            RpcCall::without_arguments(GET_RECENT_COURSES),
            RpcCall::new(GET_COURSE_CONTENTS, r#"{"courseid":"7"}"#),
        ];
        let form = encode_batch(&calls, &Token::new("tok"));

        assert_eq!(
            form.get("requests[0][function]"),
            Some(GET_RECENT_COURSES)
        );
        assert_eq!(form.get("requests[0][arguments]"), None);
        assert_eq!(form.get("requests[1][function]"), Some(GET_COURSE_CONTENTS));
        assert_eq!(
            form.get("requests[1][arguments]"),
            Some(r#"{"courseid":"7"}"#)
        );
        assert_eq!(form.get("requests[1][settingfilter]"), Some("1"));
        assert_eq!(form.get("requests[1][settingfileurl]"), Some("1"));
        assert_eq!(form.get("moodlewssettinglang"), Some("en_us"));
        assert_eq!(form.get("wsfunction"), Some(CALL_EXTERNAL_FUNCTIONS));
        assert_eq!(form.get("wstoken"), Some("tok"));
    }

    #[test]
    fn decodes_mixed_results_in_order() {
        let body = r#"{"responses":[{"data":"{\"a\":1}","error":false},{"data":"","error":true}]}"#;
        let results = decode_batch(200, body, 2).unwrap();
        assert_eq!(
            results,
            vec![
                RpcCallResult::Success(r#"{"a":1}"#.to_string()),
                RpcCallResult::Failed,
            ]
        );
    }

    #[test]
    fn exception_body_is_batch_error() {
        let body = r#"{"exception":"moodle_exception","errorcode":"invalidtoken","message":"Invalid token - token not found"}"#;
        let err = decode_batch(200, body, 1).unwrap_err();
        assert!(err.is_auth_error());
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let body = r#"{"responses":[{"data":"[]","error":false}]}"#;
        let err = decode_batch(200, body, 2).unwrap_err();
        assert!(matches!(
            err,
            RpcError::LengthMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn html_body_is_malformed() {
        let err = decode_batch(503, "<html>Service Unavailable</html>", 1).unwrap_err();
        assert!(matches!(err, RpcError::MalformedResponse { status: 503, .. }));
    }
}
