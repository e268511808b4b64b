//! Upstream response classification
//!
//! GPS51 does not reliably signal failures through status codes or headers:
//! an expired session may come back as `200 OK` with an HTML login page or an
//! empty body. Classification therefore sniffs the body as well as the
//! declared content type.

use axum::http::StatusCode;

use super::UpstreamResult;

/// Decide whether an upstream body is JSON or raw text
///
/// JSON is attempted when the content type mentions `application/json` or
/// the trimmed body starts with `{` or `[`. A failed parse, or no JSON signal
/// at all, yields [`UpstreamResult::RawText`] holding the untouched body.
/// The upstream status is carried through in both cases.
pub fn classify(content_type: Option<&str>, body: String, status: StatusCode) -> UpstreamResult {
    let declared_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false);
    let trimmed = body.trim();
    let looks_like_json = trimmed.starts_with('{') || trimmed.starts_with('[');

    if !declared_json && !looks_like_json {
        return UpstreamResult::RawText { text: body, status };
    }

    match serde_json::from_str(trimmed) {
        Ok(value) => UpstreamResult::Json { value, status },
        Err(e) => {
            tracing::debug!(
                error = %e,
                status = status.as_u16(),
                declared_json,
                "Upstream body looked like JSON but failed to parse"
            );
            UpstreamResult::RawText { text: body, status }
        }
    }
}

/// First `max_chars` characters of `text`
///
/// Counts Unicode scalar values, so the result is always a valid prefix of
/// the input and never splits a multi-byte sequence.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_declared_json_is_parsed() {
        let result = classify(
            Some("application/json;charset=UTF-8"),
            r#"{"status":0,"records":[]}"#.to_string(),
            StatusCode::OK,
        );
        assert_eq!(
            result,
            UpstreamResult::Json {
                value: json!({"status": 0, "records": []}),
                status: StatusCode::OK,
            }
        );
    }

    #[test]
    fn test_content_type_match_is_case_insensitive() {
        let result = classify(Some("Application/JSON"), "42".to_string(), StatusCode::OK);
        assert!(matches!(result, UpstreamResult::Json { .. }));
    }

    #[test]
    fn test_sniffs_json_object_without_content_type() {
        let result = classify(None, "  {\"a\":1}\n".to_string(), StatusCode::OK);
        assert_eq!(
            result,
            UpstreamResult::Json {
                value: json!({"a": 1}),
                status: StatusCode::OK,
            }
        );
    }

    #[test]
    fn test_sniffs_json_array_behind_text_plain() {
        let result = classify(Some("text/plain"), "[1,2,3]".to_string(), StatusCode::OK);
        assert!(matches!(result, UpstreamResult::Json { .. }));
    }

    #[test]
    fn test_html_login_page_is_raw_text() {
        let body = "<html>Login</html>".to_string();
        let result = classify(Some("text/html"), body.clone(), StatusCode::OK);
        assert_eq!(
            result,
            UpstreamResult::RawText {
                text: body,
                status: StatusCode::OK,
            }
        );
    }

    #[test]
    fn test_malformed_json_falls_back_to_raw_text() {
        let body = "{\"status\":0,".to_string();
        let result = classify(Some("application/json"), body.clone(), StatusCode::OK);
        assert_eq!(
            result,
            UpstreamResult::RawText {
                text: body,
                status: StatusCode::OK,
            }
        );
    }

    #[test]
    fn test_empty_body_with_json_content_type_is_raw_text() {
        let result = classify(Some("application/json"), String::new(), StatusCode::OK);
        assert!(matches!(result, UpstreamResult::RawText { ref text, .. } if text.is_empty()));
    }

    #[test]
    fn test_raw_text_keeps_untrimmed_body() {
        let body = "  not json  ".to_string();
        let result = classify(None, body.clone(), StatusCode::OK);
        assert_eq!(
            result,
            UpstreamResult::RawText {
                text: body,
                status: StatusCode::OK,
            }
        );
    }

    #[test]
    fn test_status_is_carried_through() {
        let result = classify(
            Some("application/json"),
            r#"{"error":"bad"}"#.to_string(),
            StatusCode::BAD_GATEWAY,
        );
        assert!(matches!(
            result,
            UpstreamResult::Json { status, .. } if status == StatusCode::BAD_GATEWAY
        ));

        let result = classify(None, "oops".to_string(), StatusCode::NOT_FOUND);
        assert!(matches!(
            result,
            UpstreamResult::RawText { status, .. } if status == StatusCode::NOT_FOUND
        ));
    }

    #[test]
    fn test_preview_shorter_than_limit_is_whole_text() {
        assert_eq!(preview("<html>Login</html>", 200), "<html>Login</html>");
    }

    #[test]
    fn test_preview_truncates_to_limit() {
        let text = "x".repeat(500);
        assert_eq!(preview(&text, 200).len(), 200);
    }

    #[test]
    fn test_preview_counts_characters_not_bytes() {
        let text = "定位服务暂不可用";
        assert_eq!(preview(text, 4), "定位服务");
    }

    #[test]
    fn test_preview_of_empty_text() {
        assert_eq!(preview("", 10), "");
    }
}
