//! Input normalization and validation

use crate::error::{EngineError, EngineResult};
use inspection_types::{MediaType, MAX_COMMENT_LEN, MAX_CONTAINER_LEN, TEMPERATURE_RANGE};

/// Trim, upper-case and check a container number
pub fn container_number(raw: &str) -> EngineResult<String> {
    let normalized = raw.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(EngineError::validation("container number is required"));
    }
    if normalized.chars().count() > MAX_CONTAINER_LEN {
        return Err(EngineError::validation(format!(
            "container number exceeds {MAX_CONTAINER_LEN} characters"
        )));
    }
    if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(EngineError::validation(
            "container number must be alphanumeric",
        ));
    }
    Ok(normalized)
}

pub fn temperature(value: Option<f64>) -> EngineResult<Option<f64>> {
    match value {
        Some(t) if !TEMPERATURE_RANGE.contains(&t) => Err(EngineError::validation(format!(
            "temperature must be between {} and {} °C",
            TEMPERATURE_RANGE.start(),
            TEMPERATURE_RANGE.end()
        ))),
        other => Ok(other),
    }
}

/// Decision comment: trimmed, blank becomes `None`, required for rejections
pub fn comment(raw: Option<&str>, required: bool) -> EngineResult<Option<String>> {
    let trimmed = raw.map(str::trim).filter(|c| !c.is_empty());
    match trimmed {
        None if required => Err(EngineError::validation(
            "a comment is required to reject an inspection",
        )),
        None => Ok(None),
        Some(c) if c.chars().count() > MAX_COMMENT_LEN => Err(EngineError::validation(format!(
            "comment exceeds {MAX_COMMENT_LEN} characters"
        ))),
        Some(c) => Ok(Some(c.to_string())),
    }
}

/// Required text field, trimmed, `1..=max` characters
pub fn required_text(field: &str, raw: &str, max: usize) -> EngineResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EngineError::validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max {
        return Err(EngineError::validation(format!(
            "{field} exceeds {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Optional text field; blank becomes `None`
pub fn optional_text(field: &str, raw: Option<&str>, max: usize) -> EngineResult<Option<String>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) if s.chars().count() > max => Err(EngineError::validation(format!(
            "{field} exceeds {max} characters"
        ))),
        Some(s) => Ok(Some(s.to_string())),
    }
}

pub fn email(raw: &str) -> EngineResult<String> {
    let email = required_text("email", raw, 191)?.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(EngineError::validation(format!("invalid email '{raw}'"))),
    }
}

/// Check an uploaded payload and resolve its media type
///
/// The declared content type wins; the file name is only consulted when the
/// client declared nothing.
pub fn payload(
    bytes: &[u8],
    content_type: Option<&str>,
    file_name: Option<&str>,
    max_bytes: usize,
) -> EngineResult<MediaType> {
    if bytes.is_empty() {
        return Err(EngineError::validation("uploaded file is empty"));
    }
    if bytes.len() > max_bytes {
        return Err(EngineError::validation(format!(
            "uploaded file exceeds {max_bytes} bytes"
        )));
    }
    match content_type.map(str::trim).filter(|c| !c.is_empty()) {
        Some(declared) => declared
            .parse::<MediaType>()
            .map_err(|e| EngineError::validation(e.to_string())),
        None => file_name.and_then(MediaType::from_file_name).ok_or_else(|| {
            EngineError::validation("file type not allowed; use JPEG or PNG")
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_container_normalization() {
        assert_eq!(container_number("  abcd1234567 ").unwrap(), "ABCD1234567");
        assert!(container_number("   ").is_err());
        assert!(container_number("ABC-123").is_err());
        assert!(container_number(&"A".repeat(31)).is_err());
        assert!(container_number(&"A".repeat(30)).is_ok());
    }

    #[test]
    fn test_temperature_range() {
        assert!(temperature(Some(-50.0)).is_ok());
        assert!(temperature(Some(50.0)).is_ok());
        assert!(temperature(Some(50.5)).is_err());
        assert!(temperature(Some(f64::NAN)).is_err());
        assert_eq!(temperature(None).unwrap(), None);
    }

    #[test]
    fn test_comment_rules() {
        assert!(comment(None, true).is_err());
        assert!(comment(Some("   "), true).is_err());
        assert_eq!(comment(Some(" missing seal "), true).unwrap().as_deref(), Some("missing seal"));
        assert_eq!(comment(Some("  "), false).unwrap(), None);
        assert!(comment(Some(&"x".repeat(501)), false).is_err());
        assert!(comment(Some(&"x".repeat(500)), false).is_ok());
    }

    #[test]
    fn test_email() {
        assert_eq!(email(" Ana@Example.com ").unwrap(), "ana@example.com");
        assert!(email("no-at-sign").is_err());
        assert!(email("@domain").is_err());
    }

    #[test]
    fn test_payload_rules() {
        assert!(payload(b"", Some("image/png"), None, 10).is_err());
        assert!(payload(&[0u8; 11], Some("image/png"), None, 10).is_err());
        assert!(payload(b"x", Some("image/gif"), None, 10).is_err());
        assert_eq!(payload(b"x", Some("image/jpg"), None, 10).unwrap(), MediaType::Jpeg);
        assert_eq!(payload(b"x", None, Some("a.png"), 10).unwrap(), MediaType::Png);
        assert!(payload(b"x", None, Some("a.bmp"), 10).is_err());
        assert!(payload(b"x", None, None, 10).is_err());
    }

    proptest! {
        #[test]
        fn whitespace_comments_never_satisfy_reject(ws in "[ \t\n\r]{0,20}") {
            prop_assert!(comment(Some(&ws), true).is_err());
        }

        #[test]
        fn valid_containers_are_idempotent(raw in "[a-zA-Z0-9]{1,30}") {
            let once = container_number(&raw).unwrap();
            prop_assert_eq!(container_number(&once).unwrap(), once);
        }
    }
}
