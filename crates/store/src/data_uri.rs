//! Data URI prefix handling.
//!
//! Upload payloads may carry an inline content-type marker of the form
//! `data:<mime>;base64,<payload>`. This module isolates the MIME type and
//! the raw base64 body from such payloads. Payloads without the marker pass
//! through unchanged.

use crate::StoreError;

const MARKER: &str = "data:";
const SEPARATOR: &str = ";base64,";

/// Splits an optional data URI prefix off a base64 payload.
///
/// Returns the MIME type named by the prefix (if any) and the base64 body.
/// A payload without the `data:` marker is returned unchanged with no MIME
/// type.
///
/// The `;base64,` separator is matched literally: a payload that starts with
/// `data:` but lacks the exact separator is rejected rather than decoded
/// from the wrong offset.
///
/// # Errors
///
/// Returns `StoreError::InvalidEncoding` if the `data:` marker is present
/// but the `;base64,` separator is missing or malformed.
pub fn split_data_uri(payload: &str) -> Result<(Option<&str>, &str), StoreError> {
    let Some(rest) = payload.strip_prefix(MARKER) else {
        return Ok((None, payload));
    };

    let Some(separator_start) = rest.find(';') else {
        return Err(StoreError::InvalidEncoding(format!(
            "data URI is missing the '{SEPARATOR}' separator"
        )));
    };

    let mime = &rest[..separator_start];
    let Some(body) = rest[separator_start..].strip_prefix(SEPARATOR) else {
        return Err(StoreError::InvalidEncoding(format!(
            "data URI separator must be exactly '{SEPARATOR}'"
        )));
    };

    Ok(((!mime.is_empty()).then_some(mime), body))
}

/// Derives a file extension from a sniffed MIME type.
///
/// The extension is the subtype (the portion after `/`), so `image/png`
/// yields `png`. Payloads without a MIME type get the literal `bin`
/// extension.
pub(crate) fn extension_for(mime: Option<&str>) -> &str {
    match mime.map(|m| m.rsplit('/').next().unwrap_or(m)) {
        Some(subtype) if !subtype.is_empty() => subtype,
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_payload_passes_through() {
        let (mime, body) = split_data_uri("aGVsbG8=").unwrap();
        assert_eq!(mime, None);
        assert_eq!(body, "aGVsbG8=");
    }

    #[test]
    fn test_prefix_is_isolated_exactly() {
        let (mime, body) = split_data_uri("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(mime, Some("image/png"));
        assert_eq!(body, "iVBORw0KGgo=");
    }

    #[test]
    fn test_non_image_mime_type() {
        let (mime, body) = split_data_uri("data:application/pdf;base64,JVBERi0=").unwrap();
        assert_eq!(mime, Some("application/pdf"));
        assert_eq!(body, "JVBERi0=");
    }

    #[test]
    fn test_missing_separator_is_an_error() {
        let result = split_data_uri("data:image/png,iVBORw0KGgo=");
        assert!(matches!(result, Err(StoreError::InvalidEncoding(_))));
    }

    #[test]
    fn test_malformed_separator_is_an_error() {
        // ';base-64,' is not the literal separator; skipping 8 characters
        // here would silently corrupt the decoded bytes.
        let result = split_data_uri("data:image/png;base-64,iVBORw0KGgo=");
        assert!(matches!(result, Err(StoreError::InvalidEncoding(_))));
    }

    #[test]
    fn test_empty_mime_type_reports_none() {
        let (mime, body) = split_data_uri("data:;base64,aGVsbG8=").unwrap();
        assert_eq!(mime, None);
        assert_eq!(body, "aGVsbG8=");
    }

    #[test]
    fn test_empty_body_is_allowed() {
        let (mime, body) = split_data_uri("data:text/plain;base64,").unwrap();
        assert_eq!(mime, Some("text/plain"));
        assert_eq!(body, "");
    }

    #[test]
    fn test_extension_from_subtype() {
        assert_eq!(extension_for(Some("image/png")), "png");
        assert_eq!(extension_for(Some("application/pdf")), "pdf");
    }

    #[test]
    fn test_extension_defaults_to_bin() {
        assert_eq!(extension_for(None), "bin");
        assert_eq!(extension_for(Some("image/")), "bin");
    }

    #[test]
    fn test_extension_without_slash_uses_whole_type() {
        assert_eq!(extension_for(Some("text")), "text");
    }
}
