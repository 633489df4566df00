//! crates/muse_core/src/validate.rs
//!
//! Pure validation rules applied at the handler boundary before any business
//! logic runs. Each rule is deterministic, has no side effects, and returns
//! either `Ok(())` or a rejection carrying a user-facing message.

/// A validation rejection. `Invalid` maps to HTTP 400, `PayloadTooLarge`
/// to HTTP 413.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    PayloadTooLarge(String),
}

/// Maximum accepted decoded image size: 20 MiB.
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

const ACCEPTED_IMAGE_PREFIXES: [&str; 2] =
    ["data:image/jpeg;base64,", "data:image/png;base64,"];

/// Checks a 1-2 item selection (genres, emotions, skills). Rejects empty
/// lists, more than two entries, and duplicate entries - asking for the same
/// thing twice is one selection, not two.
pub fn validate_selection(field: &str, items: &[String]) -> Result<(), ValidationError> {
    if items.is_empty() || items.len() > 2 {
        return Err(ValidationError::Invalid(format!(
            "Select 1-2 {field} to continue"
        )));
    }
    if items.len() == 2 && items[0] == items[1] {
        return Err(ValidationError::Invalid(format!(
            "Select 1-2 {field} to continue"
        )));
    }
    Ok(())
}

/// Rejects text that is empty or all-whitespace after trimming.
pub fn validate_required_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Invalid(format!("{field} is required")));
    }
    Ok(())
}

/// Counts words by splitting on runs of whitespace and discarding empty
/// tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Rejects a submission shorter than the exercise's target word count.
/// The message names both the required minimum and the actual count.
pub fn validate_word_minimum(text: &str, required: u32) -> Result<(), ValidationError> {
    let actual = word_count(text.trim());
    if (actual as u32) < required {
        return Err(ValidationError::Invalid(format!(
            "Minimum {required} words required to submit for feedback. You have {actual} words."
        )));
    }
    Ok(())
}

/// Rejects image payloads that are not JPEG/PNG data-URIs.
pub fn validate_image_format(data_uri: &str) -> Result<(), ValidationError> {
    if !ACCEPTED_IMAGE_PREFIXES
        .iter()
        .any(|p| data_uri.starts_with(p))
    {
        return Err(ValidationError::Invalid(
            "Image must be a JPEG or PNG uploaded as a base64 data URI".to_string(),
        ));
    }
    Ok(())
}

/// Rejects images whose approximate decoded size exceeds 20 MiB. The size is
/// estimated from the base64 payload length (`floor(chars * 0.75)`) without
/// decoding.
pub fn validate_image_size(data_uri: &str) -> Result<(), ValidationError> {
    let payload_len = data_uri
        .find(',')
        .map(|i| data_uri.len() - i - 1)
        .unwrap_or(data_uri.len());
    let approx_bytes = payload_len * 3 / 4;
    if approx_bytes > MAX_IMAGE_BYTES {
        return Err(ValidationError::PayloadTooLarge(
            "Image too large. Maximum size is 20 MB.".to_string(),
        ));
    }
    Ok(())
}

/// Rejects prompt ratings outside 1-5.
pub fn validate_rating(rating: i32) -> Result<(), ValidationError> {
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::Invalid(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genres(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn selection_accepts_one_or_two() {
        assert!(validate_selection("genres", &genres(&["Fantasy"])).is_ok());
        assert!(validate_selection("genres", &genres(&["Fantasy", "Horror"])).is_ok());
    }

    #[test]
    fn selection_rejects_empty_and_oversized() {
        assert!(validate_selection("genres", &[]).is_err());
        assert!(
            validate_selection("genres", &genres(&["Fantasy", "Horror", "Mystery"])).is_err()
        );
    }

    #[test]
    fn selection_rejects_duplicates() {
        let err = validate_selection("genres", &genres(&["Fantasy", "Fantasy"])).unwrap_err();
        assert!(matches!(err, ValidationError::Invalid(_)));
    }

    #[test]
    fn selection_message_names_the_bound() {
        let err = validate_selection("genres", &[]).unwrap_err();
        assert!(err.to_string().contains("1-2 genres"));
    }

    #[test]
    fn required_text_rejects_whitespace_only() {
        assert!(validate_required_text("userWriting", "   \n\n   ").is_err());
        assert!(validate_required_text("userWriting", "Once upon a time").is_ok());
    }

    #[test]
    fn word_count_splits_on_whitespace_runs() {
        assert_eq!(word_count("one  two\tthree\n four"), 4);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn word_minimum_message_names_both_counts() {
        let err = validate_word_minimum("just five words right here", 500).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Minimum 500 words required"));
        assert!(msg.contains("You have 5 words"));
    }

    #[test]
    fn word_minimum_accepts_exact_count() {
        assert!(validate_word_minimum("a b c d e", 5).is_ok());
    }

    #[test]
    fn image_format_accepts_jpeg_and_png_only() {
        assert!(validate_image_format("data:image/jpeg;base64,/9j/4AAQ").is_ok());
        assert!(validate_image_format("data:image/png;base64,iVBORw0KGg").is_ok());
        assert!(validate_image_format("data:image/svg+xml;base64,PHN2Zz4").is_err());
        assert!(validate_image_format("not-a-data-uri").is_err());
    }

    #[test]
    fn image_size_rejects_over_20_mib() {
        // ~28 MiB decoded: 28 MiB * 4/3 base64 chars.
        let payload = "A".repeat(28 * 1024 * 1024 * 4 / 3);
        let uri = format!("data:image/png;base64,{payload}");
        let err = validate_image_size(&uri).unwrap_err();
        assert!(matches!(err, ValidationError::PayloadTooLarge(_)));
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn image_size_accepts_under_20_mib() {
        let payload = "A".repeat(1024);
        let uri = format!("data:image/jpeg;base64,{payload}");
        assert!(validate_image_size(&uri).is_ok());
    }

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }
}
