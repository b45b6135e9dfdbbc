//! Text rules shared by posts and comments.

use super::error::DomainError;

pub const MAX_POST_TEXT_LEN: usize = 10_000;
pub const MAX_COMMENT_TEXT_LEN: usize = 2_000;
pub const MAX_IMAGE_REF_LEN: usize = 255;

/// Trim `raw` and reject it when nothing is left or it is too long.
pub fn normalized_text(field: &'static str, raw: &str, max: usize) -> Result<String, DomainError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(DomainError::BlankText { field });
    }
    if text.chars().count() > max {
        return Err(DomainError::TooLong { field, max });
    }
    Ok(text.to_string())
}

/// Image references are opaque; blank means "no image".
pub fn normalized_image(raw: Option<&str>) -> Result<Option<String>, DomainError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.chars().count() > MAX_IMAGE_REF_LEN => Err(DomainError::TooLong {
            field: "image",
            max: MAX_IMAGE_REF_LEN,
        }),
        Some(value) => Ok(Some(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_text_is_blank() {
        assert_eq!(
            normalized_text("text", " \n\t ", MAX_POST_TEXT_LEN),
            Err(DomainError::BlankText { field: "text" })
        );
        assert_eq!(
            normalized_text("text", "  hi  ", MAX_POST_TEXT_LEN).as_deref(),
            Ok("hi")
        );
    }

    #[test]
    fn over_long_text_names_the_limit() {
        let err = normalized_text("text", "abcd", 3).expect_err("too long");
        assert_eq!(err, DomainError::TooLong { field: "text", max: 3 });
        assert_eq!(err.field(), Some("text"));
    }

    #[test]
    fn blank_image_is_absent() {
        assert_eq!(normalized_image(Some("  ")), Ok(None));
        assert_eq!(normalized_image(None), Ok(None));
        assert_eq!(
            normalized_image(Some("posts/cat.png")),
            Ok(Some("posts/cat.png".to_string()))
        );
    }
}
