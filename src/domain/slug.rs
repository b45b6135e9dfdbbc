//! Slug derivation for community groups.
//!
//! Titles are transliterated by the `slug` crate (Cyrillic included), so
//! "Кошки и собаки" becomes `koshki-i-sobaki`. Callers supply the uniqueness
//! check so the derivation itself stays free of storage concerns.

use std::future::Future;

use slug::slugify;
use thiserror::Error;

const MAX_SUFFIX_ATTEMPTS: usize = 32;
const MAX_SLUG_LEN: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("`{input}` has no characters usable in a slug")]
    Unrepresentable { input: String },
    #[error("no free slug left for `{base}`")]
    Exhausted { base: String },
}

#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Derive a slug from a human-readable title, capped at the column width.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let mut candidate = slugify(input);
    if candidate.len() > MAX_SLUG_LEN {
        candidate.truncate(MAX_SLUG_LEN);
        while candidate.ends_with('-') {
            candidate.pop();
        }
    }

    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Derive a slug and append `-2`, `-3`, ... until `is_free` accepts one.
pub async fn unique_slug<F, Fut, E>(input: &str, mut is_free: F) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = derive_slug(input)?;

    if is_free(base.clone()).await.map_err(SlugAsyncError::Predicate)? {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if is_free(candidate.clone())
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted { base }))
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn cyrillic_titles_are_transliterated() {
        let slug = derive_slug("Кошки и собаки").expect("slug");
        assert_eq!(slug, "koshki-i-sobaki");
    }

    #[test]
    fn punctuation_only_title_is_unrepresentable() {
        assert_eq!(
            derive_slug("!!!"),
            Err(SlugError::Unrepresentable {
                input: "!!!".to_string()
            })
        );
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
    }

    #[test]
    fn long_titles_are_capped() {
        let title = "word ".repeat(60);
        let slug = derive_slug(&title).expect("slug");
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[tokio::test]
    async fn taken_slugs_get_a_counter() {
        let taken = Arc::new(Mutex::new(vec!["rust-club".to_string()]));

        let slug = unique_slug("Rust Club", |candidate| {
            let taken = taken.clone();
            async move {
                let taken = taken.lock().expect("lock");
                Ok::<bool, Infallible>(!taken.contains(&candidate))
            }
        })
        .await
        .expect("unique slug");

        assert_eq!(slug, "rust-club-2");
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let err = unique_slug("Example", |_| async { Ok::<bool, Infallible>(false) })
            .await
            .expect_err("exhausted");
        assert!(matches!(
            err,
            SlugAsyncError::Slug(SlugError::Exhausted { base }) if base == "example"
        ));
    }
}
