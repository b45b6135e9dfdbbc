use thiserror::Error;

use super::entities::AuthorId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("author {author} cannot follow themselves")]
    SelfFollow { author: AuthorId },
    #[error("`{field}` must not be blank")]
    BlankText { field: &'static str },
    #[error("`{field}` must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

impl DomainError {
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::SelfFollow { .. } => None,
            Self::BlankText { field } | Self::TooLong { field, .. } => Some(field),
        }
    }
}
