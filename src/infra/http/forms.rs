//! JSON request bodies for post and comment mutations.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::application::error::ErrorReport;
use crate::application::posts::{CommentPayload, CreatePostPayload};
use crate::domain::content::{
    MAX_COMMENT_TEXT_LEN, MAX_POST_TEXT_LEN, normalized_image, normalized_text,
};
use crate::domain::entities::GroupId;
use crate::domain::error::DomainError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PostForm {
    pub(super) text: Option<String>,
    pub(super) group: Option<GroupId>,
    pub(super) image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CommentForm {
    pub(super) text: Option<String>,
}

/// Field-keyed validation messages, answered with 422.
#[derive(Debug, Default, Serialize)]
pub struct FormErrors {
    errors: BTreeMap<&'static str, Vec<String>>,
}

impl FormErrors {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    fn push_domain(&mut self, err: DomainError) {
        let field = err.field().unwrap_or("form");
        self.push(field, err.to_string());
    }
}

impl IntoResponse for FormErrors {
    fn into_response(self) -> Response {
        let detail = self
            .errors
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join("; ")))
            .collect::<Vec<_>>()
            .join(", ");

        let mut response = (StatusCode::UNPROCESSABLE_ENTITY, Json(self)).into_response();
        ErrorReport::from_message(
            "infra::http::forms",
            StatusCode::UNPROCESSABLE_ENTITY,
            detail,
        )
        .attach(&mut response);
        response
    }
}

impl PostForm {
    /// Checks text and image; group existence is left to the post service.
    pub(crate) fn validate(self) -> Result<CreatePostPayload, FormErrors> {
        let mut errors = FormErrors::default();

        let text = normalized_text(
            "text",
            self.text.as_deref().unwrap_or_default(),
            MAX_POST_TEXT_LEN,
        )
        .map_err(|err| errors.push_domain(err))
        .ok();
        let image = normalized_image(self.image.as_deref())
            .map_err(|err| errors.push_domain(err))
            .ok()
            .flatten();

        match text {
            Some(text) if errors.is_empty() => Ok(CreatePostPayload {
                text,
                group_id: self.group,
                image,
            }),
            _ => Err(errors),
        }
    }
}

impl CommentForm {
    pub(crate) fn validate(self) -> Result<CommentPayload, FormErrors> {
        let mut errors = FormErrors::default();
        match normalized_text(
            "text",
            self.text.as_deref().unwrap_or_default(),
            MAX_COMMENT_TEXT_LEN,
        ) {
            Ok(text) => Ok(CommentPayload { text }),
            Err(err) => {
                errors.push_domain(err);
                Err(errors)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_form_trims_text_and_drops_blank_image() {
        let payload = PostForm {
            text: Some("  hello  ".into()),
            group: Some(4),
            image: Some("   ".into()),
        }
        .validate()
        .expect("valid");

        assert_eq!(
            payload,
            CreatePostPayload {
                text: "hello".into(),
                group_id: Some(4),
                image: None,
            }
        );
    }

    #[test]
    fn post_form_reports_every_bad_field() {
        let errors = PostForm {
            text: None,
            group: None,
            image: Some("x".repeat(300)),
        }
        .validate()
        .expect_err("invalid");

        assert_eq!(errors.messages("text").len(), 1);
        assert_eq!(errors.messages("image").len(), 1);
        assert!(errors.messages("group").is_empty());
    }

    #[test]
    fn blank_comment_is_rejected() {
        let errors = CommentForm {
            text: Some("\n ".into()),
        }
        .validate()
        .expect_err("blank");
        assert_eq!(errors.messages("text").len(), 1);
    }

    #[test]
    fn errors_render_as_field_map() {
        let body = serde_json::to_value(FormErrors::field("group", "unknown group")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "errors": { "group": ["unknown group"] } })
        );
    }
}
