//! Follow relation invariants.
//!
//! Each (follower, followed) pair is a two-state machine starting at
//! [`FollowState::NotFollowing`]. `follow` moves it to `Following` and is a
//! self-loop once there; `unfollow` is the mirror image. A pair whose two ends
//! are the same author never leaves `NotFollowing`.

use serde::Serialize;

use super::entities::AuthorId;
use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowState {
    #[default]
    NotFollowing,
    Following,
}

impl FollowState {
    pub fn from_exists(exists: bool) -> Self {
        if exists {
            Self::Following
        } else {
            Self::NotFollowing
        }
    }

    pub fn is_following(self) -> bool {
        matches!(self, Self::Following)
    }

    pub fn after_follow(self) -> Self {
        Self::Following
    }

    pub fn after_unfollow(self) -> Self {
        Self::NotFollowing
    }
}

/// A validated directed edge: `follower` receives `followed`'s posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowPair {
    follower: AuthorId,
    followed: AuthorId,
}

impl FollowPair {
    pub fn new(follower: AuthorId, followed: AuthorId) -> Result<Self, DomainError> {
        if follower == followed {
            return Err(DomainError::SelfFollow { author: follower });
        }
        Ok(Self { follower, followed })
    }

    pub fn follower(&self) -> AuthorId {
        self.follower
    }

    pub fn followed(&self) -> AuthorId {
        self.followed
    }
}
