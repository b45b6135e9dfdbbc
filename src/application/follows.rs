//! Follow graph management.
//!
//! Both operations are idempotent: a repeated follow leaves exactly one edge
//! and an unfollow without an edge changes nothing. Neither case is an error.

use std::sync::Arc;

use tracing::{debug, info};

use crate::application::repos::{FollowsRepo, RepoError};
use crate::domain::entities::AuthorId;
use crate::domain::follow::{FollowPair, FollowState};

const SOURCE: &str = "yatube::application::follows";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    SelfFollowIgnored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Unfollowed,
    NotFollowing,
}

#[derive(Clone)]
pub struct FollowService {
    repo: Arc<dyn FollowsRepo>,
}

impl FollowService {
    pub fn new(repo: Arc<dyn FollowsRepo>) -> Self {
        Self { repo }
    }

    pub async fn follow(
        &self,
        requester: AuthorId,
        target: AuthorId,
    ) -> Result<FollowOutcome, RepoError> {
        let Ok(pair) = FollowPair::new(requester, target) else {
            debug!(target = SOURCE, requester, "self follow ignored");
            return Ok(FollowOutcome::SelfFollowIgnored);
        };

        let created = self
            .repo
            .insert_follow(pair.follower(), pair.followed())
            .await?;

        // an insert that created nothing means the edge was already there
        let before = FollowState::from_exists(!created);
        if before.after_follow() != before {
            info!(
                target = SOURCE,
                follower = pair.follower(),
                followed = pair.followed(),
                "follow edge created"
            );
            Ok(FollowOutcome::Followed)
        } else {
            Ok(FollowOutcome::AlreadyFollowing)
        }
    }

    pub async fn unfollow(
        &self,
        requester: AuthorId,
        target: AuthorId,
    ) -> Result<UnfollowOutcome, RepoError> {
        let removed = self.repo.delete_follow(requester, target).await?;

        let before = FollowState::from_exists(removed);
        if before.after_unfollow() != before {
            info!(
                target = SOURCE,
                follower = requester,
                followed = target,
                "follow edge removed"
            );
            Ok(UnfollowOutcome::Unfollowed)
        } else {
            Ok(UnfollowOutcome::NotFollowing)
        }
    }

    pub async fn state(
        &self,
        requester: AuthorId,
        target: AuthorId,
    ) -> Result<FollowState, RepoError> {
        if requester == target {
            return Ok(FollowState::NotFollowing);
        }
        let exists = self.repo.follow_exists(requester, target).await?;
        Ok(FollowState::from_exists(exists))
    }

    pub async fn is_following(
        &self,
        requester: AuthorId,
        target: AuthorId,
    ) -> Result<bool, RepoError> {
        Ok(self.state(requester, target).await?.is_following())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct SetFollows {
        edges: Mutex<HashSet<(AuthorId, AuthorId)>>,
    }

    #[async_trait]
    impl FollowsRepo for SetFollows {
        async fn insert_follow(&self, a: AuthorId, b: AuthorId) -> Result<bool, RepoError> {
            Ok(self.edges.lock().unwrap().insert((a, b)))
        }

        async fn delete_follow(&self, a: AuthorId, b: AuthorId) -> Result<bool, RepoError> {
            Ok(self.edges.lock().unwrap().remove(&(a, b)))
        }

        async fn follow_exists(&self, a: AuthorId, b: AuthorId) -> Result<bool, RepoError> {
            Ok(self.edges.lock().unwrap().contains(&(a, b)))
        }

        async fn count_following(&self, a: AuthorId) -> Result<u64, RepoError> {
            let edges = self.edges.lock().unwrap();
            Ok(edges.iter().filter(|(from, _)| *from == a).count() as u64)
        }
    }

    fn service() -> (FollowService, Arc<SetFollows>) {
        let repo = Arc::new(SetFollows::default());
        (FollowService::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn double_follow_keeps_one_edge() {
        let (service, repo) = service();

        assert_eq!(service.follow(1, 2).await.unwrap(), FollowOutcome::Followed);
        assert_eq!(
            service.follow(1, 2).await.unwrap(),
            FollowOutcome::AlreadyFollowing
        );
        assert_eq!(repo.count_following(1).await.unwrap(), 1);
        assert!(service.is_following(1, 2).await.unwrap());
        assert!(!service.is_following(2, 1).await.unwrap());
    }

    #[tokio::test]
    async fn self_follow_writes_nothing() {
        let (service, repo) = service();

        assert_eq!(
            service.follow(5, 5).await.unwrap(),
            FollowOutcome::SelfFollowIgnored
        );
        assert_eq!(repo.count_following(5).await.unwrap(), 0);
        assert!(!service.is_following(5, 5).await.unwrap());
    }

    #[tokio::test]
    async fn unfollow_without_edge_is_a_no_op() {
        let (service, _) = service();

        assert_eq!(
            service.unfollow(1, 2).await.unwrap(),
            UnfollowOutcome::NotFollowing
        );

        service.follow(1, 2).await.unwrap();
        assert_eq!(
            service.unfollow(1, 2).await.unwrap(),
            UnfollowOutcome::Unfollowed
        );
        assert_eq!(service.state(1, 2).await.unwrap(), FollowState::NotFollowing);
    }
}
