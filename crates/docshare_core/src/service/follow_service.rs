//! Follow graph use-cases.
//!
//! # Invariants
//! - An edge names at least one existing target.
//! - A user cannot follow themselves or create the same edge twice.
//! - Only the follower may remove an edge.

use crate::model::follow::{Follow, FollowId, FollowTarget};
use crate::model::user::Actor;
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::follow_repo::{FollowRepository, SqliteFollowRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::service::{not_found, ServiceError, ServiceResult};
use log::info;
use rusqlite::Connection;

pub struct FollowService<'a> {
    conn: &'a Connection,
}

impl<'a> FollowService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn follows(&self) -> SqliteFollowRepository<'a> {
        SqliteFollowRepository::new(self.conn)
    }

    pub fn list_following(&self, actor: &Actor) -> ServiceResult<Vec<Follow>> {
        Ok(self.follows().list_by_user(actor.user_id)?)
    }

    pub fn list_followers(&self, actor: &Actor) -> ServiceResult<Vec<Follow>> {
        Ok(self.follows().list_followers(actor.user_id)?)
    }

    /// `target` of `None` is rejected; callers build it with
    /// `FollowTarget::from_parts`.
    pub fn follow(&self, actor: &Actor, target: Option<FollowTarget>) -> ServiceResult<Follow> {
        let target = target.ok_or_else(|| {
            ServiceError::Validation("must specify a user or category to follow".to_string())
        })?;

        if let Some(user_id) = target.user_id() {
            if user_id == actor.user_id {
                return Err(ServiceError::Validation("cannot follow yourself".to_string()));
            }
            if SqliteUserRepository::new(self.conn).get(user_id)?.is_none() {
                return Err(ServiceError::Validation(format!(
                    "user to follow not found: {user_id}"
                )));
            }
        }
        if let Some(category_id) = target.category_id() {
            if SqliteCategoryRepository::new(self.conn)
                .get(category_id)?
                .is_none()
            {
                return Err(ServiceError::Validation(format!(
                    "category not found: {category_id}"
                )));
            }
        }

        let follows = self.follows();
        if follows
            .find_exact(actor.user_id, target.user_id(), target.category_id())?
            .is_some()
        {
            return Err(ServiceError::Conflict("already following".to_string()));
        }

        let id = follows.create(actor.user_id, target.user_id(), target.category_id())?;
        info!(
            "event=follow_create module=service status=ok follow_id={id} user_id={}",
            actor.user_id
        );
        follows.get(id)?.ok_or_else(|| not_found("follow", id))
    }

    pub fn unfollow(&self, actor: &Actor, id: FollowId) -> ServiceResult<()> {
        let follows = self.follows();
        let follow = follows.get(id)?.ok_or_else(|| not_found("follow", id))?;
        if follow.user_id != actor.user_id {
            return Err(ServiceError::Forbidden(
                "follow belongs to another user".to_string(),
            ));
        }
        follows.delete(id)?;
        info!("event=follow_delete module=service status=ok follow_id={id}");
        Ok(())
    }
}
