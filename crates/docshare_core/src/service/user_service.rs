//! Account use-case service.
//!
//! # Responsibility
//! - Registration, login gating, and profile maintenance.
//! - Admin moderation (points, locks, deletion) and leaderboards.
//!
//! # Invariants
//! - Emails are unique case-insensitively.
//! - Locked accounts cannot log in.
//! - An admin cannot delete their own account.

use crate::model::user::{
    is_valid_email, Actor, Level, LoginSession, NewUser, RankedUser, RankingItem, RankingMetric,
    User, UserId, UserProfilePatch,
};
use crate::repo::user_repo::UserRepository;
use crate::service::{
    not_found, require_admin, require_owner_or_admin, required_text, ServiceError, ServiceResult,
};
use log::info;

pub const DEFAULT_RANKING_LIMIT: u32 = 10;

/// Registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
    /// Subject id issued by the identity provider after sign-up.
    pub external_uid: String,
}

pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a profile for an identity already provisioned upstream.
    pub fn register(&self, request: &RegisterRequest) -> ServiceResult<User> {
        let email = request.email.trim();
        if !is_valid_email(email) {
            return Err(ServiceError::Validation("email is not valid".to_string()));
        }
        let full_name = required_text(&request.full_name, "full name")?;
        let external_uid = required_text(&request.external_uid, "external uid")?;

        if self.repo.get_by_email(email)?.is_some() {
            return Err(ServiceError::Conflict("email already registered".to_string()));
        }

        let id = self.repo.create(&NewUser {
            external_uid,
            email: email.to_string(),
            full_name,
        })?;
        info!("event=user_register module=service status=ok user_id={id}");
        self.repo.get(id)?.ok_or_else(|| not_found("user", id))
    }

    pub fn login(&self, email: &str) -> ServiceResult<LoginSession> {
        let user = self
            .repo
            .get_by_email(email)?
            .ok_or_else(|| ServiceError::Unauthorized("unknown account".to_string()))?;
        if user.is_locked {
            info!(
                "event=user_login module=service status=error user_id={} reason=locked",
                user.id
            );
            return Err(ServiceError::Unauthorized("account locked".to_string()));
        }
        info!("event=user_login module=service status=ok user_id={}", user.id);
        Ok(LoginSession {
            user_id: user.id,
            external_uid: user.external_uid,
            email: user.email,
            full_name: user.full_name,
            is_admin: user.is_admin,
        })
    }

    /// Maps an identity-provider subject to the internal caller identity.
    pub fn resolve_actor(&self, external_uid: &str) -> ServiceResult<Actor> {
        let user = self
            .repo
            .get_by_external_uid(external_uid.trim())?
            .ok_or_else(|| ServiceError::Unauthorized("unknown identity".to_string()))?;
        if user.is_locked {
            return Err(ServiceError::Unauthorized("account locked".to_string()));
        }
        Ok(Actor {
            user_id: user.id,
            is_admin: user.is_admin,
        })
    }

    /// Promotes the first admin of a fresh installation.
    ///
    /// Fails with `Conflict` once any admin exists.
    pub fn bootstrap_admin(&self, user_id: UserId) -> ServiceResult<()> {
        if self.repo.count_admins()? > 0 {
            return Err(ServiceError::Conflict("an admin already exists".to_string()));
        }
        self.repo.set_admin(user_id, true)?;
        info!("event=admin_bootstrap module=service status=ok user_id={user_id}");
        Ok(())
    }

    pub fn get(&self, actor: &Actor, id: UserId) -> ServiceResult<User> {
        require_owner_or_admin(actor, id)?;
        self.repo.get(id)?.ok_or_else(|| not_found("user", id))
    }

    pub fn me(&self, actor: &Actor) -> ServiceResult<User> {
        self.get(actor, actor.user_id)
    }

    pub fn list_all(&self, actor: &Actor) -> ServiceResult<Vec<User>> {
        require_admin(actor)?;
        Ok(self.repo.list()?)
    }

    pub fn update_profile(
        &self,
        actor: &Actor,
        id: UserId,
        patch: &UserProfilePatch,
    ) -> ServiceResult<User> {
        require_owner_or_admin(actor, id)?;
        if let Some(full_name) = patch.full_name.as_deref() {
            required_text(full_name, "full name")?;
        }
        self.repo.update_profile(id, patch)?;
        self.repo.get(id)?.ok_or_else(|| not_found("user", id))
    }

    pub fn delete(&self, actor: &Actor, id: UserId) -> ServiceResult<()> {
        require_admin(actor)?;
        if actor.user_id == id {
            return Err(ServiceError::Validation(
                "admins cannot delete their own account".to_string(),
            ));
        }
        self.repo.delete(id)?;
        info!("event=user_delete module=service status=ok user_id={id}");
        Ok(())
    }

    /// Adjusts a balance by `delta` (clamped at zero) and returns the result.
    pub fn add_points(&self, actor: &Actor, id: UserId, delta: i64) -> ServiceResult<(i64, Level)> {
        require_admin(actor)?;
        let (points, level) = self.repo.update_points(id, delta)?;
        info!("event=points_update module=service status=ok user_id={id} delta={delta} points={points}");
        Ok((points, level))
    }

    pub fn set_locked(&self, actor: &Actor, id: UserId, locked: bool) -> ServiceResult<()> {
        require_admin(actor)?;
        if actor.user_id == id && locked {
            return Err(ServiceError::Validation(
                "admins cannot lock their own account".to_string(),
            ));
        }
        self.repo.set_locked(id, locked)?;
        info!("event=user_lock module=service status=ok user_id={id} locked={locked}");
        Ok(())
    }

    pub fn ranking(&self, limit: u32) -> ServiceResult<Vec<RankedUser>> {
        Ok(self.repo.top_by_points(clamp_limit(limit))?)
    }

    pub fn ranking_by(&self, metric: RankingMetric, limit: u32) -> ServiceResult<Vec<RankingItem>> {
        Ok(self.repo.ranking(metric, clamp_limit(limit))?)
    }

    pub fn top_commenter(&self) -> ServiceResult<Option<RankingItem>> {
        Ok(self.repo.ranking(RankingMetric::Comments, 1)?.into_iter().next())
    }

    pub fn top_points_user(&self) -> ServiceResult<Option<RankingItem>> {
        Ok(self.repo.ranking(RankingMetric::Points, 1)?.into_iter().next())
    }
}

fn clamp_limit(limit: u32) -> u32 {
    if limit == 0 {
        DEFAULT_RANKING_LIMIT
    } else {
        limit.min(100)
    }
}
