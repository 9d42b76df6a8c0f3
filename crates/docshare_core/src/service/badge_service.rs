//! Badge catalogue and threshold awards.
//!
//! # Invariants
//! - A badge is awarded to a user at most once.
//! - Threshold badges are created on first award when missing.

use crate::model::badge::{Badge, BadgeRule, EarnedBadge};
use crate::model::user::{Actor, UserId};
use crate::repo::badge_repo::{BadgeRepository, SqliteBadgeRepository};
use crate::service::{not_found, require_admin, required_text, ServiceError, ServiceResult};
use log::info;
use rusqlite::Connection;

pub struct BadgeService<R: BadgeRepository> {
    repo: R,
}

impl<R: BadgeRepository> BadgeService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list(&self) -> ServiceResult<Vec<Badge>> {
        Ok(self.repo.list()?)
    }

    pub fn create(&self, actor: &Actor, name: &str, description: &str) -> ServiceResult<Badge> {
        require_admin(actor)?;
        let name = required_text(name, "badge name")?;
        if self.repo.get_by_name(&name)?.is_some() {
            return Err(ServiceError::Conflict(format!("badge `{name}` already exists")));
        }
        let id = self.repo.create(&name, description.trim())?;
        self.repo
            .get_by_name(&name)?
            .ok_or_else(|| not_found("badge", id))
    }

    pub fn list_for_user(&self, user_id: UserId) -> ServiceResult<Vec<EarnedBadge>> {
        Ok(self.repo.list_by_user(user_id)?)
    }
}

/// Awards `rule` to `user_id` when `count` meets its threshold.
///
/// Runs on the caller's connection so it joins an open transaction.
/// Returns `true` only when the badge was newly granted.
pub fn award_on_threshold(
    conn: &Connection,
    user_id: UserId,
    rule: &BadgeRule,
    count: i64,
) -> ServiceResult<bool> {
    if !rule.is_met(count) {
        return Ok(false);
    }

    let repo = SqliteBadgeRepository::new(conn);
    let badge_id = match repo.get_by_name(rule.name)? {
        Some(badge) => badge.id,
        None => repo.create(rule.name, rule.description)?,
    };
    let awarded = repo.award(user_id, badge_id)?;
    if awarded {
        info!(
            "event=badge_award module=service status=ok user_id={user_id} badge_id={badge_id} count={count}"
        );
    }
    Ok(awarded)
}
