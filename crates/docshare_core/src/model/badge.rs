//! Achievement badges and their award thresholds.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

pub type BadgeId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: BadgeId,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBadge {
    pub user_id: UserId,
    pub badge_id: BadgeId,
    pub earned_at: i64,
}

/// Badge earned with the timestamp it was awarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EarnedBadge {
    #[serde(flatten)]
    pub badge: Badge,
    pub earned_at: i64,
}

/// A badge granted once some per-user count reaches `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeRule {
    pub name: &'static str,
    pub description: &'static str,
    pub threshold: i64,
}

impl BadgeRule {
    pub fn is_met(&self, count: i64) -> bool {
        count >= self.threshold
    }
}

pub const UPLOADER_BADGE: BadgeRule = BadgeRule {
    name: "Uploader",
    description: "Uploaded 5 documents",
    threshold: 5,
};

pub const COMMENTER_BADGE: BadgeRule = BadgeRule {
    name: "Commenter",
    description: "Posted 10 comments",
    threshold: 10,
};

#[cfg(test)]
mod tests {
    use super::{COMMENTER_BADGE, UPLOADER_BADGE};

    #[test]
    fn thresholds_are_inclusive() {
        assert!(!UPLOADER_BADGE.is_met(4));
        assert!(UPLOADER_BADGE.is_met(5));
        assert!(UPLOADER_BADGE.is_met(6));
        assert!(!COMMENTER_BADGE.is_met(9));
        assert!(COMMENTER_BADGE.is_met(10));
    }
}
