//! User accounts, point levels, and caller identity.
//!
//! # Invariants
//! - `points` is never negative.
//! - `level` always equals `Level::for_points(points)` after a points update.
//! - Credentials live in the external identity provider; the core only keeps
//!   its stable `external_uid`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type UserId = i64;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

/// Accumulated-points tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Newbie,
    Scholar,
    Master,
}

impl Level {
    pub const SCHOLAR_POINTS: i64 = 500;
    pub const MASTER_POINTS: i64 = 1000;

    /// Maps a points balance to its level.
    pub fn for_points(points: i64) -> Self {
        if points >= Self::MASTER_POINTS {
            Self::Master
        } else if points >= Self::SCHOLAR_POINTS {
            Self::Scholar
        } else {
            Self::Newbie
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newbie => "Newbie",
            Self::Scholar => "Scholar",
            Self::Master => "Master",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Newbie" => Some(Self::Newbie),
            "Scholar" => Some(Self::Scholar),
            "Master" => Some(Self::Master),
            _ => None,
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Subject id issued by the external identity provider.
    pub external_uid: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub school: Option<String>,
    pub points: i64,
    pub level: Level,
    pub is_admin: bool,
    pub is_locked: bool,
    pub comment_count: i64,
    pub created_at: i64,
}

/// Input for account registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub external_uid: String,
    pub email: String,
    pub full_name: String,
}

/// Partial profile update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfilePatch {
    pub full_name: Option<String>,
    pub school: Option<String>,
    pub avatar_url: Option<String>,
}

/// Authenticated caller resolved from the identity provider's uid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Actor {
    /// Whether this caller may act on a resource owned by `owner`.
    pub fn can_act_for(&self, owner: UserId) -> bool {
        self.is_admin || self.user_id == owner
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginSession {
    pub user_id: UserId,
    pub external_uid: String,
    pub email: String,
    pub full_name: String,
    pub is_admin: bool,
}

/// Leaderboard row ordered by points, then upload count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedUser {
    pub user_id: UserId,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub points: i64,
    pub level: Level,
    pub documents_uploaded: i64,
}

/// Metric used by per-metric rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMetric {
    Points,
    Uploads,
    Comments,
    /// Total downloads across every document the user uploaded.
    Downloads,
}

impl RankingMetric {
    pub fn value_description(self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Uploads => "documents uploaded",
            Self::Comments => "comments",
            Self::Downloads => "downloads",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "points" => Some(Self::Points),
            "uploads" => Some(Self::Uploads),
            "comments" => Some(Self::Comments),
            "downloads" => Some(Self::Downloads),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingItem {
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub value: i64,
    pub value_description: &'static str,
}

/// Loose shape check; deliverability is the identity provider's job.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

#[cfg(test)]
mod tests {
    use super::{is_valid_email, Actor, Level, RankingMetric};

    #[test]
    fn level_thresholds_are_inclusive() {
        assert_eq!(Level::for_points(0), Level::Newbie);
        assert_eq!(Level::for_points(499), Level::Newbie);
        assert_eq!(Level::for_points(500), Level::Scholar);
        assert_eq!(Level::for_points(999), Level::Scholar);
        assert_eq!(Level::for_points(1000), Level::Master);
    }

    #[test]
    fn level_text_roundtrips_through_parse() {
        for level in [Level::Newbie, Level::Scholar, Level::Master] {
            assert_eq!(Level::parse(level.as_str()), Some(level));
        }
        assert_eq!(Level::parse("newbie"), None);
    }

    #[test]
    fn email_check_rejects_obvious_garbage() {
        assert!(is_valid_email("reader@example.com"));
        assert!(!is_valid_email("reader@example"));
        assert!(!is_valid_email("no at sign.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn admin_actor_can_act_for_anyone() {
        let admin = Actor {
            user_id: 1,
            is_admin: true,
        };
        let member = Actor {
            user_id: 2,
            is_admin: false,
        };
        assert!(admin.can_act_for(2));
        assert!(member.can_act_for(2));
        assert!(!member.can_act_for(3));
    }

    #[test]
    fn ranking_metric_parse_is_case_insensitive() {
        assert_eq!(RankingMetric::parse(" Uploads "), Some(RankingMetric::Uploads));
        assert_eq!(RankingMetric::parse("karma"), None);
    }
}
