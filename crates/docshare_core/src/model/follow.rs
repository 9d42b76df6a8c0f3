use crate::model::category::CategoryId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

pub type FollowId = i64;

/// Follow edge. At least one of `followed_user_id` and `category_id` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub id: FollowId,
    pub user_id: UserId,
    pub followed_user_id: Option<UserId>,
    pub category_id: Option<CategoryId>,
    pub followed_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowTarget {
    User(UserId),
    Category(CategoryId),
    /// One edge carrying both targets; either one triggers notifications.
    UserInCategory(UserId, CategoryId),
}

impl FollowTarget {
    /// Builds a target from optional halves; `None` when neither is present.
    pub fn from_parts(user: Option<UserId>, category: Option<CategoryId>) -> Option<Self> {
        match (user, category) {
            (Some(user), Some(category)) => Some(Self::UserInCategory(user, category)),
            (Some(user), None) => Some(Self::User(user)),
            (None, Some(category)) => Some(Self::Category(category)),
            (None, None) => None,
        }
    }

    pub fn user_id(self) -> Option<UserId> {
        match self {
            Self::User(user) | Self::UserInCategory(user, _) => Some(user),
            Self::Category(_) => None,
        }
    }

    pub fn category_id(self) -> Option<CategoryId> {
        match self {
            Self::Category(category) | Self::UserInCategory(_, category) => Some(category),
            Self::User(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FollowTarget;

    #[test]
    fn from_parts_requires_a_target() {
        assert_eq!(FollowTarget::from_parts(None, None), None);
        assert_eq!(FollowTarget::from_parts(Some(2), None), Some(FollowTarget::User(2)));
        let both = FollowTarget::from_parts(Some(2), Some(7)).unwrap();
        assert_eq!(both.user_id(), Some(2));
        assert_eq!(both.category_id(), Some(7));
    }
}
