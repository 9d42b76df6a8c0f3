use crate::model::document::DocumentId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Upper bound on documents returned by one recommendation call.
pub const RECOMMENDATION_LIMIT: u32 = 10;

/// One recorded user-document interaction feeding recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: i64,
    pub user_id: UserId,
    pub document_id: DocumentId,
    pub interacted_at: i64,
}
