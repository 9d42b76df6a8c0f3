use crate::model::document::Document;
use crate::model::recommendation::RECOMMENDATION_LIMIT;
use crate::model::user::Actor;
use crate::repo::recommendation_repo::RecommendationRepository;
use crate::service::ServiceResult;

/// Content-based suggestions from the caller's interaction history.
pub struct RecommendationService<R: RecommendationRepository> {
    repo: R,
}

impl<R: RecommendationRepository> RecommendationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Up to ten approved, unlocked documents from categories the caller has
    /// interacted with, excluding documents already seen.
    pub fn recommended(&self, actor: &Actor) -> ServiceResult<Vec<Document>> {
        Ok(self
            .repo
            .recommended_for(actor.user_id, RECOMMENDATION_LIMIT)?)
    }
}
