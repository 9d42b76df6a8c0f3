use crate::model::category::{Category, CategoryId, CategoryPatch};
use crate::model::user::Actor;
use crate::repo::category_repo::CategoryRepository;
use crate::repo::RepoError;
use crate::service::{not_found, require_admin, required_text, ServiceError, ServiceResult};
use log::info;

/// Category catalogue; writes are admin-only.
pub struct CategoryService<R: CategoryRepository> {
    repo: R,
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.repo.list()?)
    }

    pub fn get(&self, id: CategoryId) -> ServiceResult<Category> {
        self.repo.get(id)?.ok_or_else(|| not_found("category", id))
    }

    pub fn create(&self, actor: &Actor, name: &str, kind: Option<&str>) -> ServiceResult<Category> {
        require_admin(actor)?;
        let name = required_text(name, "category name")?;
        if self.repo.get_by_name(&name)?.is_some() {
            return Err(ServiceError::Conflict(format!("category `{name}` already exists")));
        }
        let kind = kind.map(str::trim).filter(|kind| !kind.is_empty());
        let id = self.repo.create(&name, kind)?;
        info!("event=category_create module=service status=ok category_id={id}");
        self.get(id)
    }

    pub fn update(
        &self,
        actor: &Actor,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> ServiceResult<Category> {
        require_admin(actor)?;
        if let Some(name) = patch.name.as_deref() {
            let name = required_text(name, "category name")?;
            if let Some(existing) = self.repo.get_by_name(&name)? {
                if existing.id != id {
                    return Err(ServiceError::Conflict(format!(
                        "category `{name}` already exists"
                    )));
                }
            }
        }
        self.repo.update(id, patch)?;
        self.get(id)
    }

    /// Refused with `Conflict` while any document still uses the category.
    pub fn delete(&self, actor: &Actor, id: CategoryId) -> ServiceResult<()> {
        require_admin(actor)?;
        match self.repo.delete(id) {
            Ok(()) => {
                info!("event=category_delete module=service status=ok category_id={id}");
                Ok(())
            }
            Err(RepoError::Constraint(_)) => Err(ServiceError::Conflict(
                "category still has documents".to_string(),
            )),
            Err(err) => Err(err.into()),
        }
    }
}
