use crate::{
    error::{AppError, AppResult},
    models::{user, User, UserModel},
    services::permission,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get_by_username(&self, username: &str) -> AppResult<UserModel> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn list(&self, page: u64, per_page: u64) -> AppResult<(Vec<UserModel>, u64)> {
        let paginator = User::find()
            .order_by_desc(user::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((users, total))
    }

    /// Non-suspended users ranked by upvotes received on their alerts.
    pub async fn top_reporters(&self, limit: u64) -> AppResult<Vec<UserModel>> {
        Ok(User::find()
            .filter(user::Column::IsSuspended.eq(false))
            .order_by_desc(user::Column::AlertsUpvoted)
            .order_by_asc(user::Column::Username)
            .limit(limit)
            .all(&self.db)
            .await?)
    }

    /// Suspend or unsuspend a user, gated by the moderation policy.
    /// Setting the flag to its current value is a no-op success.
    pub async fn set_suspended(
        &self,
        actor: &UserModel,
        target_id: i32,
        suspended: bool,
    ) -> AppResult<UserModel> {
        let target = self.get_by_id(target_id).await?;
        if !permission::can_moderate_user(actor, &target) {
            return Err(AppError::Forbidden);
        }
        if target.is_suspended == suspended {
            return Ok(target);
        }

        let mut active: user::ActiveModel = target.into();
        active.is_suspended = sea_orm::ActiveValue::Set(suspended);
        active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    /// Admin-only role assignment, constrained to the three known roles.
    pub async fn update_role(
        &self,
        actor: &UserModel,
        target_id: i32,
        role: &str,
    ) -> AppResult<UserModel> {
        if !permission::can_assign_roles(actor) {
            return Err(AppError::Forbidden);
        }
        if !permission::Role::is_valid(role) {
            return Err(AppError::Validation(format!(
                "Invalid role. Must be one of: user, ambassador, admin, got '{role}'"
            )));
        }

        let target = self.get_by_id(target_id).await?;
        let mut active: user::ActiveModel = target.into();
        active.role = sea_orm::ActiveValue::Set(role.to_string());
        active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }
}
