use crate::{
    error::{AppError, AppResult},
    models::{user, User, UserModel},
    utils::{encode_access_token, hash_password, verify_password},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new account. Returns (user, access_token).
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AppResult<(UserModel, String)> {
        if self.user_exists(username, email).await? {
            return Err(AppError::Validation(
                "Username or email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            username: sea_orm::ActiveValue::Set(username.to_string()),
            email: sea_orm::ActiveValue::Set(email.to_string()),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            bio: sea_orm::ActiveValue::Set(None),
            role: sea_orm::ActiveValue::Set("user".to_string()),
            alerts_created: sea_orm::ActiveValue::Set(0),
            alerts_upvoted: sea_orm::ActiveValue::Set(0),
            is_suspended: sea_orm::ActiveValue::Set(false),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let user = new_user.insert(&self.db).await?;
        let token = encode_access_token(&user.id.to_string())?;
        Ok((user, token))
    }

    /// Login. Suspended accounts cannot obtain tokens.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(UserModel, String)> {
        let user = self
            .find_by_username(username)
            .await
            .map_err(|_| AppError::Unauthorized)?;

        let is_valid = verify_password(password, &user.password_hash)?;
        if !is_valid {
            return Err(AppError::Unauthorized);
        }
        if user.is_suspended {
            return Err(AppError::Forbidden);
        }

        let token = encode_access_token(&user.id.to_string())?;
        Ok((user, token))
    }

    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn user_exists(&self, username: &str, email: &str) -> AppResult<bool> {
        let count = User::find()
            .filter(
                sea_orm::Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(email)),
            )
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<UserModel> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }
}
