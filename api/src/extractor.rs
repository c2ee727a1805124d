use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use kernel::model::{id::UserId, role::Role};
use shared::error::AppError;

// 認証・セッション発行は外部コラボレーターの責務。ここでは上流の
// ゲートウェイが検証済みで付与するヘッダから利用者の同一性と
// admin / user の区分を受け取るだけにする。
pub struct AuthorizedUser {
    pub user_id: UserId,
    pub role: Role,
}

impl AuthorizedUser {
    pub fn id(&self) -> UserId {
        self.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthorizedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::UnauthenticatedError)?
            .parse::<UserId>()
            .map_err(|_| AppError::UnauthenticatedError)?;
        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("user")
            .parse::<Role>()
            .map_err(|_| AppError::UnauthenticatedError)?;
        Ok(Self { user_id, role })
    }
}
