use axum::{
    extract::{FromRef, State},
    Json,
};
use tracing::{info, instrument, warn};

use crate::auth::{
    dto::{JwtKeys, LoginRequest, TokenResponse},
    extractors::CurrentUser,
    password::verify_password,
};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::PublicUser;
use crate::users::repo::User;

/// Unknown user and wrong password produce the same error so the endpoint
/// cannot be used to enumerate user ids.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = User::find_by_user_id(&state.db, &payload.user_id)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %payload.user_id, "login unknown user_id");
            ApiError::InvalidCredentials
        })?;

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = %user.user_id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user.user_id, user.role)?;

    info!(user_id = %user.user_id, role = ?user.role, "user logged in");
    Ok(Json(TokenResponse {
        token,
        role: user.role,
        user_id: user.user_id,
    }))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo::Role;

    #[test]
    fn token_response_shape() {
        let response = TokenResponse {
            token: "abc".into(),
            role: Role::Teacher,
            user_id: "t1".into(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token"], "abc");
        assert_eq!(json["role"], "teacher");
        assert_eq!(json["user_id"], "t1");
    }
}
