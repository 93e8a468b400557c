use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::auth::{extractors::CurrentUser, gate, password::hash_password};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::{
    Ack, AdminUpdateUserRequest, CreateUserRequest, FaceDataRequest, PublicUser, RegisterRequest,
    UpdateStudentRequest, UserAck,
};
use crate::users::repo::{Role, User};

pub(crate) fn is_valid_user_id(user_id: &str) -> bool {
    lazy_static! {
        static ref USER_ID_RE: Regex = Regex::new(r"^[A-Za-z0-9._-]{3,64}$").unwrap();
    }
    USER_ID_RE.is_match(user_id)
}

fn check_new_account(user_id: &str, password: &str) -> Result<(), ApiError> {
    if !is_valid_user_id(user_id) {
        warn!(user_id = %user_id, "invalid user_id");
        return Err(ApiError::BadRequest("invalid user_id".into()));
    }
    if password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::BadRequest("password too short".into()));
    }
    Ok(())
}

/// Open registration; the created account is always a student. Staff roles
/// are created through the admin surface only.
#[instrument(skip(state, payload))]
pub async fn register_student(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserAck>), ApiError> {
    check_new_account(&payload.user_id, &payload.password)?;

    // pre-check is a fast path; the unique index is what actually guards
    if User::find_by_user_id(&state.db, &payload.user_id)
        .await?
        .is_some()
    {
        warn!(user_id = %payload.user_id, "user_id already registered");
        return Err(ApiError::DuplicateKey);
    }

    let hash = hash_password(&payload.password)?;
    let user = User::insert(&state.db, &payload.user_id, &payload.name, Role::Student, &hash).await?;

    info!(user_id = %user.user_id, "student registered");
    Ok((
        StatusCode::CREATED,
        Json(UserAck {
            ok: true,
            user_id: user.user_id,
        }),
    ))
}

#[instrument(skip(state, actor))]
pub async fn list_students(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    gate::authorize(&actor, gate::LIST_STUDENTS)?;
    let students = User::list_by_role(&state.db, Role::Student).await?;
    Ok(Json(students.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, actor))]
pub async fn get_student(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_user_id(&state.db, &user_id)
        .await?
        .filter(|u| u.role == Role::Student)
        .ok_or(ApiError::NotFound("student"))?;
    gate::ensure_self_or_staff(&actor, &user.user_id)?;
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state, actor, payload))]
pub async fn update_student(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateStudentRequest>,
) -> Result<Json<Ack>, ApiError> {
    gate::authorize(&actor, gate::MANAGE_STUDENTS)?;
    let hash = match payload.password.as_deref() {
        Some(p) => Some(hash_password(p)?),
        None => None,
    };
    let matched =
        User::update_student(&state.db, &user_id, payload.name.as_deref(), hash.as_deref()).await?;
    if !matched {
        return Err(ApiError::NotFound("student"));
    }
    info!(user_id = %user_id, updated_by = %actor.user_id, "student updated");
    Ok(Json(Ack { ok: true }))
}

#[instrument(skip(state, actor))]
pub async fn delete_student(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    gate::authorize(&actor, gate::MANAGE_STUDENTS)?;
    if !User::delete_student(&state.db, &user_id).await? {
        return Err(ApiError::NotFound("student"));
    }
    info!(user_id = %user_id, deleted_by = %actor.user_id, "student deleted");
    Ok(Json(Ack { ok: true }))
}

/// Accepts face encodings (float vectors) and/or raw face images and appends
/// them to the student record.
#[instrument(skip(state, actor, payload))]
pub async fn add_face_data(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<String>,
    Json(payload): Json<FaceDataRequest>,
) -> Result<Json<Ack>, ApiError> {
    let student = User::find_by_user_id(&state.db, &user_id)
        .await?
        .filter(|u| u.role == Role::Student)
        .ok_or(ApiError::NotFound("student"))?;
    gate::ensure_self_or_staff(&actor, &student.user_id)?;

    let encodings = serde_json::to_value(payload.face_encodings.unwrap_or_default())
        .map_err(anyhow::Error::from)?;
    let images = serde_json::to_value(payload.face_images.unwrap_or_default())
        .map_err(anyhow::Error::from)?;
    User::append_face_data(&state.db, &student.user_id, encodings, images).await?;

    info!(user_id = %student.user_id, added_by = %actor.user_id, "face data appended");
    Ok(Json(Ack { ok: true }))
}

#[instrument(skip(state, actor))]
pub async fn list_teachers(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    gate::authorize(&actor, gate::LIST_TEACHERS)?;
    let teachers = User::list_by_role(&state.db, Role::Teacher).await?;
    Ok(Json(teachers.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, actor, payload))]
pub async fn admin_add_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserAck>), ApiError> {
    gate::authorize(&actor, gate::MANAGE_USERS)?;
    check_new_account(&payload.user_id, &payload.password)?;

    if User::find_by_user_id(&state.db, &payload.user_id)
        .await?
        .is_some()
    {
        warn!(user_id = %payload.user_id, "user_id already exists");
        return Err(ApiError::DuplicateKey);
    }

    let hash = hash_password(&payload.password)?;
    let user =
        User::insert(&state.db, &payload.user_id, &payload.name, payload.role, &hash).await?;

    info!(user_id = %user.user_id, role = ?user.role, created_by = %actor.user_id, "user created");
    Ok((
        StatusCode::CREATED,
        Json(UserAck {
            ok: true,
            user_id: user.user_id,
        }),
    ))
}

#[instrument(skip(state, actor))]
pub async fn admin_list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    gate::authorize(&actor, gate::MANAGE_USERS)?;
    let users = User::list_all(&state.db).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, actor, payload))]
pub async fn admin_update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<String>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<Json<Ack>, ApiError> {
    gate::authorize(&actor, gate::MANAGE_USERS)?;
    let hash = match payload.password.as_deref() {
        Some(p) => Some(hash_password(p)?),
        None => None,
    };
    let matched = User::admin_update(
        &state.db,
        &user_id,
        payload.name.as_deref(),
        hash.as_deref(),
        payload.role,
    )
    .await?;
    if !matched {
        return Err(ApiError::NotFound("user"));
    }
    info!(user_id = %user_id, updated_by = %actor.user_id, "user updated");
    Ok(Json(Ack { ok: true }))
}

#[instrument(skip(state, actor))]
pub async fn admin_delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    gate::authorize(&actor, gate::MANAGE_USERS)?;
    if !User::admin_delete(&state.db, &user_id).await? {
        return Err(ApiError::NotFound("user"));
    }
    info!(user_id = %user_id, deleted_by = %actor.user_id, "user deleted");
    Ok(Json(Ack { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_shape() {
        assert!(is_valid_user_id("s1_2024"));
        assert!(is_valid_user_id("john.doe"));
        assert!(!is_valid_user_id("ab"));
        assert!(!is_valid_user_id("has space"));
        assert!(!is_valid_user_id(""));
    }

    #[test]
    fn new_account_checks() {
        assert!(check_new_account("student1", "password1").is_ok());
        assert!(matches!(
            check_new_account("student1", "short"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            check_new_account("!", "password1"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
