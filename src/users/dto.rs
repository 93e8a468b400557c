use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo::{Role, User};

/// Request body for open student registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub user_id: String,
    pub password: String,
}

/// Admin request to create a user of any role.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub user_id: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub name: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// Face data to append to a student record: encodings (float vectors from an
/// external model) and/or raw data-URL images.
#[derive(Debug, Deserialize)]
pub struct FaceDataRequest {
    pub face_encodings: Option<Vec<Vec<f64>>>,
    pub face_images: Option<Vec<String>>,
}

/// Public part of a user returned to clients; never carries the hash or the
/// face data.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub role: Role,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            user_id: u.user_id,
            name: u.name,
            role: u.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct UserAck {
    pub ok: bool,
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_hides_sensitive_fields() {
        let user = User {
            id: Uuid::new_v4(),
            user_id: "s1".into(),
            name: "Student One".into(),
            role: Role::Student,
            password_hash: "secret-hash".into(),
            face_encodings: serde_json::json!([[0.1, 0.2]]),
            face_images: serde_json::json!([]),
            created_at: time::OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert_eq!(json["user_id"], "s1");
        assert_eq!(json["role"], "student");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("face_encodings").is_none());
    }

    #[test]
    fn create_user_role_defaults_to_student() {
        let req: CreateUserRequest = serde_json::from_str(
            r#"{"name": "N", "user_id": "u1", "password": "password1"}"#,
        )
        .unwrap();
        assert_eq!(req.role, Role::Student);
    }
}
