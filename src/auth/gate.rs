//! Role-based access control. Every protected operation names its allowed
//! roles in the table below; handlers call `authorize` with one entry, so a
//! route with no entry simply cannot be reached with any role.

use crate::error::ApiError;
use crate::users::repo::{Role, User};

pub const MARK_ATTENDANCE: &[Role] = &[Role::Teacher, Role::Admin];
pub const VIEW_DAY_SHEET: &[Role] = &[Role::Teacher, Role::Admin];
pub const LIST_STUDENTS: &[Role] = &[Role::Teacher, Role::Admin];
pub const MANAGE_STUDENTS: &[Role] = &[Role::Teacher, Role::Admin];
pub const LIST_TEACHERS: &[Role] = &[Role::Admin];
pub const MANAGE_USERS: &[Role] = &[Role::Admin];

pub fn authorize(user: &User, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Self-access rule, layered on top of the role gate: a student may act only
/// on their own record, teacher/admin on anyone's.
pub fn ensure_self_or_staff(user: &User, target_user_id: &str) -> Result<(), ApiError> {
    if user.role == Role::Student && user.user_id != target_user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn user(user_id: &str, role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            name: "Test".into(),
            role,
            password_hash: "x".into(),
            face_encodings: serde_json::json!([]),
            face_images: serde_json::json!([]),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn allowed_role_passes() {
        assert!(authorize(&user("t1", Role::Teacher), MARK_ATTENDANCE).is_ok());
        assert!(authorize(&user("a1", Role::Admin), MANAGE_USERS).is_ok());
    }

    #[test]
    fn disallowed_role_is_forbidden() {
        let s = user("s1", Role::Student);
        for table in [
            MARK_ATTENDANCE,
            VIEW_DAY_SHEET,
            LIST_STUDENTS,
            MANAGE_STUDENTS,
            LIST_TEACHERS,
            MANAGE_USERS,
        ] {
            assert!(matches!(authorize(&s, table), Err(ApiError::Forbidden)));
        }
    }

    #[test]
    fn teacher_is_not_admin() {
        let t = user("t1", Role::Teacher);
        assert!(matches!(authorize(&t, MANAGE_USERS), Err(ApiError::Forbidden)));
        assert!(matches!(authorize(&t, LIST_TEACHERS), Err(ApiError::Forbidden)));
    }

    #[test]
    fn student_reaches_own_record_only() {
        let s = user("s1", Role::Student);
        assert!(ensure_self_or_staff(&s, "s1").is_ok());
        assert!(matches!(
            ensure_self_or_staff(&s, "s2"),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn staff_reach_any_record() {
        assert!(ensure_self_or_staff(&user("t1", Role::Teacher), "s2").is_ok());
        assert!(ensure_self_or_staff(&user("a1", Role::Admin), "s2").is_ok());
    }
}
