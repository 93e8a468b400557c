use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Admin,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Ordered JSONB array of float vectors; append-only.
    pub face_encodings: serde_json::Value,
    /// Ordered JSONB array of data-URL strings; append-only.
    pub face_images: serde_json::Value,
    pub created_at: OffsetDateTime,
}

impl User {
    pub async fn find_by_user_id(db: &PgPool, user_id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_id, name, role, password_hash, face_encodings, face_images, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Insert a new user. The unique index on user_id is the authoritative
    /// duplicate check; a violation surfaces as `sqlx::Error`.
    pub async fn insert(
        db: &PgPool,
        user_id: &str,
        name: &str,
        role: Role,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, name, role, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, name, role, password_hash, face_encodings, face_images, created_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(role)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    /// Seeding primitive: create the account unless the user_id is taken.
    /// Returns whether a row was written.
    pub async fn insert_if_absent(
        db: &PgPool,
        user_id: &str,
        name: &str,
        role: Role,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let done = sqlx::query(
            r#"
            INSERT INTO users (user_id, name, role, password_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(role)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn list_by_role(db: &PgPool, role: Role) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_id, name, role, password_hash, face_encodings, face_images, created_at
            FROM users
            WHERE role = $1
            ORDER BY user_id
            "#,
        )
        .bind(role)
        .fetch_all(db)
        .await
    }

    pub async fn list_all(db: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_id, name, role, password_hash, face_encodings, face_images, created_at
            FROM users
            ORDER BY user_id
            "#,
        )
        .fetch_all(db)
        .await
    }

    /// Update a student's profile fields. Role is deliberately not touchable
    /// here. Returns whether a student row matched.
    pub async fn update_student(
        db: &PgPool,
        user_id: &str,
        name: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let done = sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                password_hash = COALESCE($3, password_hash)
            WHERE user_id = $1 AND role = 'student'
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    /// Admin-scoped update of any user; the only operation that may change a
    /// role.
    pub async fn admin_update(
        db: &PgPool,
        user_id: &str,
        name: Option<&str>,
        password_hash: Option<&str>,
        role: Option<Role>,
    ) -> Result<bool, sqlx::Error> {
        let done = sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                password_hash = COALESCE($3, password_hash),
                role = COALESCE($4, role)
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(password_hash)
        .bind(role)
        .execute(db)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn delete_student(db: &PgPool, user_id: &str) -> Result<bool, sqlx::Error> {
        let done = sqlx::query("DELETE FROM users WHERE user_id = $1 AND role = 'student'")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn admin_delete(db: &PgPool, user_id: &str) -> Result<bool, sqlx::Error> {
        let done = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    /// Append face data to a student record. Appends only; existing entries
    /// are never replaced or deduplicated. Returns whether a student row
    /// matched.
    pub async fn append_face_data(
        db: &PgPool,
        user_id: &str,
        encodings: serde_json::Value,
        images: serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let done = sqlx::query(
            r#"
            UPDATE users
            SET face_encodings = face_encodings || $2,
                face_images = face_images || $3
            WHERE user_id = $1 AND role = 'student'
            "#,
        )
        .bind(user_id)
        .bind(encodings)
        .bind(images)
        .execute(db)
        .await?;
        Ok(done.rows_affected() > 0)
    }
}
