use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub mod dto;
pub mod handlers;
pub mod repo;

pub use repo::{Role, User};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/students/register", post(handlers::register_student))
        .route("/students", get(handlers::list_students))
        .route(
            "/students/:user_id",
            get(handlers::get_student)
                .put(handlers::update_student)
                .delete(handlers::delete_student),
        )
        .route("/students/:user_id/face", post(handlers::add_face_data))
        .route("/teachers", get(handlers::list_teachers))
        .route(
            "/admin/users",
            post(handlers::admin_add_user).get(handlers::admin_list_users),
        )
        .route(
            "/admin/users/:user_id",
            put(handlers::admin_update_user).delete(handlers::admin_delete_user),
        )
}
