use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub mod dto;
pub mod handlers;
pub mod matcher;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/attendance/auto", post(handlers::auto_attendance))
        .route("/attendance/manual", post(handlers::manual_attendance))
        .route(
            "/attendance/student/:user_id",
            get(handlers::student_attendance),
        )
        .route("/attendance/date/:date", get(handlers::attendance_by_date))
}
