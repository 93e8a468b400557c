use axum::{
    extract::{Path, State},
    Json,
};
use time::{macros::format_description, Date, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::attendance::dto::{
    AutoMarkRequest, AutoMarkResponse, DateAttendanceResponse, ManualMarkRequest,
    StudentAttendanceResponse,
};
use crate::attendance::{matcher, repo};
use crate::auth::{extractors::CurrentUser, gate};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::Ack;

fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

fn parse_date(s: &str) -> Result<Date, ApiError> {
    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .map_err(|_| ApiError::BadRequest("invalid date, expected YYYY-MM-DD".into()))
}

/// Match the submitted encoding against every student's stored encodings and
/// mark the best student present for today, unless already marked. The scan
/// reads a snapshot; the conditional insert is what enforces the per-day
/// invariant under concurrent requests.
#[instrument(skip(state, actor, payload))]
pub async fn auto_attendance(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(payload): Json<AutoMarkRequest>,
) -> Result<Json<AutoMarkResponse>, ApiError> {
    gate::authorize(&actor, gate::MARK_ATTENDANCE)?;
    if payload.face_encoding.is_empty() {
        return Err(ApiError::BadRequest("face_encoding required".into()));
    }

    let candidates = repo::student_encoding_snapshot(&state.db).await?;
    let best = match matcher::best_match(&payload.face_encoding, &candidates) {
        Some(best) => best,
        None => {
            info!("no usable stored encodings");
            return Ok(Json(AutoMarkResponse::no_match(None)));
        }
    };

    if best.distance > state.config.match_threshold {
        info!(best_score = best.distance, "best candidate above threshold");
        return Ok(Json(AutoMarkResponse::no_match(Some(best.distance))));
    }

    let today = today_utc();
    if repo::find_one(&state.db, &best.user_id, today).await?.is_some() {
        return Ok(Json(AutoMarkResponse::already_marked(
            best.user_id,
            best.distance,
        )));
    }

    let inserted = repo::insert_if_absent(
        &state.db,
        &best.user_id,
        today,
        repo::AttendanceStatus::Present,
        &actor.user_id,
        Some(best.distance),
    )
    .await?;

    match inserted {
        Some(record) => {
            info!(
                student = %record.student_user_id,
                score = best.distance,
                marked_by = %actor.user_id,
                "attendance auto-marked"
            );
            Ok(Json(AutoMarkResponse::marked(best.user_id, best.distance)))
        }
        // a concurrent request marked the same student first
        None => {
            warn!(student = %best.user_id, "lost auto-mark race");
            Ok(Json(AutoMarkResponse::already_marked(
                best.user_id,
                best.distance,
            )))
        }
    }
}

/// Manual marking is an explicit override: it creates or overwrites the
/// record for the given day.
#[instrument(skip(state, actor, payload))]
pub async fn manual_attendance(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(payload): Json<ManualMarkRequest>,
) -> Result<Json<Ack>, ApiError> {
    gate::authorize(&actor, gate::MARK_ATTENDANCE)?;
    if payload.student_user_id.is_empty() {
        return Err(ApiError::BadRequest("student_user_id required".into()));
    }

    let date = payload.date.unwrap_or_else(today_utc);
    let record = repo::upsert_manual(
        &state.db,
        &payload.student_user_id,
        date,
        payload.status,
        &actor.user_id,
    )
    .await?;

    info!(
        student = %record.student_user_id,
        date = %record.date,
        status = ?record.status,
        marked_by = %actor.user_id,
        "attendance manually marked"
    );
    Ok(Json(Ack { ok: true }))
}

#[instrument(skip(state, actor))]
pub async fn student_attendance(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<StudentAttendanceResponse>, ApiError> {
    gate::ensure_self_or_staff(&actor, &user_id)?;
    let attendance = repo::list_for_student(&state.db, &user_id).await?;
    Ok(Json(StudentAttendanceResponse { attendance }))
}

#[instrument(skip(state, actor))]
pub async fn attendance_by_date(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(date): Path<String>,
) -> Result<Json<DateAttendanceResponse>, ApiError> {
    gate::authorize(&actor, gate::VIEW_DAY_SHEET)?;
    let date = parse_date(&date)?;
    let records = repo::list_for_date(&state.db, date).await?;
    Ok(Json(DateAttendanceResponse { date, records }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        let d = parse_date("2024-03-09").unwrap();
        assert_eq!(d, time::macros::date!(2024 - 03 - 09));
    }

    #[test]
    fn rejects_malformed_dates() {
        for s in ["09-03-2024", "2024/03/09", "yesterday", ""] {
            assert!(matches!(parse_date(s), Err(ApiError::BadRequest(_))));
        }
    }
}
