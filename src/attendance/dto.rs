use serde::{Deserialize, Serialize};
use time::Date;

use crate::attendance::repo::{AttendanceRecord, AttendanceStatus};

#[derive(Debug, Deserialize)]
pub struct AutoMarkRequest {
    pub face_encoding: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ManualMarkRequest {
    pub student_user_id: String,
    #[serde(default)]
    pub status: AttendanceStatus,
    /// Defaults to today (UTC) when omitted.
    pub date: Option<Date>,
}

/// Outcome of an auto-mark attempt. AlreadyMarked is a success, not an
/// error; the caller can tell a fresh mark from a repeat.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AutoMarkResponse {
    NoMatch {
        matched: bool,
        reason: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        best_score: Option<f64>,
    },
    AlreadyMarked {
        ok: bool,
        already_marked: bool,
        student_user_id: String,
        score: f64,
    },
    Marked {
        ok: bool,
        student_user_id: String,
        score: f64,
    },
}

impl AutoMarkResponse {
    pub fn no_match(best_score: Option<f64>) -> Self {
        Self::NoMatch {
            matched: false,
            reason: "no match",
            best_score,
        }
    }

    pub fn already_marked(student_user_id: String, score: f64) -> Self {
        Self::AlreadyMarked {
            ok: true,
            already_marked: true,
            student_user_id,
            score,
        }
    }

    pub fn marked(student_user_id: String, score: f64) -> Self {
        Self::Marked {
            ok: true,
            student_user_id,
            score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StudentAttendanceResponse {
    pub attendance: Vec<AttendanceRecord>,
}

#[derive(Debug, Serialize)]
pub struct DateAttendanceResponse {
    pub date: Date,
    pub records: Vec<AttendanceRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marked_and_already_marked_are_distinguishable() {
        let marked = serde_json::to_value(AutoMarkResponse::marked("s1".into(), 0.1)).unwrap();
        assert_eq!(marked["ok"], true);
        assert_eq!(marked["student_user_id"], "s1");
        assert!(marked.get("already_marked").is_none());

        let repeat =
            serde_json::to_value(AutoMarkResponse::already_marked("s1".into(), 0.1)).unwrap();
        assert_eq!(repeat["already_marked"], true);
    }

    #[test]
    fn no_match_omits_score_when_nothing_was_comparable() {
        let none = serde_json::to_value(AutoMarkResponse::no_match(None)).unwrap();
        assert_eq!(none["matched"], false);
        assert!(none.get("best_score").is_none());

        let some = serde_json::to_value(AutoMarkResponse::no_match(Some(0.9))).unwrap();
        assert_eq!(some["best_score"], 0.9);
    }

    #[test]
    fn manual_mark_status_defaults_to_present() {
        let req: ManualMarkRequest =
            serde_json::from_str(r#"{"student_user_id": "s1"}"#).unwrap();
        assert_eq!(req.status, AttendanceStatus::Present);
        assert!(req.date.is_none());
    }
}
