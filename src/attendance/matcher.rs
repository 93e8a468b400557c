//! Nearest-neighbor face matching over a snapshot of stored encodings.
//!
//! Pure functions: the caller fetches the candidate snapshot (students in
//! user_id order) and decides what to do with the result. Linear scan is
//! deliberate; the expected population is far below the point where an index
//! structure would pay off.

/// One student's stored encodings, in append order.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub user_id: String,
    pub encodings: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub user_id: String,
    pub distance: f64,
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Global minimum distance across every candidate encoding. Stored encodings
/// whose length differs from the query are skipped; stored data may be
/// heterogeneous before retraining. Ties keep the first encounter, so with
/// candidates in user_id order the result is deterministic.
pub fn best_match(query: &[f64], candidates: &[Candidate]) -> Option<Match> {
    let mut best: Option<Match> = None;
    for candidate in candidates {
        for stored in &candidate.encodings {
            if stored.len() != query.len() {
                continue;
            }
            let d = euclidean(query, stored);
            if best.as_ref().map_or(true, |b| d < b.distance) {
                best = Some(Match {
                    user_id: candidate.user_id.clone(),
                    distance: d,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(user_id: &str, encodings: &[&[f64]]) -> Candidate {
        Candidate {
            user_id: user_id.into(),
            encodings: encodings.iter().map(|e| e.to_vec()).collect(),
        }
    }

    #[test]
    fn empty_candidates_never_match() {
        assert_eq!(best_match(&[0.1, 0.2], &[]), None);
        let no_encodings = candidate("s1", &[]);
        assert_eq!(best_match(&[0.1, 0.2], &[no_encodings]), None);
    }

    #[test]
    fn query_nearest_to_a_matches_a_not_b() {
        let a = candidate("a", &[&[0.0, 0.0], &[0.1, 0.0]]);
        let b = candidate("b", &[&[5.0, 5.0]]);
        let m = best_match(&[0.05, 0.0], &[a, b]).expect("match");
        assert_eq!(m.user_id, "a");
        assert!(m.distance < 0.1);
    }

    #[test]
    fn mismatched_length_encodings_are_skipped() {
        let bad = candidate("bad", &[&[0.0]]);
        let good = candidate("good", &[&[3.0, 4.0]]);
        let m = best_match(&[0.0, 0.0], &[bad, good]).expect("match");
        assert_eq!(m.user_id, "good");
        assert!((m.distance - 5.0).abs() < 1e-12);
    }

    #[test]
    fn only_mismatched_lengths_means_no_match() {
        let bad = candidate("bad", &[&[0.0], &[0.0, 0.0, 0.0]]);
        assert_eq!(best_match(&[0.0, 0.0], &[bad]), None);
    }

    #[test]
    fn tie_keeps_first_candidate_in_order() {
        // equidistant encodings; "alice" scans first
        let alice = candidate("alice", &[&[1.0, 0.0]]);
        let bob = candidate("bob", &[&[-1.0, 0.0]]);
        let m = best_match(&[0.0, 0.0], &[alice, bob]).expect("match");
        assert_eq!(m.user_id, "alice");
    }

    #[test]
    fn distance_is_euclidean() {
        let s = candidate("s1", &[&[0.1, 0.0]]);
        let m = best_match(&[0.0, 0.0], &[s]).expect("match");
        assert!((m.distance - 0.1).abs() < 1e-12);
    }
}
