// src/models/submission.rs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Represents the 'activity_answers' table in the database.
/// Keyed by (activity, question, student).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct AnswerRecord {
    pub activity_id: i64,
    pub question_id: i64,
    pub student_id: i64,
    /// Raw submitted value: "true"/"false" or a letter "A".."D".
    pub answer: String,
    pub is_correct: bool,
    pub answered_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for submitting an activity attempt.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitActivityRequest {
    /// Key: question id. Value: the chosen answer, or `null` when unanswered.
    #[validate(custom(function = validate_answers))]
    pub answers: HashMap<i64, Option<String>>,
}

impl SubmitActivityRequest {
    /// The answered entries only. A `null` entry is the same as a missing one.
    pub fn answered(self) -> HashMap<i64, String> {
        self.answers
            .into_iter()
            .filter_map(|(question_id, answer)| answer.map(|a| (question_id, a)))
            .collect()
    }
}

const ANSWER_VALUES: [&str; 6] = ["true", "false", "A", "B", "C", "D"];

fn validate_answers(
    answers: &HashMap<i64, Option<String>>,
) -> Result<(), validator::ValidationError> {
    if answers
        .values()
        .flatten()
        .any(|value| !ANSWER_VALUES.contains(&value.as_str()))
    {
        return Err(validator::ValidationError::new("invalid_answer_value"));
    }
    Ok(())
}

/// Result of grading one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GradeOutcome {
    pub activity_id: i64,
    /// 0 to 10, rounded to two decimals.
    pub score: f64,
    pub correct_count: usize,
    pub total_questions: usize,
    /// Key: question id. Value: whether the submitted answer was right.
    pub correctness: BTreeMap<i64, bool>,
}

/// Where a student stands on an activity before (re)submitting.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptStatus {
    NotStarted,
    Pending,
    Completed {
        score: Option<f64>,
        completed_at: Option<chrono::DateTime<chrono::Utc>>,
    },
}

impl AttemptStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, AttemptStatus::Completed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(pairs: &[(i64, Option<&str>)]) -> SubmitActivityRequest {
        SubmitActivityRequest {
            answers: pairs
                .iter()
                .map(|(id, a)| (*id, a.map(str::to_string)))
                .collect(),
        }
    }

    #[test]
    fn test_answer_values_are_validated() {
        assert!(request(&[(1, Some("true")), (2, Some("C"))]).validate().is_ok());
        assert!(request(&[(1, Some("maybe"))]).validate().is_err());
        assert!(request(&[(1, Some("c"))]).validate().is_err());
    }

    #[test]
    fn test_null_answer_is_dropped_not_rejected() {
        let req: SubmitActivityRequest =
            serde_json::from_str(r#"{"answers":{"1":"true","2":null}}"#).unwrap();
        assert!(req.validate().is_ok());

        let answered = req.answered();
        assert_eq!(answered.len(), 1);
        assert_eq!(answered.get(&1).map(String::as_str), Some("true"));
        assert!(!answered.contains_key(&2));
    }

    #[test]
    fn test_attempt_status_serializes_tagged() {
        let json = serde_json::to_value(AttemptStatus::NotStarted).unwrap();
        assert_eq!(json["status"], "not_started");

        let json = serde_json::to_value(AttemptStatus::Completed {
            score: Some(7.5),
            completed_at: None,
        })
        .unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["score"], 7.5);
    }
}
