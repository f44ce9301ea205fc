// src/services/grading.rs

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;

use crate::{
    error::ServiceError,
    models::{
        activity::{ActivityDetail, PublicQuestion, Question},
        progress::{ActivityProgress, ActivityStatus},
        submission::{AnswerRecord, AttemptStatus, GradeOutcome},
    },
    store::LearningStore,
};

/// Correctness of one fully answered attempt, before anything is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Scorecard {
    pub correctness: BTreeMap<i64, bool>,
    pub correct_count: usize,
    pub total_questions: usize,
    pub score: f64,
}

/// Rounds to two decimal places.
fn round_2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Scores an answer set against the activity's questions.
///
/// Fails if there are no questions, or if any question has no answer or an
/// empty one. Answers to questions outside the activity are ignored.
pub fn score_answers(
    activity_id: i64,
    questions: &[Question],
    answers: &HashMap<i64, String>,
) -> Result<Scorecard, ServiceError> {
    if questions.is_empty() {
        return Err(ServiceError::NoQuestions { activity_id });
    }

    let missing: Vec<i64> = questions
        .iter()
        .filter(|q| !answers.get(&q.id).is_some_and(|a| !a.is_empty()))
        .map(|q| q.id)
        .collect();
    if !missing.is_empty() {
        return Err(ServiceError::IncompleteSubmission { missing });
    }

    let correctness: BTreeMap<i64, bool> = questions
        .iter()
        .map(|q| {
            let answer = answers.get(&q.id).map(String::as_str).unwrap_or_default();
            (q.id, q.is_correct(answer))
        })
        .collect();

    let correct_count = correctness.values().filter(|ok| **ok).count();
    let total_questions = questions.len();
    let score = round_2(correct_count as f64 / total_questions as f64 * 10.0);

    Ok(Scorecard {
        correctness,
        correct_count,
        total_questions,
        score,
    })
}

/// Grades one attempt and persists the result.
///
/// Nothing is written unless every question is answered. On success the
/// answers are upserted per (activity, question, student) and the progress
/// record per (activity, student) is overwritten with status completed.
/// Regrading replaces the previous score; retrying with the same answers
/// yields the same stored rows.
pub async fn grade(
    store: &dyn LearningStore,
    activity_id: i64,
    student_id: i64,
    questions: &[Question],
    answers: &HashMap<i64, String>,
) -> Result<GradeOutcome, ServiceError> {
    let scorecard = score_answers(activity_id, questions, answers)?;
    let now = Utc::now();

    let records: Vec<AnswerRecord> = questions
        .iter()
        .map(|q| AnswerRecord {
            activity_id,
            question_id: q.id,
            student_id,
            answer: answers.get(&q.id).cloned().unwrap_or_default(),
            is_correct: scorecard.correctness.get(&q.id).copied().unwrap_or(false),
            answered_at: Some(now),
        })
        .collect();

    let progress = ActivityProgress {
        student_id,
        activity_id,
        status: ActivityStatus::Completed,
        score: Some(scorecard.score),
        completed_at: Some(now),
    };

    store
        .save_attempt(&records, &progress)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to save attempt (activity {}, student {}): {:?}",
                activity_id,
                student_id,
                e
            );
            ServiceError::Persistence(e)
        })?;

    tracing::info!(
        "Graded activity {} for student {}: {}/{} correct, score {}",
        activity_id,
        student_id,
        scorecard.correct_count,
        scorecard.total_questions,
        scorecard.score
    );

    Ok(GradeOutcome {
        activity_id,
        score: scorecard.score,
        correct_count: scorecard.correct_count,
        total_questions: scorecard.total_questions,
        correctness: scorecard.correctness,
    })
}

/// Loads the activity's questions and grades the attempt.
pub async fn submit(
    store: &dyn LearningStore,
    activity_id: i64,
    student_id: i64,
    answers: &HashMap<i64, String>,
) -> Result<GradeOutcome, ServiceError> {
    let questions = store
        .read_questions(activity_id)
        .await
        .map_err(ServiceError::DataUnavailable)?;

    grade(store, activity_id, student_id, &questions, answers).await
}

/// Tells the caller whether the student already completed the activity,
/// so it can block re-entry before calling [`grade`].
pub async fn attempt_status(
    store: &dyn LearningStore,
    student_id: i64,
    activity_id: i64,
) -> Result<AttemptStatus, ServiceError> {
    let records = store
        .read_activity_progress(student_id, &[activity_id])
        .await
        .map_err(ServiceError::DataUnavailable)?;

    let status = match records.into_iter().find(|r| r.activity_id == activity_id) {
        None => AttemptStatus::NotStarted,
        Some(record) => match record.status {
            ActivityStatus::Pending => AttemptStatus::Pending,
            ActivityStatus::Completed => AttemptStatus::Completed {
                score: record.score,
                completed_at: record.completed_at,
            },
        },
    };
    Ok(status)
}

/// The activity with its questions, answer keys stripped.
pub async fn activity_detail(
    store: &dyn LearningStore,
    activity_id: i64,
) -> Result<ActivityDetail, ServiceError> {
    let activity = store
        .read_activity(activity_id)
        .await
        .map_err(ServiceError::DataUnavailable)?
        .ok_or_else(|| ServiceError::NotFound(format!("activity {}", activity_id)))?;

    let questions = store
        .read_questions(activity_id)
        .await
        .map_err(ServiceError::DataUnavailable)?;

    Ok(ActivityDetail {
        activity,
        questions: questions.iter().map(PublicQuestion::from).collect(),
    })
}

/// Stored correctness records of the student's last attempt.
pub async fn review_answers(
    store: &dyn LearningStore,
    student_id: i64,
    activity_id: i64,
) -> Result<Vec<AnswerRecord>, ServiceError> {
    store
        .read_answers(student_id, activity_id)
        .await
        .map_err(ServiceError::DataUnavailable)
}
