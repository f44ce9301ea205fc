// tests/grading_tests.rs

use std::collections::HashMap;

use coins_study::{
    error::ServiceError,
    models::{
        activity::{Activity, QuestionRecord},
        submission::AttemptStatus,
    },
    services::grading,
    store::{LearningStore, memory::InMemoryStore},
};

const ACTIVITY: i64 = 10;
const STUDENT: i64 = 7;

/// Seeds one activity with two true/false and two multiple-choice questions.
/// Correct answers: 1 -> "true", 2 -> "false", 3 -> "B", 4 -> "C".
fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store
        .insert_activity(Activity {
            id: ACTIVITY,
            discipline_id: 1,
            title: "Fractions".to_string(),
            description: None,
            coin_reward: 10,
            deadline: None,
        })
        .unwrap();

    let base = QuestionRecord {
        activity_id: ACTIVITY,
        statement: "Question".to_string(),
        ..Default::default()
    };
    store
        .insert_question(QuestionRecord {
            id: 1,
            correct_answer: Some(true),
            ..base.clone()
        })
        .unwrap();
    store
        .insert_question(QuestionRecord {
            id: 2,
            correct_answer: Some(false),
            ..base.clone()
        })
        .unwrap();
    for (id, letter) in [(3, "B"), (4, "C")] {
        store
            .insert_question(QuestionRecord {
                id,
                choice_a: Some("1/2".to_string()),
                choice_b: Some("1/3".to_string()),
                choice_c: Some("1/4".to_string()),
                correct_letter: Some(letter.to_string()),
                ..base.clone()
            })
            .unwrap();
    }
    store
}

fn answers(pairs: &[(i64, &str)]) -> HashMap<i64, String> {
    pairs.iter().map(|(id, a)| (*id, a.to_string())).collect()
}

#[tokio::test]
async fn three_of_four_scores_seven_and_a_half() {
    let store = seeded_store();
    let submitted = answers(&[(1, "true"), (2, "false"), (3, "B"), (4, "A")]);

    let outcome = grading::submit(&store, ACTIVITY, STUDENT, &submitted)
        .await
        .unwrap();

    assert_eq!(outcome.score, 7.5);
    assert_eq!(outcome.correct_count, 3);
    assert_eq!(outcome.correctness.get(&4), Some(&false));

    let stored = store.read_answers(STUDENT, ACTIVITY).await.unwrap();
    assert_eq!(stored.len(), 4);
    assert_eq!(stored[3].answer, "A");
    assert!(!stored[3].is_correct);
    assert!(stored[0].is_correct);

    match grading::attempt_status(&store, STUDENT, ACTIVITY).await.unwrap() {
        AttemptStatus::Completed { score, .. } => assert_eq!(score, Some(7.5)),
        other => panic!("expected completed, got {:?}", other),
    }
}

#[tokio::test]
async fn incomplete_submission_writes_nothing() {
    let store = seeded_store();
    let submitted = answers(&[(1, "true"), (2, "false"), (3, "B")]);

    let err = grading::submit(&store, ACTIVITY, STUDENT, &submitted)
        .await
        .unwrap_err();

    match err {
        ServiceError::IncompleteSubmission { missing } => assert_eq!(missing, vec![4]),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(store.write_count(), 0);
    assert_eq!(store.answer_count().unwrap(), 0);
    assert_eq!(
        grading::attempt_status(&store, STUDENT, ACTIVITY).await.unwrap(),
        AttemptStatus::NotStarted
    );
}

#[tokio::test]
async fn empty_answer_counts_as_missing() {
    let store = seeded_store();
    let submitted = answers(&[(1, "true"), (2, ""), (3, "B"), (4, "C")]);

    let err = grading::submit(&store, ACTIVITY, STUDENT, &submitted)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::IncompleteSubmission { .. }));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn activity_without_questions_is_not_gradable() {
    let store = InMemoryStore::new();

    let err = grading::submit(&store, 99, STUDENT, &answers(&[(1, "A")]))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NoQuestions { activity_id: 99 }));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn grading_twice_is_idempotent() {
    let store = seeded_store();
    let submitted = answers(&[(1, "true"), (2, "true"), (3, "B"), (4, "C")]);

    let first = grading::submit(&store, ACTIVITY, STUDENT, &submitted)
        .await
        .unwrap();
    let first_rows: Vec<(i64, String, bool)> = store
        .read_answers(STUDENT, ACTIVITY)
        .await
        .unwrap()
        .into_iter()
        .map(|a| (a.question_id, a.answer, a.is_correct))
        .collect();

    let second = grading::submit(&store, ACTIVITY, STUDENT, &submitted)
        .await
        .unwrap();
    let second_rows: Vec<(i64, String, bool)> = store
        .read_answers(STUDENT, ACTIVITY)
        .await
        .unwrap()
        .into_iter()
        .map(|a| (a.question_id, a.answer, a.is_correct))
        .collect();

    assert_eq!(first.score, second.score);
    assert_eq!(first.correctness, second.correctness);
    assert_eq!(first_rows, second_rows);
    assert_eq!(store.answer_count().unwrap(), 4);
    assert_eq!(store.activity_progress_count().unwrap(), 1);
}

#[tokio::test]
async fn regrade_replaces_previous_score() {
    let store = seeded_store();

    let first = grading::submit(
        &store,
        ACTIVITY,
        STUDENT,
        &answers(&[(1, "true"), (2, "false"), (3, "B"), (4, "C")]),
    )
    .await
    .unwrap();
    assert_eq!(first.score, 10.0);

    let second = grading::submit(
        &store,
        ACTIVITY,
        STUDENT,
        &answers(&[(1, "false"), (2, "false"), (3, "A"), (4, "C")]),
    )
    .await
    .unwrap();
    assert_eq!(second.score, 5.0);

    assert_eq!(store.activity_progress_count().unwrap(), 1);
    match grading::attempt_status(&store, STUDENT, ACTIVITY).await.unwrap() {
        AttemptStatus::Completed { score, .. } => assert_eq!(score, Some(5.0)),
        other => panic!("expected completed, got {:?}", other),
    }

    let stored = store.read_answers(STUDENT, ACTIVITY).await.unwrap();
    assert_eq!(stored.len(), 4);
    assert_eq!(stored[0].answer, "false");
    assert!(!stored[0].is_correct);
}

#[tokio::test]
async fn store_failure_surfaces_as_persistence_error() {
    let store = seeded_store();
    store.set_fail_writes(true);

    let err = grading::submit(
        &store,
        ACTIVITY,
        STUDENT,
        &answers(&[(1, "true"), (2, "false"), (3, "B"), (4, "C")]),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ServiceError::Persistence(_)));

    // Retrying the whole call once the store is back is safe.
    store.set_fail_writes(false);
    let outcome = grading::submit(
        &store,
        ACTIVITY,
        STUDENT,
        &answers(&[(1, "true"), (2, "false"), (3, "B"), (4, "C")]),
    )
    .await
    .unwrap();
    assert_eq!(outcome.score, 10.0);
}

#[tokio::test]
async fn failed_progress_write_leaves_answers_and_retry_converges() {
    let store = seeded_store();
    let submitted = answers(&[(1, "true"), (2, "false"), (3, "B"), (4, "A")]);

    // The answer upsert goes through, the progress upsert does not.
    store.fail_writes_after(Some(1)).unwrap();
    let err = grading::submit(&store, ACTIVITY, STUDENT, &submitted)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Persistence(_)));
    assert_eq!(store.write_count(), 1);
    assert_eq!(store.answer_count().unwrap(), 4);
    assert_eq!(store.activity_progress_count().unwrap(), 0);
    assert_eq!(
        grading::attempt_status(&store, STUDENT, ACTIVITY).await.unwrap(),
        AttemptStatus::NotStarted
    );

    store.fail_writes_after(None).unwrap();
    let outcome = grading::submit(&store, ACTIVITY, STUDENT, &submitted)
        .await
        .unwrap();

    assert_eq!(outcome.score, 7.5);
    assert_eq!(store.answer_count().unwrap(), 4);
    assert_eq!(store.activity_progress_count().unwrap(), 1);
    match grading::attempt_status(&store, STUDENT, ACTIVITY).await.unwrap() {
        AttemptStatus::Completed { score, .. } => assert_eq!(score, Some(7.5)),
        other => panic!("expected completed, got {:?}", other),
    }
}

#[tokio::test]
async fn students_do_not_share_progress() {
    let store = seeded_store();
    grading::submit(
        &store,
        ACTIVITY,
        STUDENT,
        &answers(&[(1, "true"), (2, "false"), (3, "B"), (4, "C")]),
    )
    .await
    .unwrap();

    assert_eq!(
        grading::attempt_status(&store, STUDENT + 1, ACTIVITY)
            .await
            .unwrap(),
        AttemptStatus::NotStarted
    );
    assert!(
        grading::review_answers(&store, STUDENT + 1, ACTIVITY)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn activity_detail_hides_answer_keys() {
    let store = seeded_store();

    let detail = grading::activity_detail(&store, ACTIVITY).await.unwrap();
    assert_eq!(detail.questions.len(), 4);

    let json = serde_json::to_value(&detail).unwrap();
    assert_eq!(json["questions"][0]["type"], "true_false");
    assert_eq!(json["questions"][2]["type"], "multiple_choice");
    assert!(!json.to_string().contains("correct"));

    let err = grading::activity_detail(&store, 404).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
