// tests/progress_tests.rs

use std::collections::HashMap;

use coins_study::{
    error::ServiceError,
    models::{
        activity::{Activity, QuestionRecord},
        content::{Summary, Video},
        progress::VideoStatus,
    },
    services::{grading, progress},
    store::memory::InMemoryStore,
};

const DISCIPLINE: i64 = 1;
const STUDENT: i64 = 3;

fn activity(id: i64, coin_reward: i64) -> Activity {
    Activity {
        id,
        discipline_id: DISCIPLINE,
        title: format!("Activity {}", id),
        description: Some("Practice".to_string()),
        coin_reward,
        deadline: None,
    }
}

fn video(id: i64, coin_reward: i64) -> Video {
    Video {
        id,
        discipline_id: DISCIPLINE,
        title: format!("Video {}", id),
        url: Some(format!("https://videos.example/{}", id)),
        coin_reward,
    }
}

/// Two activities (10 and 20 coins, one true/false question each),
/// one 5-coin video and one summary.
fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.insert_activity(activity(1, 10)).unwrap();
    store.insert_activity(activity(2, 20)).unwrap();
    for (id, activity_id) in [(11, 1), (21, 2)] {
        store
            .insert_question(QuestionRecord {
                id,
                activity_id,
                statement: "Is it true?".to_string(),
                correct_answer: Some(true),
                ..Default::default()
            })
            .unwrap();
    }
    store.insert_video(video(5, 5)).unwrap();
    store
        .insert_summary(Summary {
            id: 8,
            discipline_id: DISCIPLINE,
            title: "Chapter 1".to_string(),
        })
        .unwrap();
    store
}

#[tokio::test]
async fn coins_follow_completed_items() {
    let store = seeded_store();

    grading::submit(&store, 1, STUDENT, &HashMap::from([(11, "false".to_string())]))
        .await
        .unwrap();
    progress::record_video_progress(&store, STUDENT, 5, None, true)
        .await
        .unwrap();

    let metrics = progress::aggregate(&store, STUDENT, DISCIPLINE).await.unwrap();

    // A graded activity is completed whatever its score.
    assert_eq!(metrics.coins_earned, 15);
    assert_eq!(metrics.coins_target, 35);
    assert_eq!(metrics.coins_pct, 43);
    assert_eq!(metrics.activities_pct, 50);
    assert_eq!(metrics.videos_pct, 100);
    assert_eq!(metrics.summaries_pct, 0);
}

#[tokio::test]
async fn regrading_does_not_double_count_coins() {
    let store = seeded_store();
    let answers = HashMap::from([(11, "true".to_string())]);

    for _ in 0..3 {
        grading::submit(&store, 1, STUDENT, &answers).await.unwrap();
    }

    let metrics = progress::aggregate(&store, STUDENT, DISCIPLINE).await.unwrap();
    assert_eq!(metrics.coins_earned, 10);
    assert!(metrics.coins_earned <= metrics.coins_target);
}

#[tokio::test]
async fn video_completes_on_percentage_alone() {
    let store = seeded_store();

    let record = progress::record_video_progress(&store, STUDENT, 5, Some(95), false)
        .await
        .unwrap();
    assert_eq!(record.status, VideoStatus::Pending);

    let metrics = progress::aggregate(&store, STUDENT, DISCIPLINE).await.unwrap();
    assert_eq!(metrics.videos_pct, 100);
    assert_eq!(metrics.coins_earned, 5);
}

#[tokio::test]
async fn half_watched_video_is_not_complete() {
    let store = seeded_store();

    progress::record_video_progress(&store, STUDENT, 5, Some(50), false)
        .await
        .unwrap();

    let metrics = progress::aggregate(&store, STUDENT, DISCIPLINE).await.unwrap();
    assert_eq!(metrics.videos_pct, 0);
    assert_eq!(metrics.coins_earned, 0);
}

#[tokio::test]
async fn video_progress_never_regresses() {
    let store = seeded_store();

    progress::record_video_progress(&store, STUDENT, 5, Some(80), true)
        .await
        .unwrap();
    let record = progress::record_video_progress(&store, STUDENT, 5, Some(20), false)
        .await
        .unwrap();

    assert_eq!(record.watched_percentage, Some(80));
    assert_eq!(record.status, VideoStatus::Watched);

    let record = progress::record_video_progress(&store, STUDENT, 5, Some(250), false)
        .await
        .unwrap();
    assert_eq!(record.watched_percentage, Some(100));
}

#[tokio::test]
async fn reading_a_summary_counts() {
    let store = seeded_store();

    progress::mark_summary_read(&store, STUDENT, 8).await.unwrap();
    progress::mark_summary_read(&store, STUDENT, 8).await.unwrap();

    let metrics = progress::aggregate(&store, STUDENT, DISCIPLINE).await.unwrap();
    assert_eq!(metrics.summaries_pct, 100);
    assert_eq!(metrics.coins_earned, 0);
}

#[tokio::test]
async fn unknown_items_are_not_found() {
    let store = seeded_store();

    let err = progress::record_video_progress(&store, STUDENT, 404, Some(10), false)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = progress::mark_summary_read(&store, STUDENT, 404).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn empty_discipline_is_zero_not_error() {
    let store = InMemoryStore::new();

    let metrics = progress::aggregate(&store, STUDENT, 77).await.unwrap();

    assert_eq!(metrics.activities_pct, 0);
    assert_eq!(metrics.videos_pct, 0);
    assert_eq!(metrics.summaries_pct, 0);
    assert_eq!(metrics.coins_pct, 0);
    assert_eq!(metrics.coins_earned, 0);
    assert_eq!(metrics.coins_target, 0);
}

#[tokio::test]
async fn failed_reads_are_data_unavailable() {
    let store = seeded_store();
    store.set_fail_reads(true);

    let err = progress::aggregate(&store, STUDENT, DISCIPLINE)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::DataUnavailable(_)));

    let err = grading::attempt_status(&store, STUDENT, 1).await.unwrap_err();
    assert!(matches!(err, ServiceError::DataUnavailable(_)));
}
