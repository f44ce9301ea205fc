// src/services/progress.rs

use std::collections::HashSet;

use chrono::Utc;

use crate::{
    error::{ServiceError, StoreError},
    models::{
        activity::Activity,
        content::{Summary, Video},
        progress::{
            ActivityProgress, ActivityStatus, DisciplineProgress, SummaryProgress, SummaryStatus,
            VideoProgress, VideoStatus, is_video_complete,
        },
    },
    store::LearningStore,
};

/// Rounded percentage; 0 when there is nothing to count.
fn percent_of(part: usize, whole: usize) -> i64 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as i64
}

/// Computes the display metrics from already loaded items and records.
///
/// Records for items outside the given lists are ignored, so each item's
/// reward counts at most once and `coins_earned <= coins_target`.
pub fn summarize(
    discipline_id: i64,
    activities: &[Activity],
    videos: &[Video],
    summaries: &[Summary],
    activity_progress: &[ActivityProgress],
    video_progress: &[VideoProgress],
    summary_progress: &[SummaryProgress],
) -> DisciplineProgress {
    let completed_activities: HashSet<i64> = activity_progress
        .iter()
        .filter(|r| r.status == ActivityStatus::Completed)
        .map(|r| r.activity_id)
        .collect();
    let completed_videos: HashSet<i64> = video_progress
        .iter()
        .filter(|r| is_video_complete(r))
        .map(|r| r.video_id)
        .collect();
    let read_summaries: HashSet<i64> = summary_progress
        .iter()
        .filter(|r| r.status == SummaryStatus::Read)
        .map(|r| r.summary_id)
        .collect();

    let done_activities: Vec<&Activity> = activities
        .iter()
        .filter(|a| completed_activities.contains(&a.id))
        .collect();
    let done_videos: Vec<&Video> = videos
        .iter()
        .filter(|v| completed_videos.contains(&v.id))
        .collect();
    let done_summaries = summaries
        .iter()
        .filter(|s| read_summaries.contains(&s.id))
        .count();

    let coins_target: i64 = activities.iter().map(|a| a.coin_reward.max(0)).sum::<i64>()
        + videos.iter().map(|v| v.coin_reward.max(0)).sum::<i64>();
    let coins_earned: i64 = done_activities.iter().map(|a| a.coin_reward.max(0)).sum::<i64>()
        + done_videos.iter().map(|v| v.coin_reward.max(0)).sum::<i64>();

    let coins_pct = if coins_target > 0 {
        (coins_earned as f64 / coins_target as f64 * 100.0)
            .min(100.0)
            .round() as i64
    } else {
        0
    };

    DisciplineProgress {
        discipline_id,
        activities_pct: percent_of(done_activities.len(), activities.len()),
        videos_pct: percent_of(done_videos.len(), videos.len()),
        summaries_pct: percent_of(done_summaries, summaries.len()),
        coins_pct,
        coins_earned,
        coins_target,
    }
}

/// Loads everything one (student, discipline) pair needs and summarizes it.
///
/// A failed lookup is an error, never a zeroed result: "no items" is a
/// valid 0%, "could not read" is not.
pub async fn aggregate(
    store: &dyn LearningStore,
    student_id: i64,
    discipline_id: i64,
) -> Result<DisciplineProgress, ServiceError> {
    let unavailable = |e: StoreError| {
        tracing::error!(
            "Failed to load progress (discipline {}, student {}): {:?}",
            discipline_id,
            student_id,
            e
        );
        ServiceError::DataUnavailable(e)
    };

    let activities = store.read_activities(discipline_id).await.map_err(unavailable)?;
    let videos = store.read_videos(discipline_id).await.map_err(unavailable)?;
    let summaries = store.read_summaries(discipline_id).await.map_err(unavailable)?;

    let activity_ids: Vec<i64> = activities.iter().map(|a| a.id).collect();
    let video_ids: Vec<i64> = videos.iter().map(|v| v.id).collect();
    let summary_ids: Vec<i64> = summaries.iter().map(|s| s.id).collect();

    let activity_progress = store
        .read_activity_progress(student_id, &activity_ids)
        .await
        .map_err(unavailable)?;
    let video_progress = store
        .read_video_progress(student_id, &video_ids)
        .await
        .map_err(unavailable)?;
    let summary_progress = store
        .read_summary_progress(student_id, &summary_ids)
        .await
        .map_err(unavailable)?;

    Ok(summarize(
        discipline_id,
        &activities,
        &videos,
        &summaries,
        &activity_progress,
        &video_progress,
        &summary_progress,
    ))
}

/// Records playback of a video.
///
/// Progress never regresses: the stored percentage only grows, and a video
/// once watched stays watched.
pub async fn record_video_progress(
    store: &dyn LearningStore,
    student_id: i64,
    video_id: i64,
    percentage: Option<i32>,
    watched: bool,
) -> Result<VideoProgress, ServiceError> {
    store
        .read_video(video_id)
        .await
        .map_err(ServiceError::DataUnavailable)?
        .ok_or_else(|| ServiceError::NotFound(format!("video {}", video_id)))?;

    let previous = store
        .read_video_progress(student_id, &[video_id])
        .await
        .map_err(ServiceError::DataUnavailable)?
        .into_iter()
        .find(|r| r.video_id == video_id);

    let percentage = percentage.map(|p| p.clamp(0, 100));
    let watched_percentage = match (previous.as_ref().and_then(|p| p.watched_percentage), percentage) {
        (Some(old), Some(new)) => Some(old.max(new)),
        (old, new) => old.or(new),
    };
    let already_watched = previous
        .as_ref()
        .is_some_and(|p| p.status == VideoStatus::Watched);

    let record = VideoProgress {
        student_id,
        video_id,
        status: if watched || already_watched {
            VideoStatus::Watched
        } else {
            VideoStatus::Pending
        },
        watched_percentage,
        updated_at: Some(Utc::now()),
    };

    store
        .upsert_video_progress(&record)
        .await
        .map_err(ServiceError::Persistence)?;

    tracing::info!(
        "Video {} progress for student {}: {:?} ({:?}%)",
        video_id,
        student_id,
        record.status,
        record.watched_percentage
    );
    Ok(record)
}

/// Marks a summary as read. Calling it again only refreshes the timestamp.
pub async fn mark_summary_read(
    store: &dyn LearningStore,
    student_id: i64,
    summary_id: i64,
) -> Result<SummaryProgress, ServiceError> {
    store
        .read_summary(summary_id)
        .await
        .map_err(ServiceError::DataUnavailable)?
        .ok_or_else(|| ServiceError::NotFound(format!("summary {}", summary_id)))?;

    let record = SummaryProgress {
        student_id,
        summary_id,
        status: SummaryStatus::Read,
        read_at: Some(Utc::now()),
    };

    store
        .upsert_summary_progress(&record)
        .await
        .map_err(ServiceError::Persistence)?;

    Ok(record)
}
