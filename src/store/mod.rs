// src/store/mod.rs

//! Contracts the grading and progress operations expect from the
//! persistent store. Each call is atomic on its own; calls do not compose
//! into a transaction unless an implementation says so.

use crate::{
    error::StoreError,
    models::{
        activity::{Activity, Question},
        content::{Summary, Video},
        progress::{ActivityProgress, SummaryProgress, VideoProgress},
        submission::AnswerRecord,
    },
};

pub mod memory;
pub mod postgres;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait::async_trait]
pub trait LearningStore: Send + Sync {
    // Authored content
    async fn read_activity(&self, activity_id: i64) -> StoreResult<Option<Activity>>;
    async fn read_questions(&self, activity_id: i64) -> StoreResult<Vec<Question>>;
    async fn read_activities(&self, discipline_id: i64) -> StoreResult<Vec<Activity>>;
    async fn read_video(&self, video_id: i64) -> StoreResult<Option<Video>>;
    async fn read_videos(&self, discipline_id: i64) -> StoreResult<Vec<Video>>;
    async fn read_summary(&self, summary_id: i64) -> StoreResult<Option<Summary>>;
    async fn read_summaries(&self, discipline_id: i64) -> StoreResult<Vec<Summary>>;

    // Student progress, restricted to the given item ids
    async fn read_activity_progress(
        &self,
        student_id: i64,
        activity_ids: &[i64],
    ) -> StoreResult<Vec<ActivityProgress>>;
    async fn read_video_progress(
        &self,
        student_id: i64,
        video_ids: &[i64],
    ) -> StoreResult<Vec<VideoProgress>>;
    async fn read_summary_progress(
        &self,
        student_id: i64,
        summary_ids: &[i64],
    ) -> StoreResult<Vec<SummaryProgress>>;
    async fn read_answers(&self, student_id: i64, activity_id: i64)
    -> StoreResult<Vec<AnswerRecord>>;

    // Upserts
    /// Keyed by (activity, question, student).
    async fn upsert_answers(&self, records: &[AnswerRecord]) -> StoreResult<()>;
    /// Keyed by (activity, student).
    async fn upsert_activity_progress(&self, record: &ActivityProgress) -> StoreResult<()>;
    /// Keyed by (video, student).
    async fn upsert_video_progress(&self, record: &VideoProgress) -> StoreResult<()>;
    /// Keyed by (summary, student).
    async fn upsert_summary_progress(&self, record: &SummaryProgress) -> StoreResult<()>;

    /// Writes the answers of one graded attempt, then its progress record.
    ///
    /// Best effort: if the second write fails the first stays committed.
    /// Stores with transactions should override this.
    async fn save_attempt(
        &self,
        answers: &[AnswerRecord],
        progress: &ActivityProgress,
    ) -> StoreResult<()> {
        self.upsert_answers(answers).await?;
        self.upsert_activity_progress(progress).await
    }
}
