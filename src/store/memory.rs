// src/store/memory.rs

use std::{
    collections::HashMap,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use super::{LearningStore, StoreResult};
use crate::{
    error::StoreError,
    models::{
        activity::{Activity, Question, QuestionRecord},
        content::{Summary, Video},
        progress::{ActivityProgress, SummaryProgress, VideoProgress},
        submission::AnswerRecord,
    },
};

#[derive(Default)]
struct Tables {
    activities: HashMap<i64, Activity>,
    questions: Vec<QuestionRecord>,
    videos: HashMap<i64, Video>,
    summaries: HashMap<i64, Summary>,
    // (activity, question, student)
    answers: HashMap<(i64, i64, i64), AnswerRecord>,
    // (student, item)
    activity_progress: HashMap<(i64, i64), ActivityProgress>,
    video_progress: HashMap<(i64, i64), VideoProgress>,
    summary_progress: HashMap<(i64, i64), SummaryProgress>,
}

/// Process-local store with the same upsert keys as the database.
///
/// Counts successful writes and can be told to fail reads or writes,
/// which is how the failure paths of the services are exercised.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    // Writes allowed before every later write fails.
    write_budget: Mutex<Option<usize>>,
}

fn sorted_by_id<T: Clone>(items: impl Iterator<Item = T>, id: impl Fn(&T) -> i64) -> Vec<T> {
    let mut items: Vec<T> = items.collect();
    items.sort_by_key(|item| id(item));
    items
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store poisoned".to_string()))
    }

    fn check_read(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        let budget = *self
            .write_budget
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store poisoned".to_string()))?;
        if budget.is_some_and(|allowed| self.write_count() >= allowed) {
            return Err(StoreError::Unavailable("write budget exhausted".to_string()));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Lets `allowed` writes in total succeed, then fails the rest.
    /// `None` lifts the limit.
    pub fn fail_writes_after(&self, allowed: Option<usize>) -> StoreResult<()> {
        *self
            .write_budget
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store poisoned".to_string()))? = allowed;
        Ok(())
    }

    /// Number of upsert calls that went through.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    // Seeding. Authored content has no write path in the services.

    pub fn insert_activity(&self, activity: Activity) -> StoreResult<()> {
        self.lock()?.activities.insert(activity.id, activity);
        Ok(())
    }

    pub fn insert_question(&self, question: QuestionRecord) -> StoreResult<()> {
        self.lock()?.questions.push(question);
        Ok(())
    }

    pub fn insert_video(&self, video: Video) -> StoreResult<()> {
        self.lock()?.videos.insert(video.id, video);
        Ok(())
    }

    pub fn insert_summary(&self, summary: Summary) -> StoreResult<()> {
        self.lock()?.summaries.insert(summary.id, summary);
        Ok(())
    }

    // Inspection.

    pub fn answer_count(&self) -> StoreResult<usize> {
        Ok(self.lock()?.answers.len())
    }

    pub fn activity_progress_count(&self) -> StoreResult<usize> {
        Ok(self.lock()?.activity_progress.len())
    }
}

#[async_trait::async_trait]
impl LearningStore for InMemoryStore {
    async fn read_activity(&self, activity_id: i64) -> StoreResult<Option<Activity>> {
        self.check_read()?;
        Ok(self.lock()?.activities.get(&activity_id).cloned())
    }

    async fn read_questions(&self, activity_id: i64) -> StoreResult<Vec<Question>> {
        self.check_read()?;
        let tables = self.lock()?;
        let records = sorted_by_id(
            tables
                .questions
                .iter()
                .filter(|q| q.activity_id == activity_id)
                .cloned(),
            |q| q.id,
        );
        Ok(records.into_iter().map(Question::from).collect())
    }

    async fn read_activities(&self, discipline_id: i64) -> StoreResult<Vec<Activity>> {
        self.check_read()?;
        let tables = self.lock()?;
        Ok(sorted_by_id(
            tables
                .activities
                .values()
                .filter(|a| a.discipline_id == discipline_id)
                .cloned(),
            |a| a.id,
        ))
    }

    async fn read_video(&self, video_id: i64) -> StoreResult<Option<Video>> {
        self.check_read()?;
        Ok(self.lock()?.videos.get(&video_id).cloned())
    }

    async fn read_videos(&self, discipline_id: i64) -> StoreResult<Vec<Video>> {
        self.check_read()?;
        let tables = self.lock()?;
        Ok(sorted_by_id(
            tables
                .videos
                .values()
                .filter(|v| v.discipline_id == discipline_id)
                .cloned(),
            |v| v.id,
        ))
    }

    async fn read_summary(&self, summary_id: i64) -> StoreResult<Option<Summary>> {
        self.check_read()?;
        Ok(self.lock()?.summaries.get(&summary_id).cloned())
    }

    async fn read_summaries(&self, discipline_id: i64) -> StoreResult<Vec<Summary>> {
        self.check_read()?;
        let tables = self.lock()?;
        Ok(sorted_by_id(
            tables
                .summaries
                .values()
                .filter(|s| s.discipline_id == discipline_id)
                .cloned(),
            |s| s.id,
        ))
    }

    async fn read_activity_progress(
        &self,
        student_id: i64,
        activity_ids: &[i64],
    ) -> StoreResult<Vec<ActivityProgress>> {
        self.check_read()?;
        let tables = self.lock()?;
        Ok(activity_ids
            .iter()
            .filter_map(|id| tables.activity_progress.get(&(student_id, *id)).cloned())
            .collect())
    }

    async fn read_video_progress(
        &self,
        student_id: i64,
        video_ids: &[i64],
    ) -> StoreResult<Vec<VideoProgress>> {
        self.check_read()?;
        let tables = self.lock()?;
        Ok(video_ids
            .iter()
            .filter_map(|id| tables.video_progress.get(&(student_id, *id)).cloned())
            .collect())
    }

    async fn read_summary_progress(
        &self,
        student_id: i64,
        summary_ids: &[i64],
    ) -> StoreResult<Vec<SummaryProgress>> {
        self.check_read()?;
        let tables = self.lock()?;
        Ok(summary_ids
            .iter()
            .filter_map(|id| tables.summary_progress.get(&(student_id, *id)).cloned())
            .collect())
    }

    async fn read_answers(
        &self,
        student_id: i64,
        activity_id: i64,
    ) -> StoreResult<Vec<AnswerRecord>> {
        self.check_read()?;
        let tables = self.lock()?;
        Ok(sorted_by_id(
            tables
                .answers
                .values()
                .filter(|a| a.student_id == student_id && a.activity_id == activity_id)
                .cloned(),
            |a| a.question_id,
        ))
    }

    async fn upsert_answers(&self, records: &[AnswerRecord]) -> StoreResult<()> {
        self.check_write()?;
        let mut tables = self.lock()?;
        for record in records {
            tables.answers.insert(
                (record.activity_id, record.question_id, record.student_id),
                record.clone(),
            );
        }
        self.record_write();
        Ok(())
    }

    async fn upsert_activity_progress(&self, record: &ActivityProgress) -> StoreResult<()> {
        self.check_write()?;
        self.lock()?
            .activity_progress
            .insert((record.student_id, record.activity_id), record.clone());
        self.record_write();
        Ok(())
    }

    async fn upsert_video_progress(&self, record: &VideoProgress) -> StoreResult<()> {
        self.check_write()?;
        self.lock()?
            .video_progress
            .insert((record.student_id, record.video_id), record.clone());
        self.record_write();
        Ok(())
    }

    async fn upsert_summary_progress(&self, record: &SummaryProgress) -> StoreResult<()> {
        self.check_write()?;
        self.lock()?
            .summary_progress
            .insert((record.student_id, record.summary_id), record.clone());
        self.record_write();
        Ok(())
    }
}
