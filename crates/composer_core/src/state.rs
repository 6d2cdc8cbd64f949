use std::fmt;

use crate::validate::{validate_field, FieldError, COMMENT_MAX_CHARS};
use crate::view_model::ComposerViewModel;

pub type UploadId = u64;
/// Tags one post or comment submission so late answers for an abandoned
/// one are recognised.
pub type SubmissionId = u64;

/// Free-text fields of the draft that carry validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    Unselected,
    Javascript,
    ReactJs,
    NextJs,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Unselected,
        Category::Javascript,
        Category::ReactJs,
        Category::NextJs,
    ];

    /// Value sent to the backend; `None` when nothing was picked.
    pub fn wire_value(self) -> Option<&'static str> {
        match self {
            Category::Unselected => None,
            Category::Javascript => Some("javascript"),
            Category::ReactJs => Some("reactjs"),
            Category::NextJs => Some("nextjs"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Unselected => "Select Category",
            Category::Javascript => "Javascript",
            Category::ReactJs => "React.js",
            Category::NextJs => "Next.js",
        }
    }

    /// Parses a wire value. `"unselected"` and the empty string map to `Unselected`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "unselected" => Some(Category::Unselected),
            "javascript" => Some(Category::Javascript),
            "reactjs" | "react" => Some(Category::ReactJs),
            "nextjs" | "next" => Some(Category::NextJs),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A file picked by the user, held in memory until the engine streams it.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Draft {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub image_ref: Option<String>,
}

impl Draft {
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Content => &self.content,
        }
    }
}

/// Body of `POST /api/post/create` as the core sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub image: Option<String>,
}

/// The part of the backend's 201 response the composer cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPost {
    pub id: String,
    pub slug: Option<String>,
    pub title: String,
}

/// Body of `POST /api/comment/create` as the core sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: String,
    pub content: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedComment {
    pub id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct CommentBox {
    content: String,
    /// Inline error; stays until the next attempt.
    error: Option<String>,
    pending: Option<SubmissionId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    /// Effect emitted, no progress reported yet.
    Pending,
    Uploading,
    /// Bytes transferred. The job lingers until both the settle delay
    /// elapsed and the download URL arrived.
    Succeeded,
}

/// A failed upload is not stored: failure destroys the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadJob {
    pub id: UploadId,
    pub file_name: String,
    pub progress: Option<u8>,
    pub stage: UploadStage,
    pub(crate) settle_scheduled: bool,
    pub(crate) settled: bool,
    pub(crate) url_received: bool,
}

impl UploadJob {
    pub fn is_uploading(&self) -> bool {
        matches!(self.stage, UploadStage::Pending | UploadStage::Uploading)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Editing,
    Submitting,
    /// Success banner visible.
    Succeeded,
    /// Error banner visible; draft kept for retry.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Banner {
    pub(crate) message: String,
    pub(crate) generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Touched {
    title: bool,
    content: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComposerState {
    draft: Draft,
    touched: Touched,
    selected_file: Option<String>,
    upload: Option<UploadJob>,
    next_upload_id: UploadId,
    phase: FormPhase,
    pending_submission: Option<SubmissionId>,
    next_submission_id: SubmissionId,
    comment: CommentBox,
    success_banner: Option<Banner>,
    submit_error: Option<Banner>,
    upload_error: Option<Banner>,
    comment_banner: Option<Banner>,
    next_generation: u64,
    dirty: bool,
}

impl ComposerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> ComposerViewModel {
        let uploading = self.is_uploading();
        ComposerViewModel {
            title: self.draft.title.clone(),
            content: self.draft.content.clone(),
            category: self.draft.category,
            title_error: self.visible_error(Field::Title),
            content_error: self.visible_error(Field::Content),
            selected_file: self.selected_file.clone(),
            image_url: self.draft.image_ref.clone(),
            upload_progress: self.upload.as_ref().and_then(|job| job.progress),
            file_picker_enabled: !uploading,
            submit_enabled: !uploading && self.phase != FormPhase::Submitting,
            phase: self.phase,
            success_banner: self.success_banner.as_ref().map(|b| b.message.clone()),
            error_banner: self.submit_error.as_ref().map(|b| b.message.clone()),
            upload_error: self.upload_error.as_ref().map(|b| b.message.clone()),
            comment: self.comment.content.clone(),
            comment_chars_remaining: COMMENT_MAX_CHARS
                .saturating_sub(self.comment.content.chars().count()),
            comment_error: self.comment.error.clone(),
            comment_banner: self.comment_banner.as_ref().map(|b| b.message.clone()),
            comment_submit_enabled: self.comment.pending.is_none(),
            dirty: self.dirty,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn upload(&self) -> Option<&UploadJob> {
        self.upload.as_ref()
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn is_uploading(&self) -> bool {
        self.upload.as_ref().is_some_and(UploadJob::is_uploading)
    }

    /// Returns whether a render is needed and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn visible_error(&self, field: Field) -> Option<String> {
        if !self.is_touched(field) {
            return None;
        }
        validate_field(field, self.draft.value(field)).map(|err| err.message(field))
    }

    pub(crate) fn field_errors(&self) -> Vec<(Field, FieldError)> {
        [Field::Title, Field::Content]
            .into_iter()
            .filter_map(|field| validate_field(field, self.draft.value(field)).map(|e| (field, e)))
            .collect()
    }

    fn is_touched(&self, field: Field) -> bool {
        match field {
            Field::Title => self.touched.title,
            Field::Content => self.touched.content,
        }
    }

    pub(crate) fn touch(&mut self, field: Field) {
        let slot = match field {
            Field::Title => &mut self.touched.title,
            Field::Content => &mut self.touched.content,
        };
        if !*slot {
            *slot = true;
            self.dirty = true;
        }
    }

    pub(crate) fn touch_all(&mut self) {
        self.touch(Field::Title);
        self.touch(Field::Content);
    }

    /// Returns `false` when the value was already current.
    pub(crate) fn set_field(&mut self, field: Field, value: String) -> bool {
        let slot = match field {
            Field::Title => &mut self.draft.title,
            Field::Content => &mut self.draft.content,
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        self.dirty = true;
        true
    }

    pub(crate) fn set_category(&mut self, category: Category) {
        if self.draft.category != category {
            self.draft.category = category;
            self.dirty = true;
        }
    }

    /// Starts a new upload job for `file_name` and returns its id.
    pub(crate) fn begin_upload(&mut self, file_name: String) -> UploadId {
        self.next_upload_id += 1;
        let id = self.next_upload_id;
        self.selected_file = Some(file_name.clone());
        self.upload = Some(UploadJob {
            id,
            file_name,
            progress: None,
            stage: UploadStage::Pending,
            settle_scheduled: false,
            settled: false,
            url_received: false,
        });
        self.upload_error = None;
        self.dirty = true;
        id
    }

    /// The active job, if `upload_id` still refers to it.
    pub(crate) fn upload_mut(&mut self, upload_id: UploadId) -> Option<&mut UploadJob> {
        self.upload.as_mut().filter(|job| job.id == upload_id)
    }

    /// Records a progress report. Progress never moves backwards. Returns
    /// `None` for a stale job, otherwise whether the settle timer should
    /// start now.
    pub(crate) fn record_progress(&mut self, upload_id: UploadId, percent: u8) -> Option<bool> {
        let job = self.upload_mut(upload_id)?;
        if job.settled || job.url_received {
            return Some(false);
        }
        let percent = percent.min(100).max(job.progress.unwrap_or(0));
        job.progress = Some(percent);
        job.stage = UploadStage::Uploading;
        let start_settle = percent == 100 && !job.settle_scheduled;
        if start_settle {
            job.settle_scheduled = true;
        }
        self.dirty = true;
        Some(start_settle)
    }

    /// Stores the download URL. Returns `None` for a stale job, otherwise
    /// whether the caller still has to schedule the settle timer.
    pub(crate) fn finish_upload(&mut self, upload_id: UploadId, url: String) -> Option<bool> {
        let job = self.upload_mut(upload_id)?;
        job.url_received = true;
        job.stage = UploadStage::Succeeded;
        job.progress = None;
        let settled = job.settled;
        let needs_settle = !job.settle_scheduled;
        job.settle_scheduled = true;
        if settled {
            self.upload = None;
        }
        self.draft.image_ref = Some(url);
        self.upload_error = None;
        self.dirty = true;
        Some(needs_settle && !settled)
    }

    /// Clears the progress bar and the uploading flag. A job whose URL
    /// already arrived is destroyed.
    pub(crate) fn settle_upload(&mut self, upload_id: UploadId) {
        let Some(job) = self.upload_mut(upload_id) else {
            return;
        };
        job.progress = None;
        job.settled = true;
        if job.url_received {
            self.upload = None;
        } else {
            job.stage = UploadStage::Succeeded;
        }
        self.dirty = true;
    }

    /// Resets every piece of upload state: file, job, progress and URL.
    pub(crate) fn reset_upload(&mut self) {
        self.selected_file = None;
        self.upload = None;
        self.draft.image_ref = None;
        self.dirty = true;
    }

    pub(crate) fn set_phase(&mut self, phase: FormPhase) {
        if self.phase != phase {
            self.phase = phase;
            self.dirty = true;
        }
    }

    /// Clears the draft, its touched markers and all upload state.
    pub(crate) fn clear_draft(&mut self) {
        self.draft = Draft::default();
        self.touched = Touched::default();
        self.reset_upload();
    }

    /// Drops the draft, the comment box and any upload or submission in
    /// flight. Banners and id counters survive so late engine results and
    /// timers are recognised as stale.
    pub(crate) fn discard(&mut self) {
        self.clear_draft();
        self.comment = CommentBox::default();
        self.pending_submission = None;
        self.phase = FormPhase::Editing;
    }

    /// Enters `Submitting` under a fresh submission id.
    pub(crate) fn begin_submission(&mut self) -> SubmissionId {
        let id = self.issue_submission_id();
        self.pending_submission = Some(id);
        self.set_phase(FormPhase::Submitting);
        id
    }

    /// Clears the pending submission if `submission_id` is the current one.
    pub(crate) fn take_submission(&mut self, submission_id: SubmissionId) -> bool {
        if self.pending_submission == Some(submission_id) {
            self.pending_submission = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn comment_content(&self) -> &str {
        &self.comment.content
    }

    pub(crate) fn comment_pending(&self) -> bool {
        self.comment.pending.is_some()
    }

    pub(crate) fn set_comment(&mut self, value: String) {
        if self.comment.content != value {
            self.comment.content = value;
            self.dirty = true;
        }
    }

    pub(crate) fn set_comment_error(&mut self, error: Option<String>) {
        if self.comment.error != error {
            self.comment.error = error;
            self.dirty = true;
        }
    }

    pub(crate) fn begin_comment_submission(&mut self) -> SubmissionId {
        let id = self.issue_submission_id();
        self.comment.pending = Some(id);
        self.dirty = true;
        id
    }

    pub(crate) fn take_comment_submission(&mut self, submission_id: SubmissionId) -> bool {
        if self.comment.pending == Some(submission_id) {
            self.comment.pending = None;
            self.dirty = true;
            true
        } else {
            false
        }
    }

    pub(crate) fn clear_comment(&mut self) {
        self.comment.content.clear();
        self.comment.error = None;
        self.dirty = true;
    }

    fn issue_submission_id(&mut self) -> SubmissionId {
        self.next_submission_id += 1;
        self.next_submission_id
    }

    pub(crate) fn show_banner(&mut self, kind: BannerSlot, message: impl Into<String>) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        *self.banner_slot(kind) = Some(Banner {
            message: message.into(),
            generation,
        });
        self.dirty = true;
        generation
    }

    /// Hides the banner if it is still the one `generation` was issued for.
    pub(crate) fn dismiss_banner(&mut self, kind: BannerSlot, generation: u64) -> bool {
        let slot = self.banner_slot(kind);
        if slot.as_ref().is_some_and(|b| b.generation == generation) {
            *slot = None;
            self.dirty = true;
            true
        } else {
            false
        }
    }

    pub(crate) fn clear_banner(&mut self, kind: BannerSlot) {
        let slot = self.banner_slot(kind);
        if slot.take().is_some() {
            self.dirty = true;
        }
    }

    fn banner_slot(&mut self, kind: BannerSlot) -> &mut Option<Banner> {
        match kind {
            BannerSlot::Success => &mut self.success_banner,
            BannerSlot::SubmitError => &mut self.submit_error,
            BannerSlot::UploadError => &mut self.upload_error,
            BannerSlot::Comment => &mut self.comment_banner,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BannerSlot {
    Success,
    SubmitError,
    UploadError,
    Comment,
}
