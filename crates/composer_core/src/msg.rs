use crate::{
    Category, CreatedComment, CreatedPost, Field, ImageFile, SubmissionId, TimerKind, UploadId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited a text field.
    FieldChanged { field: Field, value: String },
    /// A text field lost focus.
    FieldBlurred(Field),
    /// User picked a category.
    CategorySelected(Category),
    /// User picked an image in the file picker.
    ImageSelected(ImageFile),
    /// Engine progress for an upload, as a whole percentage.
    UploadProgress { upload_id: UploadId, percent: u8 },
    /// Engine resolved the download URL of a finished upload.
    UploadSucceeded { upload_id: UploadId, url: String },
    /// Engine gave up on an upload. `reason` is logged, never shown.
    UploadFailed { upload_id: UploadId, reason: String },
    /// User pressed "Create Post".
    SubmitClicked,
    /// Backend answered 201.
    SubmitSucceeded {
        submission_id: SubmissionId,
        post: CreatedPost,
    },
    /// Backend rejected the post or could not be reached.
    SubmitFailed {
        submission_id: SubmissionId,
        message: String,
    },
    /// User edited the comment box.
    CommentChanged(String),
    /// User pressed "Post Comment" on `post_id` while signed in as `user_id`.
    CommentSubmitClicked { post_id: String, user_id: String },
    /// Backend answered 201 for a comment.
    CommentSucceeded {
        submission_id: SubmissionId,
        comment: CreatedComment,
    },
    CommentFailed {
        submission_id: SubmissionId,
        message: String,
    },
    /// A timer started through `Effect::StartTimer` fired.
    TimerElapsed { timer: TimerKind, generation: u64 },
    /// User left the page; the draft is discarded.
    NavigatedAway,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
