use std::time::Duration;

use crate::{ImageFile, NewComment, NewPost, SubmissionId, UploadId};

/// IO requested by `update`; executed by the app/engine, never by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Stream the file to object storage and report back with
    /// `Msg::UploadProgress`, then `Msg::UploadSucceeded` or `Msg::UploadFailed`.
    UploadImage { upload_id: UploadId, file: ImageFile },
    /// Send the post to the backend and report back with
    /// `Msg::SubmitSucceeded` or `Msg::SubmitFailed` carrying the same id.
    SubmitPost {
        submission_id: SubmissionId,
        post: NewPost,
    },
    /// Send a comment; answered with `Msg::CommentSucceeded` or
    /// `Msg::CommentFailed` carrying the same id.
    SubmitComment {
        submission_id: SubmissionId,
        comment: NewComment,
    },
    /// Fire-and-forget timer; answered with `Msg::TimerElapsed`.
    StartTimer {
        timer: TimerKind,
        generation: u64,
        after: Duration,
    },
    /// Navigate to the created post.
    Redirect { path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Clears the progress bar once an upload reached 100%.
    UploadSettle,
    UploadErrorBanner,
    SuccessBanner,
    SubmitErrorBanner,
    CommentBanner,
}
