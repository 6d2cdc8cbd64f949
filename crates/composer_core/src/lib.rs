//! Composer core: pure state machine, validation and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod validate;
mod view_model;

pub use effect::{Effect, TimerKind};
pub use msg::Msg;
pub use state::{
    Category, ComposerState, CreatedComment, CreatedPost, Draft, Field, FormPhase, ImageFile,
    NewComment, NewPost, SubmissionId, UploadId, UploadJob, UploadStage,
};
pub use update::{
    update, COMMENT_BANNER_DISMISS_AFTER, COMMENT_SUCCESS_MESSAGE, SUBMIT_ERROR_DISMISS_AFTER,
    SUCCESS_BANNER_DISMISS_AFTER, SUCCESS_MESSAGE, UPLOAD_ERROR_DISMISS_AFTER,
    UPLOAD_ERROR_MESSAGE, UPLOAD_SETTLE_AFTER,
};
pub use validate::{validate_comment, validate_field, FieldError, LengthRule, COMMENT_MAX_CHARS};
pub use view_model::ComposerViewModel;
