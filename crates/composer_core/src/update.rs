use std::time::Duration;

use composer_logging::{composer_debug, composer_info, composer_warn};

use crate::state::BannerSlot;
use crate::validate::validate_comment;
use crate::{ComposerState, Effect, FormPhase, Msg, NewComment, NewPost, TimerKind};

pub const UPLOAD_SETTLE_AFTER: Duration = Duration::from_millis(1500);
pub const UPLOAD_ERROR_DISMISS_AFTER: Duration = Duration::from_millis(4500);
pub const SUCCESS_BANNER_DISMISS_AFTER: Duration = Duration::from_millis(3000);
pub const SUBMIT_ERROR_DISMISS_AFTER: Duration = Duration::from_millis(4500);
pub const COMMENT_BANNER_DISMISS_AFTER: Duration = Duration::from_millis(1000);

/// Shown for every upload failure, whatever the store reported.
pub const UPLOAD_ERROR_MESSAGE: &str = "Image must be less than 2mb";
pub const SUCCESS_MESSAGE: &str = "Post created successfully!";
pub const COMMENT_SUCCESS_MESSAGE: &str = "Comment posted!";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: ComposerState, msg: Msg) -> (ComposerState, Vec<Effect>) {
    let effects = match msg {
        Msg::FieldChanged { field, value } => {
            state.set_field(field, value);
            Vec::new()
        }
        Msg::FieldBlurred(field) => {
            state.touch(field);
            Vec::new()
        }
        Msg::CategorySelected(category) => {
            state.set_category(category);
            Vec::new()
        }
        Msg::ImageSelected(file) => {
            // The picker is disabled while uploading; a selection that slips
            // through is dropped rather than queued.
            if state.is_uploading() {
                composer_debug!("Ignoring image {} while another upload runs", file.name);
                return (state, Vec::new());
            }
            let upload_id = state.begin_upload(file.name.clone());
            composer_info!(
                "Upload {} started name={} len={}",
                upload_id,
                file.name,
                file.data.len()
            );
            vec![Effect::UploadImage { upload_id, file }]
        }
        Msg::UploadProgress { upload_id, percent } => match state.record_progress(upload_id, percent) {
            Some(true) => vec![settle_timer(upload_id)],
            Some(false) => Vec::new(),
            None => {
                composer_debug!("Dropping progress for stale upload {}", upload_id);
                Vec::new()
            }
        },
        Msg::UploadSucceeded { upload_id, url } => match state.finish_upload(upload_id, url) {
            Some(true) => vec![settle_timer(upload_id)],
            Some(false) => Vec::new(),
            None => {
                composer_debug!("Dropping result for stale upload {}", upload_id);
                Vec::new()
            }
        },
        Msg::UploadFailed { upload_id, reason } => {
            if state.upload_mut(upload_id).is_none() {
                composer_debug!("Dropping failure for stale upload {}", upload_id);
                return (state, Vec::new());
            }
            composer_warn!("Upload {} failed: {}", upload_id, reason);
            state.reset_upload();
            let generation = state.show_banner(BannerSlot::UploadError, UPLOAD_ERROR_MESSAGE);
            vec![Effect::StartTimer {
                timer: TimerKind::UploadErrorBanner,
                generation,
                after: UPLOAD_ERROR_DISMISS_AFTER,
            }]
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::SubmitSucceeded {
            submission_id,
            post,
        } => {
            if !state.take_submission(submission_id) {
                composer_debug!("Ignoring result of stale submission {}", submission_id);
                return (state, Vec::new());
            }
            composer_info!("Post {} created by submission {}", post.id, submission_id);
            state.clear_draft();
            state.clear_banner(BannerSlot::SubmitError);
            state.clear_banner(BannerSlot::UploadError);
            state.set_phase(FormPhase::Succeeded);
            let generation = state.show_banner(BannerSlot::Success, SUCCESS_MESSAGE);
            let mut effects = vec![Effect::StartTimer {
                timer: TimerKind::SuccessBanner,
                generation,
                after: SUCCESS_BANNER_DISMISS_AFTER,
            }];
            if let Some(slug) = post.slug.filter(|slug| !slug.is_empty()) {
                effects.push(Effect::Redirect {
                    path: format!("/post/{slug}"),
                });
            }
            effects
        }
        Msg::SubmitFailed {
            submission_id,
            message,
        } => {
            if !state.take_submission(submission_id) {
                composer_debug!("Ignoring failure of stale submission {}", submission_id);
                return (state, Vec::new());
            }
            composer_warn!("Post rejected: {}", message);
            state.set_phase(FormPhase::Failed);
            let generation = state.show_banner(BannerSlot::SubmitError, message);
            vec![Effect::StartTimer {
                timer: TimerKind::SubmitErrorBanner,
                generation,
                after: SUBMIT_ERROR_DISMISS_AFTER,
            }]
        }
        Msg::CommentChanged(content) => {
            state.set_comment(content);
            Vec::new()
        }
        Msg::CommentSubmitClicked { post_id, user_id } => {
            submit_comment(&mut state, post_id, user_id)
        }
        Msg::CommentSucceeded {
            submission_id,
            comment,
        } => {
            if !state.take_comment_submission(submission_id) {
                composer_debug!("Ignoring result of stale comment {}", submission_id);
                return (state, Vec::new());
            }
            composer_info!("Comment {} created", comment.id);
            state.clear_comment();
            let generation = state.show_banner(BannerSlot::Comment, COMMENT_SUCCESS_MESSAGE);
            vec![Effect::StartTimer {
                timer: TimerKind::CommentBanner,
                generation,
                after: COMMENT_BANNER_DISMISS_AFTER,
            }]
        }
        Msg::CommentFailed {
            submission_id,
            message,
        } => {
            if !state.take_comment_submission(submission_id) {
                composer_debug!("Ignoring failure of stale comment {}", submission_id);
                return (state, Vec::new());
            }
            composer_warn!("Comment rejected: {}", message);
            state.set_comment_error(Some(message));
            Vec::new()
        }
        Msg::TimerElapsed { timer, generation } => {
            elapse(&mut state, timer, generation);
            Vec::new()
        }
        Msg::NavigatedAway => {
            state.discard();
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut ComposerState) -> Vec<Effect> {
    if state.is_uploading() {
        composer_debug!("Submit ignored while an upload is running");
        return Vec::new();
    }
    if state.phase() == FormPhase::Submitting {
        composer_debug!("Submit ignored while a submission is in flight");
        return Vec::new();
    }

    state.touch_all();
    let errors = state.field_errors();
    if !errors.is_empty() {
        composer_debug!("Submit blocked by validation: {:?}", errors);
        state.mark_dirty();
        return Vec::new();
    }

    let submission_id = state.begin_submission();
    let draft = state.draft();
    let post = NewPost {
        title: draft.title.clone(),
        content: draft.content.clone(),
        category: draft.category.wire_value().map(ToOwned::to_owned),
        image: draft.image_ref.clone(),
    };
    vec![Effect::SubmitPost {
        submission_id,
        post,
    }]
}

fn submit_comment(state: &mut ComposerState, post_id: String, user_id: String) -> Vec<Effect> {
    if state.comment_pending() {
        composer_debug!("Comment ignored while another is in flight");
        return Vec::new();
    }
    if let Some(message) = validate_comment(state.comment_content()) {
        composer_debug!("Comment blocked: {}", message);
        state.set_comment_error(Some(message));
        return Vec::new();
    }

    state.set_comment_error(None);
    let submission_id = state.begin_comment_submission();
    let comment = NewComment {
        post_id,
        content: state.comment_content().to_string(),
        user_id,
    };
    vec![Effect::SubmitComment {
        submission_id,
        comment,
    }]
}

fn elapse(state: &mut ComposerState, timer: TimerKind, generation: u64) {
    match timer {
        TimerKind::UploadSettle => state.settle_upload(generation),
        TimerKind::UploadErrorBanner => {
            state.dismiss_banner(BannerSlot::UploadError, generation);
        }
        TimerKind::SuccessBanner => {
            if state.dismiss_banner(BannerSlot::Success, generation)
                && state.phase() == FormPhase::Succeeded
            {
                state.set_phase(FormPhase::Editing);
            }
        }
        TimerKind::SubmitErrorBanner => {
            if state.dismiss_banner(BannerSlot::SubmitError, generation)
                && state.phase() == FormPhase::Failed
            {
                state.set_phase(FormPhase::Editing);
            }
        }
        TimerKind::CommentBanner => {
            state.dismiss_banner(BannerSlot::Comment, generation);
        }
    }
}

fn settle_timer(upload_id: u64) -> Effect {
    Effect::StartTimer {
        timer: TimerKind::UploadSettle,
        generation: upload_id,
        after: UPLOAD_SETTLE_AFTER,
    }
}
