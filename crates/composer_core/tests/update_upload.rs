use std::sync::Once;

use composer_core::{
    update, ComposerState, CreatedPost, Effect, Field, FormPhase, ImageFile, Msg, TimerKind,
    UploadStage, SUCCESS_MESSAGE, UPLOAD_ERROR_DISMISS_AFTER, UPLOAD_ERROR_MESSAGE,
    UPLOAD_SETTLE_AFTER,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(composer_logging::initialize_for_tests);
}

fn image(name: &str) -> ImageFile {
    ImageFile {
        name: name.to_string(),
        content_type: Some("image/png".to_string()),
        data: vec![0u8; 64],
    }
}

fn select_image(state: ComposerState, name: &str) -> (ComposerState, u64) {
    let (state, effects) = update(state, Msg::ImageSelected(image(name)));
    let upload_id = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::UploadImage { upload_id, .. } => Some(*upload_id),
            _ => None,
        })
        .expect("upload effect");
    (state, upload_id)
}

fn progress(state: ComposerState, upload_id: u64, percent: u8) -> (ComposerState, Vec<Effect>) {
    update(state, Msg::UploadProgress { upload_id, percent })
}

fn settle(state: ComposerState, upload_id: u64) -> ComposerState {
    let (state, _) = update(
        state,
        Msg::TimerElapsed {
            timer: TimerKind::UploadSettle,
            generation: upload_id,
        },
    );
    state
}

#[test]
fn selecting_an_image_starts_upload_and_disables_controls() {
    init_logging();
    let (state, effects) = update(ComposerState::new(), Msg::ImageSelected(image("cat.png")));

    assert_eq!(
        effects,
        vec![Effect::UploadImage {
            upload_id: 1,
            file: image("cat.png"),
        }]
    );
    let view = state.view();
    assert_eq!(view.selected_file.as_deref(), Some("cat.png"));
    assert!(!view.file_picker_enabled);
    assert!(!view.submit_enabled);
    assert_eq!(state.upload().unwrap().stage, UploadStage::Pending);
}

#[test]
fn new_selection_while_uploading_is_dropped() {
    init_logging();
    let (state, _) = select_image(ComposerState::new(), "cat.png");
    let (state, effects) = update(state, Msg::ImageSelected(image("dog.png")));

    assert!(effects.is_empty());
    assert_eq!(state.view().selected_file.as_deref(), Some("cat.png"));
}

#[test]
fn submit_is_gated_on_running_upload() {
    init_logging();
    let (state, _) = update(
        ComposerState::new(),
        Msg::FieldChanged {
            field: Field::Title,
            value: "A title".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::FieldChanged {
            field: Field::Content,
            value: "Some content".to_string(),
        },
    );
    let (state, upload_id) = select_image(state, "cat.png");
    let (state, effects) = update(state, Msg::SubmitClicked);
    assert!(effects.is_empty());

    let (state, _) = update(
        state,
        Msg::UploadSucceeded {
            upload_id,
            url: "https://cdn.example/cat.png".to_string(),
        },
    );
    let (_, effects) = update(state, Msg::SubmitClicked);
    match &effects[..] {
        [Effect::SubmitPost { post, .. }] => {
            assert_eq!(post.image.as_deref(), Some("https://cdn.example/cat.png"))
        }
        other => panic!("unexpected effects {other:?}"),
    }
}

#[test]
fn progress_never_moves_backwards() {
    init_logging();
    let (state, upload_id) = select_image(ComposerState::new(), "cat.png");
    let (state, _) = progress(state, upload_id, 10);
    let (state, _) = progress(state, upload_id, 60);
    let (state, effects) = progress(state, upload_id, 40);

    assert!(effects.is_empty());
    assert_eq!(state.view().upload_progress, Some(60));
    assert_eq!(state.upload().unwrap().stage, UploadStage::Uploading);
}

#[test]
fn reaching_full_progress_settles_after_delay() {
    init_logging();
    let (state, upload_id) = select_image(ComposerState::new(), "cat.png");
    let (state, _) = progress(state, upload_id, 50);
    let (state, effects) = progress(state, upload_id, 100);

    assert_eq!(
        effects,
        vec![Effect::StartTimer {
            timer: TimerKind::UploadSettle,
            generation: upload_id,
            after: UPLOAD_SETTLE_AFTER,
        }]
    );
    assert_eq!(state.view().upload_progress, Some(100));
    assert!(state.is_uploading());

    // A repeated 100 does not schedule a second timer.
    let (state, effects) = progress(state, upload_id, 100);
    assert!(effects.is_empty());

    let state = settle(state, upload_id);
    let view = state.view();
    assert!(!state.is_uploading());
    assert_eq!(view.upload_progress, None);
    assert!(view.file_picker_enabled);
    assert!(view.submit_enabled);
}

#[test]
fn url_after_settle_destroys_job_and_keeps_reference() {
    init_logging();
    let (state, upload_id) = select_image(ComposerState::new(), "cat.png");
    let (state, _) = progress(state, upload_id, 100);
    let state = settle(state, upload_id);
    assert!(state.upload().is_some());

    let (state, effects) = update(
        state,
        Msg::UploadSucceeded {
            upload_id,
            url: "https://cdn.example/cat.png".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert!(state.upload().is_none());
    assert_eq!(
        state.view().image_url.as_deref(),
        Some("https://cdn.example/cat.png")
    );
    assert_eq!(state.view().selected_file.as_deref(), Some("cat.png"));
}

#[test]
fn url_without_full_progress_schedules_settle() {
    init_logging();
    let (state, upload_id) = select_image(ComposerState::new(), "tiny.png");
    let (state, effects) = update(
        state,
        Msg::UploadSucceeded {
            upload_id,
            url: "https://cdn.example/tiny.png".to_string(),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::StartTimer {
            timer: TimerKind::UploadSettle,
            generation: upload_id,
            after: UPLOAD_SETTLE_AFTER,
        }]
    );
    assert!(!state.is_uploading());
    assert_eq!(state.upload().unwrap().stage, UploadStage::Succeeded);

    let state = settle(state, upload_id);
    assert!(state.upload().is_none());
}

#[test]
fn failure_resets_upload_state_and_shows_fixed_message() {
    init_logging();
    let (state, upload_id) = select_image(ComposerState::new(), "huge.png");
    let (state, _) = progress(state, upload_id, 30);
    let (state, effects) = update(
        state,
        Msg::UploadFailed {
            upload_id,
            reason: "http status 413".to_string(),
        },
    );

    let view = state.view();
    assert_eq!(view.selected_file, None);
    assert_eq!(view.image_url, None);
    assert_eq!(view.upload_progress, None);
    assert!(!state.is_uploading());
    assert!(view.file_picker_enabled);
    assert_eq!(view.upload_error.as_deref(), Some(UPLOAD_ERROR_MESSAGE));

    let generation = match &effects[..] {
        [Effect::StartTimer {
            timer: TimerKind::UploadErrorBanner,
            generation,
            after,
        }] => {
            assert_eq!(*after, UPLOAD_ERROR_DISMISS_AFTER);
            *generation
        }
        other => panic!("unexpected effects {other:?}"),
    };

    let (state, _) = update(
        state,
        Msg::TimerElapsed {
            timer: TimerKind::UploadErrorBanner,
            generation,
        },
    );
    assert_eq!(state.view().upload_error, None);
}

#[test]
fn events_for_a_replaced_upload_are_ignored() {
    init_logging();
    let (state, first) = select_image(ComposerState::new(), "cat.png");
    let (state, _) = update(
        state,
        Msg::UploadFailed {
            upload_id: first,
            reason: "network".to_string(),
        },
    );
    let (state, second) = select_image(state, "dog.png");
    assert_ne!(first, second);

    let (mut state, effects) = progress(state, first, 100);
    assert!(effects.is_empty());
    assert_eq!(state.view().upload_progress, None);
    state.consume_dirty();

    let (mut state, _) = update(
        state,
        Msg::UploadSucceeded {
            upload_id: first,
            url: "https://cdn.example/cat.png".to_string(),
        },
    );
    assert_eq!(state.view().image_url, None);
    assert!(!state.consume_dirty());
}

#[test]
fn successful_resubmit_clears_every_banner_and_all_upload_state() {
    init_logging();
    let (state, _) = update(
        ComposerState::new(),
        Msg::FieldChanged {
            field: Field::Title,
            value: "Cats".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::FieldChanged {
            field: Field::Content,
            value: "All about cats".to_string(),
        },
    );

    let (state, first) = select_image(state, "cat.png");
    let (state, _) = progress(state, first, 100);
    let (state, _) = update(
        state,
        Msg::UploadSucceeded {
            upload_id: first,
            url: "https://cdn.example/cat.png".to_string(),
        },
    );
    let state = settle(state, first);
    assert_eq!(
        state.draft().image_ref.as_deref(),
        Some("https://cdn.example/cat.png")
    );

    let (state, second) = select_image(state, "huge.png");
    let (state, _) = update(
        state,
        Msg::UploadFailed {
            upload_id: second,
            reason: "http status 413".to_string(),
        },
    );
    assert_eq!(state.view().upload_error.as_deref(), Some(UPLOAD_ERROR_MESSAGE));

    let submit = |state: ComposerState| {
        let (state, effects) = update(state, Msg::SubmitClicked);
        match &effects[..] {
            [Effect::SubmitPost { submission_id, .. }] => (state, *submission_id),
            other => panic!("unexpected effects {other:?}"),
        }
    };

    let (state, submission_id) = submit(state);
    let (state, _) = update(
        state,
        Msg::SubmitFailed {
            submission_id,
            message: "Server error".to_string(),
        },
    );
    assert_eq!(state.view().error_banner.as_deref(), Some("Server error"));

    let (state, submission_id) = submit(state);
    let (state, _) = update(
        state,
        Msg::SubmitSucceeded {
            submission_id,
            post: CreatedPost {
                id: "p9".to_string(),
                slug: None,
                title: "Cats".to_string(),
            },
        },
    );

    let view = state.view();
    assert_eq!(state.phase(), FormPhase::Succeeded);
    assert_eq!(view.success_banner.as_deref(), Some(SUCCESS_MESSAGE));
    assert_eq!(view.image_url, None);
    assert_eq!(view.selected_file, None);
    assert_eq!(view.upload_progress, None);
    assert!(state.upload().is_none());
    assert_eq!(view.error_banner, None);
    assert_eq!(view.upload_error, None);
    assert_eq!(view.title, "");
}
