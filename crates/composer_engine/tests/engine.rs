use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use composer_engine::{
    CreateCommentRequest, CreatePostRequest, CreatedCommentResponse, CreatedPostResponse,
    EngineEvent, EngineHandle, ObjectStore, PostApi, ProgressSink, SubmitError,
    SubmitFailureKind, UploadError, UploadFile, UploadId, UploadProgress,
};

struct FakeStore {
    names: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl ObjectStore for FakeStore {
    async fn upload(
        &self,
        upload_id: UploadId,
        object_name: &str,
        _file: UploadFile,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<String, UploadError> {
        self.names.lock().unwrap().push(object_name.to_string());
        for percent in [0, 50, 100] {
            sink.emit(EngineEvent::Progress(UploadProgress { upload_id, percent }));
        }
        Ok(format!("https://cdn.example/{object_name}"))
    }
}

struct FakeApi;

#[async_trait::async_trait]
impl PostApi for FakeApi {
    async fn create_post(
        &self,
        request: &CreatePostRequest,
    ) -> Result<CreatedPostResponse, SubmitError> {
        Ok(CreatedPostResponse {
            id: "p1".to_string(),
            slug: Some("slug".to_string()),
            title: request.title.clone(),
        })
    }

    async fn create_comment(
        &self,
        request: &CreateCommentRequest,
    ) -> Result<CreatedCommentResponse, SubmitError> {
        if request.content.is_empty() {
            return Err(SubmitError {
                kind: SubmitFailureKind::Rejected(400),
                message: "Comment is empty".to_string(),
            });
        }
        Ok(CreatedCommentResponse {
            id: "c1".to_string(),
            content: request.content.clone(),
        })
    }
}

fn handle() -> (EngineHandle, Arc<FakeStore>) {
    let store = Arc::new(FakeStore {
        names: Mutex::new(Vec::new()),
    });
    let handle = EngineHandle::with_services(store.clone(), Arc::new(FakeApi), Arc::new(|| 42_i64))
        .expect("engine");
    (handle, store)
}

fn collect_until<F>(handle: &EngineHandle, mut done: F) -> Vec<EngineEvent>
where
    F: FnMut(&EngineEvent) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        if let Some(event) = handle.recv_timeout(Duration::from_millis(50)) {
            let finished = done(&event);
            events.push(event);
            if finished {
                break;
            }
        }
    }
    events
}

#[test]
fn upload_events_arrive_in_order_with_timestamped_name() {
    let (handle, store) = handle();
    handle.upload(
        9,
        UploadFile {
            name: "cat.png".to_string(),
            content_type: None,
            data: vec![1, 2, 3],
        },
    );

    let events = collect_until(&handle, |event| {
        matches!(event, EngineEvent::UploadCompleted { .. })
    });

    assert_eq!(
        events,
        vec![
            EngineEvent::Progress(UploadProgress { upload_id: 9, percent: 0 }),
            EngineEvent::Progress(UploadProgress { upload_id: 9, percent: 50 }),
            EngineEvent::Progress(UploadProgress { upload_id: 9, percent: 100 }),
            EngineEvent::UploadCompleted {
                upload_id: 9,
                result: Ok("https://cdn.example/42cat.png".to_string()),
            },
        ]
    );
    assert_eq!(*store.names.lock().unwrap(), vec!["42cat.png".to_string()]);
}

#[test]
fn submit_result_is_reported() {
    let (handle, _) = handle();
    assert!(handle.submit(
        7,
        CreatePostRequest {
            title: "Title".to_string(),
            content: "Content".to_string(),
            category: None,
            image: None,
        }
    ));

    let events = collect_until(&handle, |_| true);
    match &events[..] {
        [EngineEvent::SubmitCompleted {
            submission_id: 7,
            result: Ok(post),
        }] => assert_eq!(post.title, "Title"),
        other => panic!("unexpected events {other:?}"),
    }
}

#[test]
fn comment_results_carry_their_submission_id() {
    let (handle, _) = handle();
    let comment = |content: &str| CreateCommentRequest {
        post_id: "p1".to_string(),
        content: content.to_string(),
        user_id: "u1".to_string(),
    };
    handle.submit_comment(3, comment("Nice post"));
    let first = collect_until(&handle, |_| true);
    handle.submit_comment(4, comment(""));
    let second = collect_until(&handle, |_| true);

    match &first[..] {
        [EngineEvent::CommentCompleted {
            submission_id: 3,
            result: Ok(created),
        }] => assert_eq!(created.content, "Nice post"),
        other => panic!("unexpected events {other:?}"),
    }
    match &second[..] {
        [EngineEvent::CommentCompleted {
            submission_id: 4,
            result: Err(err),
        }] => assert_eq!(err.message, "Comment is empty"),
        other => panic!("unexpected events {other:?}"),
    }
}

#[test]
fn timers_fire_after_their_delay() {
    let (handle, _) = handle();
    let started = Instant::now();
    handle.schedule(2, Duration::from_millis(120));
    handle.schedule(1, Duration::from_millis(20));

    let mut fired = Vec::new();
    let events = collect_until(&handle, |_| {
        fired.push(());
        fired.len() == 2
    });

    assert_eq!(
        events,
        vec![
            EngineEvent::TimerElapsed { timer_id: 1 },
            EngineEvent::TimerElapsed { timer_id: 2 },
        ]
    );
    assert!(started.elapsed() >= Duration::from_millis(120));
    assert!(handle.try_recv().is_none());
}
