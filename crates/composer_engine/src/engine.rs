use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use composer_logging::{composer_debug, composer_info, composer_warn};

use crate::api::{ApiSettings, CreateCommentRequest, CreatePostRequest, PostApi, ReqwestPostApi};
use crate::storage::{object_name, ChannelProgressSink, HttpObjectStore, ObjectStore, StorageSettings};
use crate::{EngineEvent, SubmissionId, TimerId, UploadFile, UploadId};

pub struct EngineConfig {
    pub storage: StorageSettings,
    pub api: ApiSettings,
    /// Milliseconds since the epoch; prefixes object names.
    pub now_millis: Arc<dyn Fn() -> i64 + Send + Sync>,
}

impl EngineConfig {
    pub fn new(storage: StorageSettings, api: ApiSettings) -> Self {
        Self {
            storage,
            api,
            now_millis: Arc::new(|| chrono::Utc::now().timestamp_millis()),
        }
    }
}

enum EngineCommand {
    Upload {
        upload_id: UploadId,
        file: UploadFile,
    },
    Submit {
        submission_id: SubmissionId,
        request: CreatePostRequest,
    },
    SubmitComment {
        submission_id: SubmissionId,
        request: CreateCommentRequest,
    },
    Schedule {
        timer_id: TimerId,
        after: Duration,
    },
}

impl EngineCommand {
    fn label(&self) -> &'static str {
        match self {
            EngineCommand::Upload { .. } => "upload",
            EngineCommand::Submit { .. } => "submit",
            EngineCommand::SubmitComment { .. } => "comment",
            EngineCommand::Schedule { .. } => "timer",
        }
    }
}

struct Services {
    store: Arc<dyn ObjectStore>,
    api: Arc<dyn PostApi>,
    now_millis: Arc<dyn Fn() -> i64 + Send + Sync>,
}

/// Runs IO on a background tokio runtime. Every outcome comes back as an
/// `EngineEvent`. The command methods return `false` once the engine thread
/// is gone and the command was dropped.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> io::Result<Self> {
        let store = Arc::new(HttpObjectStore::new(config.storage));
        let api = Arc::new(ReqwestPostApi::new(config.api));
        Self::with_services(store, api, config.now_millis)
    }

    /// Builds a handle over arbitrary store/API implementations.
    pub fn with_services(
        store: Arc<dyn ObjectStore>,
        api: Arc<dyn PostApi>,
        now_millis: Arc<dyn Fn() -> i64 + Send + Sync>,
    ) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let services = Arc::new(Services {
            store,
            api,
            now_millis,
        });

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let services = services.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(&services, command, event_tx).await;
                });
            }
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn upload(&self, upload_id: UploadId, file: UploadFile) -> bool {
        self.send(EngineCommand::Upload { upload_id, file })
    }

    pub fn submit(&self, submission_id: SubmissionId, request: CreatePostRequest) -> bool {
        self.send(EngineCommand::Submit {
            submission_id,
            request,
        })
    }

    pub fn submit_comment(
        &self,
        submission_id: SubmissionId,
        request: CreateCommentRequest,
    ) -> bool {
        self.send(EngineCommand::SubmitComment {
            submission_id,
            request,
        })
    }

    pub fn schedule(&self, timer_id: TimerId, after: Duration) -> bool {
        self.send(EngineCommand::Schedule { timer_id, after })
    }

    fn send(&self, command: EngineCommand) -> bool {
        let label = command.label();
        match self.cmd_tx.send(command) {
            Ok(()) => true,
            Err(_) => {
                composer_warn!("Engine stopped; dropping {} command", label);
                false
            }
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    services: &Services,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Upload { upload_id, file } => {
            let name = object_name((services.now_millis)(), &file.name);
            composer_info!("Upload {} as {} ({} bytes)", upload_id, name, file.data.len());
            let sink = Arc::new(ChannelProgressSink::new(event_tx.clone()));
            let result = services.store.upload(upload_id, &name, file, sink).await;
            if let Err(err) = &result {
                composer_warn!("Upload {} failed: {}", upload_id, err);
            }
            emit(&event_tx, EngineEvent::UploadCompleted { upload_id, result });
        }
        EngineCommand::Submit {
            submission_id,
            request,
        } => {
            let result = services.api.create_post(&request).await;
            match &result {
                Ok(post) => {
                    composer_info!("Submission {} created post id={}", submission_id, post.id)
                }
                Err(err) => composer_warn!("Submission {} failed: {:?}", submission_id, err),
            }
            emit(
                &event_tx,
                EngineEvent::SubmitCompleted {
                    submission_id,
                    result,
                },
            );
        }
        EngineCommand::SubmitComment {
            submission_id,
            request,
        } => {
            let result = services.api.create_comment(&request).await;
            match &result {
                Ok(comment) => composer_info!("Comment created id={}", comment.id),
                Err(err) => composer_warn!("Comment {} failed: {:?}", submission_id, err),
            }
            emit(
                &event_tx,
                EngineEvent::CommentCompleted {
                    submission_id,
                    result,
                },
            );
        }
        EngineCommand::Schedule { timer_id, after } => {
            tokio::time::sleep(after).await;
            emit(&event_tx, EngineEvent::TimerElapsed { timer_id });
        }
    }
}

/// The handle owns the receiver; a failed send means it was dropped.
fn emit(event_tx: &mpsc::Sender<EngineEvent>, event: EngineEvent) {
    if let Err(mpsc::SendError(event)) = event_tx.send(event) {
        composer_debug!("Engine handle dropped; discarding {:?}", event);
    }
}
