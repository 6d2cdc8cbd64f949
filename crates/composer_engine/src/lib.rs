//! Composer engine: object-store uploads, post and comment submission and
//! timers.
mod api;
mod engine;
mod error;
mod storage;
mod types;

pub use api::{
    ApiSettings, CreateCommentRequest, CreatePostRequest, CreatedCommentResponse,
    CreatedPostResponse, PostApi, ReqwestPostApi,
};
pub use engine::{EngineConfig, EngineHandle};
pub use error::{SubmitError, SubmitFailureKind, UploadError, UploadFailureKind};
pub use storage::{
    download_url, object_name, ChannelProgressSink, HttpObjectStore, ObjectStore, ProgressSink,
    StorageSettings,
};
pub use types::{EngineEvent, SubmissionId, TimerId, UploadFile, UploadId, UploadProgress};
