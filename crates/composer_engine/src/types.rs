use std::fmt;

use crate::{CreatedCommentResponse, CreatedPostResponse, SubmitError, UploadError};

pub type UploadId = u64;
/// Echoed back on the matching completion event.
pub type SubmissionId = u64;
pub type TimerId = u64;

#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub upload_id: UploadId,
    /// Whole percent of bytes handed to the transport, 0..=100.
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(UploadProgress),
    UploadCompleted {
        upload_id: UploadId,
        /// Download URL of the stored object.
        result: Result<String, UploadError>,
    },
    SubmitCompleted {
        submission_id: SubmissionId,
        result: Result<CreatedPostResponse, SubmitError>,
    },
    CommentCompleted {
        submission_id: SubmissionId,
        result: Result<CreatedCommentResponse, SubmitError>,
    },
    TimerElapsed {
        timer_id: TimerId,
    },
}
