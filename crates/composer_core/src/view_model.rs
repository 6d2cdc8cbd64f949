use crate::{Category, FormPhase};

/// Everything a renderer needs; inline errors are already filtered by
/// touched state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComposerViewModel {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub title_error: Option<String>,
    pub content_error: Option<String>,
    pub selected_file: Option<String>,
    pub image_url: Option<String>,
    pub upload_progress: Option<u8>,
    pub file_picker_enabled: bool,
    pub submit_enabled: bool,
    pub phase: FormPhase,
    pub success_banner: Option<String>,
    pub error_banner: Option<String>,
    pub upload_error: Option<String>,
    pub comment: String,
    pub comment_chars_remaining: usize,
    pub comment_error: Option<String>,
    pub comment_banner: Option<String>,
    pub comment_submit_enabled: bool,
    pub dirty: bool,
}
