use composer_core::{ComposerViewModel, FormPhase};

const BAR_WIDTH: usize = 20;

/// Renders the form as plain text lines, one control per line.
pub fn render(view: &ComposerViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(message) = &view.error_banner {
        lines.push(format!("[error] {message}"));
    }
    if let Some(message) = &view.success_banner {
        lines.push(format!("[ok] {message}"));
    }

    if let Some(error) = &view.title_error {
        lines.push(format!("  ! {error}"));
    }
    lines.push(format!("Title:    {}", view.title));
    lines.push(format!("Category: {}", view.category));

    let picker = match (&view.selected_file, view.file_picker_enabled) {
        (Some(name), true) => name.clone(),
        (Some(name), false) => format!("{name} (uploading)"),
        (None, _) => "no file selected".to_string(),
    };
    lines.push(format!("Image:    {picker}"));
    if let Some(percent) = view.upload_progress {
        lines.push(format!("          {}", progress_bar(percent)));
    }
    match (&view.upload_error, &view.image_url) {
        (Some(message), _) => lines.push(format!("[error] {message}")),
        (None, Some(url)) => lines.push(format!("          {url}")),
        (None, None) => {}
    }

    if let Some(error) = &view.content_error {
        lines.push(format!("  ! {error}"));
    }
    lines.push(format!("Content:  {}", summarize(&view.content)));

    let button = match (view.phase, view.submit_enabled) {
        (FormPhase::Submitting, _) => "[Create Post: submitting...]",
        (_, true) => "[Create Post]",
        (_, false) => "[Create Post: disabled]",
    };
    lines.push(button.to_string());
    render_comment(view, &mut lines);
    lines
}

/// The comment box only shows once it has something to say.
fn render_comment(view: &ComposerViewModel, lines: &mut Vec<String>) {
    let idle = view.comment.is_empty()
        && view.comment_error.is_none()
        && view.comment_banner.is_none()
        && view.comment_submit_enabled;
    if idle {
        return;
    }

    lines.push(format!("Comment:  {}", summarize(&view.comment)));
    lines.push(format!(
        "          {} characters remaining",
        view.comment_chars_remaining
    ));
    if let Some(error) = &view.comment_error {
        lines.push(format!("[error] {error}"));
    }
    if let Some(message) = &view.comment_banner {
        lines.push(format!("[ok] {message}"));
    }
    let button = if view.comment_submit_enabled {
        "[Post Comment]"
    } else {
        "[Post Comment: sending...]"
    };
    lines.push(button.to_string());
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {percent}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}

fn summarize(content: &str) -> String {
    let chars = content.chars().count();
    let first_line = content.lines().next().unwrap_or_default();
    let preview: String = first_line.chars().take(40).collect();
    if preview.chars().count() < chars {
        format!("{preview}... ({chars} chars)")
    } else {
        preview
    }
}
