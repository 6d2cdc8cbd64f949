use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use composer_core::{
    update, Category, ComposerState, Effect, Field, FormPhase, ImageFile, Msg,
};
use composer_engine::EngineHandle;
use composer_logging::{composer_debug, composer_info};

use super::config::{self, DEFAULT_CONFIG_FILENAME};
use super::effects::EffectRunner;
use super::logging::{self, LogDestination};
use super::ui;

/// Engine poll interval; also the render tick.
const TICK: Duration = Duration::from_millis(75);

#[derive(Debug, Parser)]
#[command(name = "post-composer")]
#[command(about = "Compose a blog post, upload its image and submit it")]
pub struct Cli {
    /// RON config file with API and storage settings.
    #[arg(long, default_value = DEFAULT_CONFIG_FILENAME)]
    pub config: PathBuf,

    /// Write a default config file and exit.
    #[arg(long)]
    pub init_config: bool,

    #[arg(long, default_value = "")]
    pub title: String,

    #[arg(long, default_value = "")]
    pub content: String,

    /// javascript, reactjs or nextjs.
    #[arg(long, value_parser = parse_category, default_value = "unselected")]
    pub category: Category,

    /// Image to upload before submitting.
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Post a comment on this post id instead of creating a post.
    #[arg(long, value_name = "POST_ID", requires_all = ["comment", "user_id"])]
    pub comment_on: Option<String>,

    /// Comment text, at most 369 characters.
    #[arg(long)]
    pub comment: Option<String>,

    /// Id of the signed-in user the comment is posted as.
    #[arg(long)]
    pub user_id: Option<String>,

    #[arg(long, value_enum, default_value_t = LogDestination::File)]
    pub log: LogDestination,
}

fn parse_category(raw: &str) -> Result<Category, String> {
    Category::parse(raw).ok_or_else(|| {
        let known: Vec<_> = Category::ALL
            .iter()
            .filter_map(|category| category.wire_value())
            .collect();
        format!("unknown category {raw:?}; expected one of {}", known.join(", "))
    })
}

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    logging::initialize(cli.log);

    if cli.init_config {
        return config::write_default(&cli.config);
    }

    let config = config::load(&cli.config)?;
    if cli.image.is_some() && config.bucket.is_empty() {
        bail!("no storage bucket configured in {}", cli.config.display());
    }
    let engine = EngineHandle::new(config.engine_config()).context("starting engine")?;
    let mut session = Session::new(EffectRunner::new(engine));

    if let Some(post_id) = cli.comment_on {
        let content = cli.comment.unwrap_or_default();
        let user_id = cli.user_id.unwrap_or_default();
        return session.run_comment(post_id, content, user_id);
    }

    session.dispatch(Msg::FieldChanged {
        field: Field::Title,
        value: cli.title,
    })?;
    session.dispatch(Msg::FieldBlurred(Field::Title))?;
    session.dispatch(Msg::CategorySelected(cli.category))?;
    session.dispatch(Msg::FieldChanged {
        field: Field::Content,
        value: cli.content,
    })?;
    session.dispatch(Msg::FieldBlurred(Field::Content))?;

    if let Some(path) = &cli.image {
        let file = read_image(path)?;
        session.dispatch(Msg::ImageSelected(file))?;
    }

    session.run_to_completion(cli.image.is_some())
}

fn read_image(path: &Path) -> anyhow::Result<ImageFile> {
    let data = fs::read(path).with_context(|| format!("reading image {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    Ok(ImageFile {
        content_type: guess_content_type(path).map(ToOwned::to_owned),
        name,
        data,
    })
}

fn guess_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "avif" => Some("image/avif"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Where the scripted session is in its walk through the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    AwaitingUpload,
    AwaitingResult,
    AwaitingDismiss { succeeded: bool },
}

struct Session {
    state: ComposerState,
    runner: EffectRunner,
    last_error: Option<String>,
}

impl Session {
    fn new(runner: EffectRunner) -> Self {
        Self {
            state: ComposerState::new(),
            runner,
            last_error: None,
        }
    }

    /// Applies `msg`, hands effects to the runner and renders if needed.
    /// Returns whether a post or comment submission was started.
    fn dispatch(&mut self, msg: Msg) -> anyhow::Result<bool> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let submitted = effects.iter().any(|effect| {
            matches!(
                effect,
                Effect::SubmitPost { .. } | Effect::SubmitComment { .. }
            )
        });
        let enqueued = self.runner.enqueue(effects);

        if state.consume_dirty() {
            let view = state.view();
            if let Some(message) = &view.error_banner {
                self.last_error = Some(message.clone());
            }
            print_view(&ui::render::render(&view));
        }
        self.state = state;

        for path in self.runner.take_redirects() {
            println!("Redirecting to {path}");
        }
        enqueued?;
        Ok(submitted)
    }

    fn run_comment(
        &mut self,
        post_id: String,
        content: String,
        user_id: String,
    ) -> anyhow::Result<()> {
        self.dispatch(Msg::CommentChanged(content))?;
        if !self.dispatch(Msg::CommentSubmitClicked { post_id, user_id })? {
            let message = self.state.view().comment_error.unwrap_or_default();
            bail!("comment was not sent: {message}");
        }

        loop {
            let msg = self.runner.next_msg(TICK).unwrap_or(Msg::Tick);
            self.dispatch(msg)?;

            let view = self.state.view();
            if !view.comment_submit_enabled {
                continue;
            }
            if let Some(message) = view.comment_error {
                bail!("comment was rejected: {message}");
            }
            if view.comment_banner.is_none() {
                composer_info!("Comment session finished");
                return Ok(());
            }
        }
    }

    fn run_to_completion(&mut self, expects_image: bool) -> anyhow::Result<()> {
        let mut step = Step::AwaitingUpload;
        loop {
            let msg = self.runner.next_msg(TICK).unwrap_or(Msg::Tick);
            self.dispatch(msg)?;

            let view = self.state.view();
            step = match step {
                Step::AwaitingUpload => {
                    if view.upload_error.is_some() {
                        bail!("image upload failed");
                    }
                    let image_ready = !expects_image || view.image_url.is_some();
                    if self.state.is_uploading() || !image_ready {
                        continue;
                    }
                    if !self.dispatch(Msg::SubmitClicked)? {
                        bail!("the form has validation errors");
                    }
                    Step::AwaitingResult
                }
                Step::AwaitingResult => match self.state.phase() {
                    FormPhase::Succeeded => Step::AwaitingDismiss { succeeded: true },
                    FormPhase::Failed => Step::AwaitingDismiss { succeeded: false },
                    _ => continue,
                },
                Step::AwaitingDismiss { succeeded } => {
                    if self.state.phase() != FormPhase::Editing {
                        continue;
                    }
                    composer_info!("Session finished succeeded={}", succeeded);
                    if succeeded {
                        return Ok(());
                    }
                    let message = self.last_error.take().unwrap_or_default();
                    bail!("post was rejected: {message}");
                }
            };
            composer_debug!("Session step {:?}", step);
        }
    }
}

fn print_view(lines: &[String]) {
    println!("----");
    for line in lines {
        println!("{line}");
    }
}
