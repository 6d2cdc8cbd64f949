use std::collections::HashMap;
use std::time::Duration;

use anyhow::bail;
use composer_core::{
    CreatedComment, CreatedPost, Effect, ImageFile, Msg, NewComment, NewPost, TimerKind,
};
use composer_engine::{
    CreateCommentRequest, CreatePostRequest, CreatedCommentResponse, CreatedPostResponse,
    EngineEvent, EngineHandle, TimerId, UploadFile,
};
use composer_logging::{composer_debug, composer_info};

/// Executes core effects on the engine and turns engine events back into
/// messages.
pub struct EffectRunner {
    engine: EngineHandle,
    timers: HashMap<TimerId, (TimerKind, u64)>,
    next_timer_id: TimerId,
    redirects: Vec<String>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self {
            engine,
            timers: HashMap::new(),
            next_timer_id: 0,
            redirects: Vec::new(),
        }
    }

    /// Hands every effect to the engine. Fails once the engine has stopped,
    /// since no answer would ever come back.
    pub fn enqueue(&mut self, effects: Vec<Effect>) -> anyhow::Result<()> {
        for effect in effects {
            let accepted = match effect {
                Effect::UploadImage { upload_id, file } => {
                    composer_info!("UploadImage upload_id={} name={}", upload_id, file.name);
                    self.engine.upload(upload_id, map_file(file))
                }
                Effect::SubmitPost {
                    submission_id,
                    post,
                } => {
                    composer_info!(
                        "SubmitPost submission_id={} title_len={}",
                        submission_id,
                        post.title.chars().count()
                    );
                    self.engine.submit(submission_id, map_post(post))
                }
                Effect::SubmitComment {
                    submission_id,
                    comment,
                } => {
                    composer_info!(
                        "SubmitComment submission_id={} post_id={}",
                        submission_id,
                        comment.post_id
                    );
                    self.engine.submit_comment(submission_id, map_comment(comment))
                }
                Effect::StartTimer {
                    timer,
                    generation,
                    after,
                } => {
                    self.next_timer_id += 1;
                    let timer_id = self.next_timer_id;
                    self.timers.insert(timer_id, (timer, generation));
                    self.engine.schedule(timer_id, after)
                }
                Effect::Redirect { path } => {
                    composer_info!("Redirect to {}", path);
                    self.redirects.push(path);
                    true
                }
            };
            if !accepted {
                bail!("engine stopped");
            }
        }
        Ok(())
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&mut self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        Some(self.map_event(event))
    }

    pub fn take_redirects(&mut self) -> Vec<String> {
        std::mem::take(&mut self.redirects)
    }

    fn map_event(&mut self, event: EngineEvent) -> Msg {
        match event {
            EngineEvent::Progress(progress) => Msg::UploadProgress {
                upload_id: progress.upload_id,
                percent: progress.percent,
            },
            EngineEvent::UploadCompleted { upload_id, result } => match result {
                Ok(url) => Msg::UploadSucceeded { upload_id, url },
                Err(err) => Msg::UploadFailed {
                    upload_id,
                    reason: err.to_string(),
                },
            },
            EngineEvent::SubmitCompleted {
                submission_id,
                result,
            } => match result {
                Ok(post) => Msg::SubmitSucceeded {
                    submission_id,
                    post: map_created(post),
                },
                Err(err) => Msg::SubmitFailed {
                    submission_id,
                    message: err.message,
                },
            },
            EngineEvent::CommentCompleted {
                submission_id,
                result,
            } => match result {
                Ok(comment) => Msg::CommentSucceeded {
                    submission_id,
                    comment: map_created_comment(comment),
                },
                Err(err) => Msg::CommentFailed {
                    submission_id,
                    message: err.message,
                },
            },
            EngineEvent::TimerElapsed { timer_id } => match self.timers.remove(&timer_id) {
                Some((timer, generation)) => Msg::TimerElapsed { timer, generation },
                None => {
                    composer_debug!("Unknown timer {}", timer_id);
                    Msg::NoOp
                }
            },
        }
    }
}

fn map_file(file: ImageFile) -> UploadFile {
    UploadFile {
        name: file.name,
        content_type: file.content_type,
        data: file.data,
    }
}

fn map_post(post: NewPost) -> CreatePostRequest {
    CreatePostRequest {
        title: post.title,
        content: post.content,
        category: post.category,
        image: post.image,
    }
}

fn map_created(post: CreatedPostResponse) -> CreatedPost {
    CreatedPost {
        id: post.id,
        slug: post.slug,
        title: post.title,
    }
}

fn map_comment(comment: NewComment) -> CreateCommentRequest {
    CreateCommentRequest {
        post_id: comment.post_id,
        content: comment.content,
        user_id: comment.user_id,
    }
}

fn map_created_comment(comment: CreatedCommentResponse) -> CreatedComment {
    CreatedComment {
        id: comment.id,
        content: comment.content,
    }
}
