//! Quizzes in progress, one per chat.
//!
//! Every run gets a fresh id. Timer tasks and late responses address the run by id
//! through [`ActiveQuizzes::with_run`], so once a run is superseded or torn down their
//! updates fall on the floor instead of touching the new run.

use std::{collections::HashMap, sync::Arc};

use teloxide::types::{ChatId, MessageId};
use tokio::{sync::Mutex, task::AbortHandle};
use tracing::debug;
use uuid::Uuid;

use crate::{engine::QuizSession, phone::Phone};

/// The message currently showing the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionMessage {
    pub id: MessageId,
    /// Photo messages carry the question in their caption.
    pub captioned: bool,
}

/// Names one question of one run. Keyboards carry it so a press can be matched
/// against what the chat is showing now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionTag {
    pub run_id: Uuid,
    pub index: usize,
}

#[derive(Debug)]
pub struct ActiveQuiz {
    run_id: Uuid,
    pub session: QuizSession<'static>,
    pub phone: Option<Phone>,
    pub message: Option<QuestionMessage>,
    timer: Option<AbortHandle>,
}

impl ActiveQuiz {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn tag(&self) -> QuestionTag {
        QuestionTag {
            run_id: self.run_id,
            index: self.session.current_index(),
        }
    }

    /// Whether a timer task is still live for this run.
    pub fn is_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Replaces the run's timer. Only one timer is ever live per run.
    pub fn arm(&mut self, timer: AbortHandle) {
        if let Some(previous) = self.timer.replace(timer) {
            previous.abort();
        }
    }

    pub fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for ActiveQuiz {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActiveQuizzes {
    inner: Arc<Mutex<HashMap<ChatId, ActiveQuiz>>>,
}

impl ActiveQuizzes {
    /// Starts a run for `chat`, tearing down whatever run was there before.
    ///
    /// A run started without a phone keeps the phone of the run it supersedes, so
    /// restarting mid-game still saves the score.
    pub async fn begin(
        &self,
        chat: ChatId,
        session: QuizSession<'static>,
        phone: Option<Phone>,
    ) -> Uuid {
        let run_id = Uuid::new_v4();
        let mut runs = self.inner.lock().await;

        let mut previous = runs.remove(&chat);
        let phone = phone.or_else(|| previous.as_mut().and_then(|quiz| quiz.phone.take()));
        if let Some(previous) = previous {
            debug!("Run {} in chat {} superseded by {}", previous.run_id, chat, run_id);
        }

        runs.insert(
            chat,
            ActiveQuiz {
                run_id,
                session,
                phone,
                message: None,
                timer: None,
            },
        );

        run_id
    }

    pub async fn end(&self, chat: ChatId) -> Option<Uuid> {
        self.inner
            .lock()
            .await
            .remove(&chat)
            .map(|quiz| quiz.run_id)
    }

    /// Ends `run_id` only if it is still the chat's run.
    pub async fn end_run(&self, chat: ChatId, run_id: Uuid) -> bool {
        let mut runs = self.inner.lock().await;
        if runs.get(&chat).is_some_and(|quiz| quiz.run_id == run_id) {
            runs.remove(&chat);
            true
        } else {
            false
        }
    }

    pub async fn with<R>(&self, chat: ChatId, f: impl FnOnce(&mut ActiveQuiz) -> R) -> Option<R> {
        self.inner.lock().await.get_mut(&chat).map(f)
    }

    /// Like [`ActiveQuizzes::with`], but only while `run_id` is still the chat's run.
    pub async fn with_run<R>(
        &self,
        chat: ChatId,
        run_id: Uuid,
        f: impl FnOnce(&mut ActiveQuiz) -> R,
    ) -> Option<R> {
        self.inner
            .lock()
            .await
            .get_mut(&chat)
            .filter(|quiz| quiz.run_id == run_id)
            .map(f)
    }

    /// Like [`ActiveQuizzes::with_run`], but only while the run still shows question
    /// `tag.index`. Presses on keyboards of earlier questions are dropped here.
    pub async fn with_question<R>(
        &self,
        chat: ChatId,
        tag: QuestionTag,
        f: impl FnOnce(&mut ActiveQuiz) -> R,
    ) -> Option<R> {
        self.inner
            .lock()
            .await
            .get_mut(&chat)
            .filter(|quiz| quiz.tag() == tag)
            .map(f)
    }
}
