use std::{path::PathBuf, sync::Arc, time::Duration};

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::{
        AnswerCallbackQuerySetters, EditMessageCaptionSetters, EditMessageTextSetters,
        SendMessageSetters, SendPhotoSetters,
    },
    prelude::Requester,
    types::{CallbackQuery, ChatId, InlineKeyboardMarkup, InputFile, Message, ParseMode, ReplyMarkup},
    Bot,
};
use tokio::time::interval;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::Config,
    database::connection::SaveScore,
    engine::{Advance, Phase, QuizSession, Selection, Tick, FULL_TIME},
    keyboard::{answered_keyboard, options_keyboard, play_keyboard, QuizAction, QuizPress, PLAY},
    phone::Phone,
    presenter::{present, render_score},
    quiz::bank,
    session::{ActiveQuizzes, QuestionMessage, QuestionTag},
    state::QuizState,
    HandlerResult, UserDialogue,
};

const BAR_CELLS: usize = 10;

/// Ten cells, the last one only empties when the countdown hits zero.
pub fn progress_bar(ratio: f64) -> String {
    let filled = ((ratio.clamp(0.0, FULL_TIME) / FULL_TIME) * BAR_CELLS as f64).ceil() as usize;
    let filled = filled.min(BAR_CELLS);

    format!("{}{}", "▓".repeat(filled), "░".repeat(BAR_CELLS - filled))
}

/// Question text and keyboard for the session's current state.
fn render(run_id: Uuid, session: &QuizSession<'_>) -> Option<(String, InlineKeyboardMarkup)> {
    let question = session.question()?;
    let tag = QuestionTag {
        run_id,
        index: session.current_index(),
    };
    let mut text = format!(
        "Pergunta {}/{}\n{}\n\n{}",
        session.current_index() + 1,
        session.total(),
        progress_bar(session.ratio()),
        question
    );

    let keyboard = match session.phase() {
        Phase::Answered(verdict) => {
            let line = match verdict.selection {
                Selection::Option(_) if verdict.correct => {
                    format!("✅ Correto! +{} pontos", verdict.earned)
                }
                Selection::Option(_) => {
                    format!("❌ Errado! Resposta certa: {}", question.correct_option())
                }
                Selection::TimedOut => {
                    format!("⏰ Tempo esgotado! Resposta certa: {}", question.correct_option())
                }
            };
            text.push_str("\n\n");
            text.push_str(&line);
            answered_keyboard(tag, question, &verdict)
        }
        Phase::Counting | Phase::Finished => options_keyboard(tag, question),
    };

    Some((text, keyboard))
}

/// Sends the question, as a photo when there is an image. A photo that fails to go out
/// is retried as plain text. `None` when nothing could be sent.
async fn send_question(
    bot: &Bot,
    chat: ChatId,
    image: Option<PathBuf>,
    text: String,
    keyboard: InlineKeyboardMarkup,
) -> Option<QuestionMessage> {
    if let Some(path) = image {
        let sent = bot
            .send_photo(chat, InputFile::file(path.clone()))
            .caption(text.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard.clone())
            .await;
        match sent {
            Ok(sent) => {
                return Some(QuestionMessage {
                    id: sent.id,
                    captioned: true,
                })
            }
            Err(e) => warn!(
                "Failed to send {} to chat {}, sending text instead: {}",
                path.display(),
                chat,
                e
            ),
        }
    }

    match bot
        .send_message(chat, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await
    {
        Ok(sent) => Some(QuestionMessage {
            id: sent.id,
            captioned: false,
        }),
        Err(e) => {
            error!("Failed to send question to chat {}: {}", chat, e);
            None
        }
    }
}

async fn edit_question(
    bot: &Bot,
    chat: ChatId,
    message: QuestionMessage,
    text: String,
    keyboard: InlineKeyboardMarkup,
) {
    let result = if message.captioned {
        bot.edit_message_caption(chat, message.id)
            .caption(text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard)
            .await
    } else {
        bot.edit_message_text(chat, message.id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard)
            .await
    };

    if let Err(e) = result {
        warn!("Failed to update question message in chat {}: {}", chat, e);
    }
}

async fn drop_keyboard(bot: &Bot, chat: ChatId, message: Option<QuestionMessage>) {
    if let Some(message) = message {
        if let Err(e) = bot.edit_message_reply_markup(chat, message.id).await {
            debug!("Failed to clear keyboard in chat {}: {}", chat, e);
        }
    }
}

/// Ticks the current question down, redrawing whenever the bar changes. Stops on
/// expiry, on an answer, or once the run is gone.
async fn countdown(bot: Bot, chat: ChatId, run_id: Uuid, quizzes: ActiveQuizzes, every: Duration) {
    let mut ticks = interval(every);
    ticks.tick().await;
    let mut shown = progress_bar(FULL_TIME);

    loop {
        ticks.tick().await;
        let Some((tick, message, rendered)) = quizzes
            .with_run(chat, run_id, |quiz| {
                let tick = quiz.session.tick();
                (tick, quiz.message, render(run_id, &quiz.session))
            })
            .await
        else {
            debug!("Run {} is gone, stopping countdown", run_id);
            break;
        };

        match tick {
            Tick::Idle => break,
            Tick::Running { ratio } => {
                let bar = progress_bar(ratio);
                if bar == shown {
                    continue;
                }
                shown = bar;
            }
            Tick::Expired => info!("Question timed out in chat {}", chat),
        }

        if let Some((text, keyboard)) = rendered {
            match message {
                Some(message) => edit_question(&bot, chat, message, text, keyboard).await,
                // The question never reached the chat; the reveal still has to.
                None if tick == Tick::Expired => {
                    if let Some(sent) = send_question(&bot, chat, None, text, keyboard).await {
                        quizzes
                            .with_run(chat, run_id, |quiz| quiz.message = Some(sent))
                            .await;
                    }
                }
                None => {}
            }
        }
        if tick == Tick::Expired {
            break;
        }
    }
}

/// Shows the run's current question and arms its countdown. The countdown is armed
/// even when nothing could be sent, so the question still expires.
async fn ask_question(
    bot: &Bot,
    chat: ChatId,
    run_id: Uuid,
    quizzes: &ActiveQuizzes,
    config: &Config,
) {
    let Some((question, (text, keyboard))) = quizzes
        .with_run(chat, run_id, |quiz| {
            let question = quiz.session.question()?;
            Some((question, render(run_id, &quiz.session)?))
        })
        .await
        .flatten()
    else {
        return;
    };

    let image = config
        .assets_dir
        .as_deref()
        .map(|dir| question.image_path(dir))
        .filter(|path| path.is_file());
    let message = send_question(bot, chat, image, text, keyboard).await;

    let timer = tokio::spawn(countdown(
        bot.clone(),
        chat,
        run_id,
        quizzes.clone(),
        config.tick_interval,
    ));
    let armed = quizzes
        .with_run(chat, run_id, |quiz| {
            quiz.message = message;
            quiz.arm(timer.abort_handle());
        })
        .await;
    if armed.is_none() {
        timer.abort();
        debug!("Run {} ended before its question was shown", run_id);
    }
}

async fn start_quiz(
    bot: &Bot,
    dialogue: &UserDialogue,
    chat: ChatId,
    phone: Option<Phone>,
    quizzes: &ActiveQuizzes,
    config: &Config,
) -> HandlerResult {
    let run_id = quizzes.begin(chat, QuizSession::new(bank()), phone).await;
    info!("Chat {} starts quiz run {}", chat, run_id);
    let registered = quizzes
        .with_run(chat, run_id, |quiz| quiz.phone.is_some())
        .await
        .unwrap_or(false);
    if !registered {
        warn!("Chat {} plays without a registered phone, score will not be saved", chat);
    }

    dialogue.update(QuizState::Playing).await?;
    if let Err(e) = bot
        .send_message(chat, "Vamos começar!")
        .reply_markup(ReplyMarkup::kb_remove())
        .await
    {
        warn!("Failed to greet chat {}: {}", chat, e);
    }

    ask_question(bot, chat, run_id, quizzes, config).await;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, quizzes, config))]
pub(crate) async fn play(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    phone: Phone,
    quizzes: ActiveQuizzes,
    config: Arc<Config>,
) -> HandlerResult {
    match msg.text() {
        Some(PLAY) => start_quiz(&bot, &dialogue, msg.chat.id, Some(phone), &quizzes, &config).await,
        _ => {
            bot.send_message(msg.chat.id, "Toque em Play para começar.")
                .reply_markup(play_keyboard())
                .await?;
            Ok(())
        }
    }
}

/// `/quiz` works from any state. Mid-run the phone of the superseded run is kept;
/// without any registration the score is simply not saved.
#[instrument(level = "info", skip(bot, dialogue, quizzes, config))]
pub(crate) async fn quiz_command(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    quizzes: ActiveQuizzes,
    config: Arc<Config>,
) -> HandlerResult {
    let phone = match dialogue.get().await? {
        Some(QuizState::Registered { phone }) => Some(phone),
        _ => None,
    };

    start_quiz(&bot, &dialogue, msg.chat.id, phone, &quizzes, &config).await
}

#[instrument(level = "info", skip(bot, dialogue, quizzes, store, config))]
pub(crate) async fn take_answer<Store>(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    quizzes: ActiveQuizzes,
    store: Arc<Store>,
    config: Arc<Config>,
) -> HandlerResult
where
    Store: SaveScore + Send + Sync + 'static,
{
    bot.answer_callback_query(&q.id).await?;

    let (Some(chat), Some(press)) = (q.chat_id(), q.data.as_deref().and_then(QuizPress::parse))
    else {
        debug!("Ignoring callback {:?}", q.data);
        return Ok(());
    };

    match press.action {
        QuizAction::Select(option) => select_option(&bot, chat, press.tag, option, &quizzes).await,
        QuizAction::Next => {
            next_question(&bot, &dialogue, chat, press.tag, &quizzes, store, &config).await
        }
    }
}

async fn select_option(
    bot: &Bot,
    chat: ChatId,
    tag: QuestionTag,
    option: usize,
    quizzes: &ActiveQuizzes,
) -> HandlerResult {
    let outcome = quizzes
        .with_question(chat, tag, |quiz| {
            let verdict = quiz.session.select(option)?;
            quiz.disarm();
            Some((verdict, quiz.message, render(tag.run_id, &quiz.session)?))
        })
        .await
        .flatten();

    let Some((verdict, message, (text, keyboard))) = outcome else {
        debug!("Ignoring selection {} for {:?} in chat {}", option, tag, chat);
        return Ok(());
    };

    info!(
        "Chat {} picked option {}. Correctness: {}, earned {}",
        chat, option, verdict.correct, verdict.earned
    );
    if let Some(message) = message {
        edit_question(bot, chat, message, text, keyboard).await;
    }

    Ok(())
}

async fn next_question<Store>(
    bot: &Bot,
    dialogue: &UserDialogue,
    chat: ChatId,
    tag: QuestionTag,
    quizzes: &ActiveQuizzes,
    store: Arc<Store>,
    config: &Config,
) -> HandlerResult
where
    Store: SaveScore + Send + Sync + 'static,
{
    let step = quizzes
        .with_question(chat, tag, |quiz| {
            let advance = quiz.session.advance();
            // The phone leaves the run with the score; nothing keeps it afterwards.
            let phone = match advance {
                Advance::Finished { .. } => quiz.phone.take(),
                _ => None,
            };
            (advance, phone, quiz.message)
        })
        .await;

    let Some((advance, phone, message)) = step else {
        debug!("Ignoring next for {:?} in chat {}", tag, chat);
        return Ok(());
    };

    match advance {
        Advance::Ignored => Ok(()),
        Advance::Next { index } => {
            debug!("Chat {} moves to question #{}", chat, index + 1);
            drop_keyboard(bot, chat, message).await;
            ask_question(bot, chat, tag.run_id, quizzes, config).await;
            Ok(())
        }
        Advance::Finished { score } => {
            drop_keyboard(bot, chat, message).await;
            finish(bot, dialogue, chat, tag.run_id, score, phone, quizzes, store, config).await
        }
    }
}

/// Stores the score and plays the result animation. The run is released once the
/// animation is over, or right away when the result could not be shown.
#[allow(clippy::too_many_arguments)]
async fn finish<Store>(
    bot: &Bot,
    dialogue: &UserDialogue,
    chat: ChatId,
    run_id: Uuid,
    score: u32,
    phone: Option<Phone>,
    quizzes: &ActiveQuizzes,
    store: Arc<Store>,
    config: &Config,
) -> HandlerResult
where
    Store: SaveScore + Send + Sync + 'static,
{
    info!("Chat {} completed the quiz with {} points", chat, score);
    dialogue.update(QuizState::Done { score }).await?;

    tokio::spawn(async move { persist_score(&*store, phone.as_ref(), score).await });

    let sent = match bot
        .send_message(chat, render_score(0, &[]))
        .parse_mode(ParseMode::Html)
        .await
    {
        Ok(sent) => sent,
        Err(e) => {
            error!("Failed to send the result to chat {}: {}", chat, e);
            quizzes.end_run(chat, run_id).await;
            return Ok(());
        }
    };

    let presentation = tokio::spawn({
        let bot = bot.clone();
        let quizzes = quizzes.clone();
        let render_interval = config.render_interval;
        async move {
            present(bot, chat, sent.id, score, render_interval).await;
            quizzes.end_run(chat, run_id).await;
        }
    });
    let armed = quizzes
        .with_run(chat, run_id, |quiz| quiz.arm(presentation.abort_handle()))
        .await;
    if armed.is_none() {
        presentation.abort();
    }

    Ok(())
}

/// Saves the final score. Failures are only logged; the player still sees their score.
pub async fn persist_score<Store: SaveScore>(store: &Store, phone: Option<&Phone>, score: u32) {
    let Some(phone) = phone else {
        warn!("No registered phone, score {} not saved", score);
        return;
    };

    match store.save_score(phone, score).await {
        Ok(0) => warn!("No participant {} to attach score {} to", phone, score),
        Ok(_) => info!("Score {} saved for {}", score, phone),
        Err(e) => error!("Failed to save score for {}: {:?}", phone, e),
    }
}

#[instrument(level = "info", skip(bot))]
pub(crate) async fn show_result(bot: Bot, msg: Message, score: u32) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        format!("Sua pontuação final foi: {score}. Obrigado por jogar!"),
    )
    .await?;
    Ok(())
}

pub(crate) async fn stale_callback(bot: Bot, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(&q.id)
        .text("Este quiz já terminou.")
        .await?;
    Ok(())
}
