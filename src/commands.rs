use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{Message, ReplyMarkup},
    utils::command::BotCommands,
    Bot,
};
use tracing::info;

use crate::{session::ActiveQuizzes, state::QuizState, HandlerResult, UserDialogue};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "register and start over.")]
    Start,
    #[command(description = "play the quiz.")]
    Quiz,
    #[command(description = "leave the current quiz.")]
    Cancel,
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

pub(crate) async fn cancel(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    quizzes: ActiveQuizzes,
) -> HandlerResult {
    if let Some(run_id) = quizzes.end(msg.chat.id).await {
        info!("Chat {} left quiz run {}", msg.chat.id, run_id);
    }
    bot.send_message(msg.chat.id, "Quiz cancelado.")
        .reply_markup(ReplyMarkup::kb_remove())
        .await?;
    dialogue.update(QuizState::Start).await?;
    Ok(())
}

pub(crate) async fn start(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    quizzes: ActiveQuizzes,
) -> HandlerResult {
    quizzes.end(msg.chat.id).await;
    bot.send_message(msg.chat.id, "Bem-vindo ao Quiz England! Qual é o seu nome?")
        .reply_markup(ReplyMarkup::kb_remove())
        .await?;
    dialogue.update(QuizState::ReceiveName).await?;
    Ok(())
}
