use teloxide::{
    dispatching::{dialogue, dialogue::InMemStorage, UpdateFilterExt, UpdateHandler},
    dptree,
    prelude::Requester,
    types::{Message, Update},
    Bot,
};
use tracing::{info, instrument};

use crate::{
    commands::{cancel, help, start, Command},
    database::connection::Connection,
    registration, runner,
    state::QuizState,
    HandlerResult,
};

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start))
        .branch(case![Command::Quiz].endpoint(runner::quiz_command))
        .branch(case![Command::Cancel].endpoint(cancel));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(case![QuizState::ReceiveName].endpoint(registration::receive_name))
        .branch(
            case![QuizState::ReceivePhone { name }]
                .endpoint(registration::receive_phone::<Connection>),
        )
        .branch(case![QuizState::Registered { phone }].endpoint(runner::play))
        .branch(case![QuizState::Done { score }].endpoint(runner::show_result))
        .endpoint(invalid_state);

    let callback_handler = Update::filter_callback_query()
        .branch(case![QuizState::Playing].endpoint(runner::take_answer::<Connection>))
        .endpoint(runner::stale_callback);

    dialogue::enter::<Update, InMemStorage<QuizState>, QuizState, _>()
        .branch(message_handler)
        .branch(callback_handler)
}

#[instrument(level = "info", skip(bot))]
async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    info!("Chat {}: unexpected input '{:?}'", msg.chat.id, msg.text());
    bot.send_message(
        msg.chat.id,
        "Não entendi. Envie /start para se cadastrar ou /help para ver os comandos.",
    )
    .await?;
    Ok(())
}
