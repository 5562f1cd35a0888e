use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{Message, ReplyMarkup},
    Bot,
};
use tracing::{error, info, instrument, warn};

use crate::{
    database::connection::{FindParticipant, RegisterParticipant},
    error::{RegistrationError, StoreError},
    keyboard::play_keyboard,
    phone::{self, Phone},
    state::QuizState,
    HandlerResult, UserDialogue,
};

const PHONE_PROMPT: &str = "Número de celular (XX)9XXXX-XXXX";

/// Validates the form, checks the phone is new and inserts the participant.
///
/// Validation failures return before the store is touched. A successful submission
/// performs exactly one lookup and one insert; nothing is retried.
#[instrument(level = "info", skip(store))]
pub async fn submit<Store>(
    store: &Store,
    name: &str,
    phone_display: &str,
) -> Result<Phone, RegistrationError>
where
    Store: FindParticipant + RegisterParticipant,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(RegistrationError::MissingName);
    }

    let phone = phone::validate(phone_display)?;

    match store.find_participant(&phone).await {
        Ok(Some(existing)) => {
            info!("Rejecting registration, already registered: {}", existing);
            return Err(RegistrationError::AlreadyRegistered);
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to check for duplicate {}: {:?}", phone, e);
            return Err(RegistrationError::Lookup(e));
        }
    }

    match store.register_participant(name, &phone).await {
        Ok(()) => {
            info!("Registered {} as {}", name, phone);
            Ok(phone)
        }
        // Lost the race against another insert of the same phone.
        Err(StoreError::Duplicate(_)) => {
            warn!("Insert of {} hit the unique constraint", phone);
            Err(RegistrationError::AlreadyRegistered)
        }
        Err(e) => {
            error!("Failed to save {}: {:?}", phone, e);
            Err(RegistrationError::Insert(e))
        }
    }
}

#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn receive_name(bot: Bot, dialogue: UserDialogue, msg: Message) -> HandlerResult {
    match msg.text().map(str::trim) {
        Some(name) if !name.is_empty() => {
            bot.send_message(msg.chat.id, format!("Olá, {name}! Qual é o seu celular?"))
                .await?;
            bot.send_message(msg.chat.id, PHONE_PROMPT).await?;
            dialogue
                .update(QuizState::ReceivePhone {
                    name: name.to_owned(),
                })
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, RegistrationError::MissingName.to_string())
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, store))]
pub(crate) async fn receive_phone<Store>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    name: String,
    store: Arc<Store>,
) -> HandlerResult
where
    Store: FindParticipant + RegisterParticipant,
{
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, PHONE_PROMPT).await?;
        return Ok(());
    };

    match submit(&*store, &name, text).await {
        Ok(phone) => {
            bot.send_message(
                msg.chat.id,
                format!(
                    "Cadastro concluído: {}\nToque em <b>Play</b> para começar!",
                    phone.masked()
                ),
            )
            .parse_mode(teloxide::types::ParseMode::Html)
            .reply_markup(play_keyboard())
            .await?;
            dialogue.update(QuizState::Registered { phone }).await?;
        }
        Err(e) => {
            if e.is_local() {
                info!("Registration refused for {}: {}", phone::format(text), e);
            }
            bot.send_message(msg.chat.id, e.to_string())
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
        }
    }

    Ok(())
}
