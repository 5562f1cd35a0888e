use thiserror::Error;

use crate::phone::InvalidPhone;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("phone {0} is already registered")]
    Duplicate(String),

    #[error("score {0} does not fit the scores column")]
    ScoreOutOfRange(u32),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Everything a registration attempt can fail with. `Display` is the text shown to the user.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Por favor, informe seu nome.")]
    MissingName,

    #[error(transparent)]
    InvalidPhone(#[from] InvalidPhone),

    #[error("Este número já foi registrado. Só é permitido um jogo por pessoa.")]
    AlreadyRegistered,

    #[error("Erro interno, tente novamente mais tarde.")]
    Lookup(#[source] StoreError),

    #[error("Erro ao registrar, tente novamente.")]
    Insert(#[source] StoreError),
}

impl RegistrationError {
    /// Validation and duplicate errors never reached or never changed the store.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            RegistrationError::MissingName
                | RegistrationError::InvalidPhone(_)
                | RegistrationError::AlreadyRegistered
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} should be set")]
    Missing(&'static str),

    #[error("invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("WEBHOOK_URL and WEBHOOK_ADDR must be set together")]
    PartialWebhook,
}
