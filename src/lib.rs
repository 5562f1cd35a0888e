use state::QuizState;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::Dialogue};

pub mod commands;
pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod keyboard;
pub mod phone;
pub mod presenter;
pub mod quiz;
pub mod registration;
pub mod runner;
pub mod schema;
pub mod session;
pub mod state;

type UserDialogue = Dialogue<QuizState, InMemStorage<QuizState>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;
