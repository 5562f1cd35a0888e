use std::sync::Arc;

use dotenvy::dotenv;
use quiz_england_bot::{
    config::Config, database::connection::Connection, schema::schema, session::ActiveQuizzes,
    state::QuizState,
};
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::error_handlers::IgnoringErrorHandlerSafe;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::info;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

fn init_tracing(level: &str) {
    // teloxide and sqlx log through `log`; forward those records to tracing.
    LogTracer::init().expect("Failed to install log forwarding.");

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_line_number(true)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to install subscriber.");
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let log_level = std::env::var("LOG_LEVEL").unwrap_or("error".into());
    init_tracing(&log_level);

    let config = Arc::new(Config::load().expect("Environment misconfigured!"));

    let connection = Arc::new(
        Connection::connect(&config.database_url)
            .await
            .expect("Failed to connect to database"),
    );
    connection
        .perform_migration_if_needed()
        .await
        .expect("Failed to migrate database");

    let bot = Bot::new(&config.bot_token);
    info!("Starting bot...");

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![
            InMemStorage::<QuizState>::new(),
            connection,
            config.clone(),
            ActiveQuizzes::default()
        ])
        .enable_ctrlc_handler()
        .build();

    if let Some(webhook) = &config.webhook {
        info!("Listening for webhooks on {}", webhook.addr);
        let listener = webhooks::axum(bot, Options::new(webhook.addr, webhook.url.clone()))
            .await
            .expect("Failed to build a listener.");
        dispatcher
            .dispatch_with_listener(listener, Arc::new(IgnoringErrorHandlerSafe))
            .await
    } else {
        dispatcher.dispatch().await
    }
}
