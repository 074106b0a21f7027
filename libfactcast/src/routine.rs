//! The daily routine: generate, store, publish, notify
//!
//! Steps run strictly in order and the first failure ends the run. Nothing is
//! rolled back: a fact that was stored but not published stays in the store
//! with status `stored`, and `fact-history pending` lists it.

use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::config::{BotConfig, Config};
use crate::credentials::Credentials;
use crate::error::{FactcastError, Result};
use crate::generator::{CompletionClient, FactGenerator};
use crate::notifier::Notifier;
use crate::publisher::Publisher;
use crate::store::FactStore;
use crate::transport::Transport;
use crate::types::FactStatus;

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineReport {
    pub run_id: Uuid,
    pub key: String,
    pub fact: String,
}

pub struct DailyRoutine {
    store: FactStore,
    generator: FactGenerator,
    publisher: Publisher,
    notifier: Notifier,
    bot: BotConfig,
}

impl DailyRoutine {
    pub fn new(
        store: FactStore,
        generator: FactGenerator,
        publisher: Publisher,
        notifier: Notifier,
        bot: BotConfig,
    ) -> Self {
        Self {
            store,
            generator,
            publisher,
            notifier,
            bot,
        }
    }

    /// Wire every component from configuration, using the configured store path
    pub fn from_config(
        config: &Config,
        credentials: Credentials,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let store = FactStore::new(config.store_path());
        Self::with_store(store, config, credentials, transport)
    }

    /// Wire every component around an existing store
    pub fn with_store(
        store: FactStore,
        config: &Config,
        credentials: Credentials,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let client = CompletionClient::new(
            transport.clone(),
            &config.services.generation_url,
            credentials.openai_api_key,
        );
        let generator = FactGenerator::new(store.clone(), client, config.bot.clone());
        let publisher = Publisher::new(
            transport.clone(),
            &config.services.publish_url,
            credentials.oauth,
        );
        let notifier = Notifier::new(
            transport,
            &config.services.notify_url,
            credentials.slack_bot_token,
        );

        Self::new(store, generator, publisher, notifier, config.bot.clone())
    }

    pub fn store(&self) -> &FactStore {
        &self.store
    }

    /// Run the whole routine once
    pub async fn run(&self) -> Result<RoutineReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("routine", %run_id);

        async move {
            info!("generating fact...");
            let fact = self.generator.generate().await?;

            info!("storing fact...");
            let key = self.store.append(&fact).await?;

            info!(key = %key, "publishing fact...");
            self.publisher.publish(&fact).await?;
            self.store.mark(&key, FactStatus::Published).await?;

            info!(channel = %self.bot.channel, "sending notification...");
            let message = self.bot.notification_for(&fact);
            self.notifier.notify(&self.bot.channel, &message).await?;
            self.store.mark(&key, FactStatus::Notified).await?;

            info!("done");
            Ok::<_, FactcastError>(RoutineReport { run_id, key, fact })
        }
        .instrument(span)
        .await
    }
}
