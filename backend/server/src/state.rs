use std::sync::Arc;

use reqwest::Client;

use super::{
    config::Config,
    notify::{Mailjet, Notifier},
    scheduling::SchedulingProvider,
    store::{ChallengeStore, MemoryStore},
    verification::Verifier,
};

pub struct AppState {
    pub config: Config,
    pub notifier: Arc<dyn Notifier>,
    pub verifier: Verifier,
    pub scheduler: SchedulingProvider,
}

impl AppState {
    pub fn new(config: Config) -> Arc<Self> {
        let client = Client::new();
        let notifier = Arc::new(Mailjet::new(client.clone(), config.mail.clone()));

        Self::with_parts(config, client, notifier, Arc::new(MemoryStore::default()))
    }

    pub fn with_parts(
        config: Config,
        client: Client,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn ChallengeStore>,
    ) -> Arc<Self> {
        let verifier = Verifier::new(store, notifier.clone(), config.otp_ttl);
        let scheduler = SchedulingProvider::from_config(client, &config.scheduling);

        Arc::new(Self {
            config,
            notifier,
            verifier,
            scheduler,
        })
    }
}
