// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod config;
pub mod gemini;
pub mod moderation;
pub mod openai_compat;
pub mod rails;
pub mod store;

use std::sync::Arc;

use crate::application::adapter::{AdapterFactory, BackendSet};
use crate::application::service::ArenaService;
use crate::domain::catalog::BackendKind;

/// Wire the full service graph from configuration.
pub fn bootstrap(config: &config::ArenaConfig) -> anyhow::Result<ArenaService> {
    let openai_key = config::resolve_api_key(&config.openai.api_key)?;
    let anyscale_key = config::resolve_api_key(&config.anyscale.api_key)?;
    let gemini_key = config::resolve_api_key(&config.gemini.api_key)?;
    let guard_key = config::resolve_api_key(&config.guard.api_key)?;
    // The store URL shares the env indirection: it differs per deployment,
    // not per manifest.
    let store_url = config::resolve_api_key(&config.store.base_url)?;

    let backends = BackendSet {
        gpt35_turbo: Arc::new(openai_compat::OpenAiCompatClient::new(
            config.openai.endpoint.clone(),
            openai_key,
            BackendKind::Gpt35Turbo.model_id().to_string(),
        )),
        llama70b: Arc::new(openai_compat::OpenAiCompatClient::new(
            config.anyscale.endpoint.clone(),
            anyscale_key.clone(),
            BackendKind::Llama70b.model_id().to_string(),
        )),
        mixtral8x7b: Arc::new(openai_compat::OpenAiCompatClient::new(
            config.anyscale.endpoint.clone(),
            anyscale_key,
            BackendKind::Mixtral8x7b.model_id().to_string(),
        )),
        gemini_pro: Arc::new(gemini::GeminiClient::new(
            config.gemini.endpoint.clone(),
            gemini_key,
            BackendKind::GeminiPro.model_id().to_string(),
        )),
    };

    let moderator = Arc::new(moderation::GuardModelClient::new(
        config.guard.endpoint.clone(),
        guard_key,
        config.guard.model.clone(),
    ));
    let rails = Arc::new(rails::RailsClient::new(
        config.rails.endpoint.clone(),
        config.rails.config_id.clone(),
    ));
    let store = Arc::new(store::HttpConversationStore::new(store_url));

    Ok(ArenaService::new(
        AdapterFactory::new(backends, moderator, rails),
        store,
    ))
}
