use super::*;
use crate::auth::AuthState;
use crate::config::ClientConfig;
use crate::metadata::{BadgeScope, BadgeSetData, CheermoteDefinition, MetadataSource};

/// [`MetadataSource`] backed by Helix with an app access token.
///
/// The token is renewed on demand before each call; a 401 drops it and the
/// call is retried once with a fresh token.
pub struct HelixMetadataSource {
    api: HelixClient,
    auth: AuthState,
}

impl HelixMetadataSource {
    pub fn new(api: HelixClient, auth: AuthState) -> Self {
        Self { api, auth }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            HelixClient::new(config.client_id.clone(), config.helix_base.clone()),
            AuthState::from_config(config),
        )
    }

    pub fn api(&self) -> &HelixClient {
        &self.api
    }

    async fn with_token<T, F, Fut>(&self, call: F) -> Result<T, TwitchError>
    where
        F: Fn(Token) -> Fut,
        Fut: Future<Output = Result<T, TwitchError>>,
    {
        let token = self.auth.token().await?;
        match call(token).await {
            Err(TwitchError::ApiError { status: 401, .. }) => {
                tracing::info!("Helix rejected app token, retrying with a new one");
                self.auth.invalidate().await;
                let token = self.auth.token().await?;
                call(token).await
            }
            other => other,
        }
    }
}

impl MetadataSource for HelixMetadataSource {
    async fn fetch_broadcaster_id(&self, login: &str) -> Result<String, TwitchError> {
        self.with_token(|token| async move {
            self.api
                .get_user_by_login(&token, login)
                .await
                .map(|user| user.id)
        })
        .await
    }

    async fn fetch_cheermotes(
        &self,
        broadcaster_id: &str,
    ) -> Result<Vec<CheermoteDefinition>, TwitchError> {
        self.with_token(|token| async move {
            self.api.get_cheermotes(&token, broadcaster_id).await
        })
        .await
    }

    async fn fetch_badges(&self, scope: BadgeScope<'_>) -> Result<Vec<BadgeSetData>, TwitchError> {
        self.with_token(|token| async move { self.api.get_chat_badges(&token, scope).await })
            .await
    }
}
