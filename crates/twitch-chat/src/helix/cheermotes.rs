use super::models::{HelixCheermote, HelixResponse};
use super::*;
use crate::metadata::CheermoteDefinition;

impl HelixClient {
    /// Fetch cheermotes usable in a broadcaster's chat.
    ///
    /// An empty `broadcaster_id` returns only the global cheermotes.
    pub async fn get_cheermotes(
        &self,
        token: &Token,
        broadcaster_id: &str,
    ) -> Result<Vec<CheermoteDefinition>, TwitchError> {
        let url = if broadcaster_id.is_empty() {
            self.endpoint("bits/cheermotes", &[])?
        } else {
            self.endpoint("bits/cheermotes", &[("broadcaster_id", broadcaster_id)])?
        };
        let body = self.authenticated_get(&url, token).await?;
        let resp: HelixResponse<HelixCheermote> = serde_json::from_str(&body)?;
        tracing::debug!(count = resp.data.len(), broadcaster_id, "Fetched cheermotes");

        Ok(resp
            .data
            .into_iter()
            .map(HelixCheermote::into_definition)
            .collect())
    }
}
