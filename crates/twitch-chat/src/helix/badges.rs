use super::models::{HelixBadgeSet, HelixResponse};
use super::*;
use crate::metadata::{BadgeScope, BadgeSetData};

impl HelixClient {
    /// Fetch global or channel chat badges.
    pub async fn get_chat_badges(
        &self,
        token: &Token,
        scope: BadgeScope<'_>,
    ) -> Result<Vec<BadgeSetData>, TwitchError> {
        let url = match scope {
            BadgeScope::Global => self.endpoint("chat/badges/global", &[])?,
            BadgeScope::Channel(id) => self.endpoint("chat/badges", &[("broadcaster_id", id)])?,
        };
        let body = self.authenticated_get(&url, token).await?;
        let resp: HelixResponse<HelixBadgeSet> = serde_json::from_str(&body)?;
        tracing::debug!(count = resp.data.len(), scope = ?scope, "Fetched chat badges");

        Ok(resp
            .data
            .into_iter()
            .map(HelixBadgeSet::into_badge_set)
            .collect())
    }
}
