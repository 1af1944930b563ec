use super::models::{HelixResponse, HelixUser};
use super::*;

impl HelixClient {
    /// Get user profile by login name.
    pub async fn get_user_by_login(
        &self,
        token: &Token,
        login: &str,
    ) -> Result<HelixUser, TwitchError> {
        let url = self.endpoint("users", &[("login", login)])?;
        let body = self.authenticated_get(&url, token).await?;
        let resp: HelixResponse<HelixUser> = serde_json::from_str(&body)?;

        resp.data
            .into_iter()
            .next()
            .ok_or_else(|| TwitchError::UnknownChannel(login.to_string()))
    }
}
