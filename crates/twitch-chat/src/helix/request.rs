use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use super::*;

impl HelixClient {
    /// Build auth headers from the given token.
    fn auth_headers(&self, token: &Token) -> Result<HeaderMap, TwitchError> {
        let invalid = |e: reqwest::header::InvalidHeaderValue| {
            TwitchError::TokenRefreshFailed(format!("token not usable as header: {e}"))
        };

        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", token.access_token);
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&bearer).map_err(invalid)?);
        headers.insert(
            "Client-Id",
            HeaderValue::from_str(&self.client_id).map_err(invalid)?,
        );
        Ok(headers)
    }

    /// Execute a GET request with auth headers.
    ///
    /// Non-2xx responses become [`TwitchError::ApiError`]; a 401 means the
    /// caller should renew its token.
    pub(super) async fn authenticated_get(
        &self,
        url: &Url,
        token: &Token,
    ) -> Result<String, TwitchError> {
        let headers = self.auth_headers(token)?;
        let resp = self.http.get(url.as_str()).headers(headers).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            tracing::warn!(url = %url, "Got 401, token must be renewed");
        }

        if !status.is_success() {
            return Err(TwitchError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(body)
    }
}
