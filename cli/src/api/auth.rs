//! Account and CLI Pairing Endpoints

use super::client::ApiClient;
use super::error::ApiResult;
use super::types::{CliAuthPoll, CliAuthStart, Organization, User, UserResponse};

impl ApiClient {
    /// Begin the pairing-code login flow.
    pub async fn start_cli_auth(&self) -> ApiResult<CliAuthStart> {
        self.post_json("/api/auth/cli/start").await
    }

    /// Check whether the pairing for `device_code` has been approved.
    pub async fn poll_cli_auth(&self, device_code: &str) -> ApiResult<CliAuthPoll> {
        self.get_json_with_query(
            "/api/auth/cli/poll",
            &[("device_code", device_code.to_string())],
        )
        .await
    }

    /// The user the credential belongs to.
    pub async fn current_user(&self) -> ApiResult<User> {
        let resp: UserResponse = self.get_json("/api/user").await?;
        Ok(resp.user)
    }

    /// The organization the credential is scoped to.
    pub async fn current_organization(&self) -> ApiResult<Organization> {
        self.get_json("/api/org").await
    }
}
