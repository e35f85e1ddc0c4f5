use std::sync::Arc;

use tracing::debug;

use crate::api::ApiClient;
use crate::cli::error::{CliError, CliResult};
use crate::core::auth::AuthService;
use crate::core::config::{Config, ConfigFile, Endpoints};
use crate::core::credentials::{CredentialStore, KeyringCredentialStore};
use crate::core::store::ClientState;

/// Everything a subcommand needs: configuration, restored client state and
/// an API client bound to the session.
pub struct CliContext {
    pub config: Config,
    pub endpoints: Endpoints,
    pub state: ClientState,
    pub api: ApiClient,
}

impl CliContext {
    pub fn load(file: &ConfigFile, api_url: Option<String>) -> CliResult<Self> {
        let config = file.load()?;
        Ok(Self::with_credentials(
            config,
            api_url,
            Arc::new(KeyringCredentialStore::new()),
        ))
    }

    pub fn with_credentials(
        config: Config,
        api_url: Option<String>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let mut endpoints = config.endpoints();
        if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
            endpoints.api_base_url = url;
        }
        debug!(api = %endpoints.api_base_url, "using API endpoint");

        let state = ClientState::init(credentials);
        let api = ApiClient::new(endpoints.api_base_url.clone(), state.session.clone());
        Self {
            config,
            endpoints,
            state,
            api,
        }
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone())
    }

    /// Fail early when no credential was restored.
    pub fn require_session(&self) -> CliResult<()> {
        if self.state.session.is_authenticated() {
            Ok(())
        } else {
            Err(CliError::NotSignedIn)
        }
    }
}
