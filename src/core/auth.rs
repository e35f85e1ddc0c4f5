use tracing::{debug, info};

use crate::api::models::{
    LoginRequest, PasswordChangeRequest, RegisterRequest, UpdateProfileRequest, User,
};
use crate::api::{ApiClient, ApiResult};
use crate::core::store::SessionStore;

/// Sign-in, sign-out and profile operations on top of the session store.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn session(&self) -> &SessionStore {
        self.api.session()
    }

    pub async fn login(&self, username: &str, password: &str) -> ApiResult<User> {
        let response = self
            .api
            .login(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;
        info!(user = %response.user.username, "signed in");
        self.session()
            .sign_in(response.user.clone(), &response.tokens);
        Ok(response.user)
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<User> {
        let response = self.api.register(request).await?;
        info!(user = %response.user.username, "registered");
        self.session()
            .sign_in(response.user.clone(), &response.tokens);
        Ok(response.user)
    }

    pub fn logout(&self) {
        debug!("signing out");
        self.session().clear();
    }

    /// Load the current user. A rejected credential ends the session.
    pub async fn fetch_user(&self) -> ApiResult<User> {
        match self.api.me().await {
            Ok(user) => {
                self.session().set_user(user.clone());
                Ok(user)
            }
            Err(err) => {
                if err.is_unauthorized() {
                    self.session().clear();
                }
                Err(err)
            }
        }
    }

    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> ApiResult<User> {
        let user = self.api.update_profile(request).await?;
        self.session().set_user(user.clone());
        Ok(user)
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> ApiResult<()> {
        self.api
            .change_password(&PasswordChangeRequest {
                old_password: old_password.to_string(),
                new_password: new_password.to_string(),
            })
            .await
    }
}
