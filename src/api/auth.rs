use reqwest::Method;

use super::{decode, ApiClient, ApiResult};
use crate::api::models::{
    AuthResponse, LoginRequest, PasswordChangeRequest, RegisterRequest, UpdateProfileRequest,
    User,
};

impl ApiClient {
    pub async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        let endpoint = "auth/login";
        let response = self
            .execute_public(endpoint, |http, url| http.post(url).json(request))
            .await?;
        decode(endpoint, response).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        let endpoint = "auth/register";
        let response = self
            .execute_public(endpoint, |http, url| http.post(url).json(request))
            .await?;
        decode(endpoint, response).await
    }

    pub async fn me(&self) -> ApiResult<User> {
        self.get_json("auth/me", &[]).await
    }

    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> ApiResult<User> {
        self.send_json(Method::PUT, "auth/me", Some(request)).await
    }

    pub async fn change_password(&self, request: &PasswordChangeRequest) -> ApiResult<()> {
        let _: serde_json::Value = self
            .send_json(Method::PUT, "auth/me/password", Some(request))
            .await?;
        Ok(())
    }
}
