//! User endpoints (`/users`)

use log::info;
use serde::Serialize;
use serde_json::{json, Value};

use super::TonicPow;
use crate::error::{Result, TonicPowError};
use crate::http::ApiRequest;
use crate::session::TokenSlot;
use crate::utils::QueryBuilder;

/// How to look a user up in [`TonicPow::get_user`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Id(u64),
    Email(String),
}

impl TonicPow {
    /// Log a user in with the API session; returns the new user token.
    pub async fn login_user(&mut self, email: &str, password: &str) -> Result<String> {
        let body = json!({ "email": email, "password": password });
        let request = ApiRequest::post("/users/login", body).with_intent(TokenSlot::User);
        let response = self.request_raw(request).await?;

        let token = response
            .token_change
            .as_ref()
            .filter(|change| change.slot == TokenSlot::User)
            .and_then(|change| change.token())
            .ok_or(TonicPowError::MissingSessionCookie)?;
        info!("user logged in");
        Ok(token.to_string())
    }

    /// End a user session (the given token, or the stored user token).
    pub async fn logout_user(&mut self, session_token: Option<&str>) -> Result<Value> {
        let token = self.user_session_token(session_token)?;
        let request = ApiRequest::delete("/users/logout").with_session_token(Some(&token));
        let body = self.request(request).await?;

        if self.session.user_token() == Some(token.as_str()) {
            self.session.clear_token(TokenSlot::User);
        }
        info!("user logged out");
        Ok(body)
    }

    /// Profile of the user behind the given or stored user token.
    pub async fn current_user(&mut self, session_token: Option<&str>) -> Result<Value> {
        let token = self.user_session_token(session_token)?;
        self.get("/users/account", Some(&token)).await
    }

    pub async fn get_user(&mut self, lookup: &UserLookup) -> Result<Value> {
        let query = match lookup {
            UserLookup::Id(id) => QueryBuilder::new().pair("id", id),
            UserLookup::Email(email) => QueryBuilder::new().pair("email", email),
        };
        self.get(&query.apply("/users/details"), None).await
    }

    /// Refresh a user's balance from the chain and return the user.
    pub async fn get_user_balance(&mut self, user_id: u64) -> Result<Value> {
        self.get(&format!("/users/balance/{}", user_id), None).await
    }

    /// Create a user; the payload must carry a non-empty `email`.
    pub async fn create_user<T: Serialize + ?Sized>(&mut self, user: &T) -> Result<Value> {
        let user = serde_json::to_value(user)?;
        let has_email = user
            .get("email")
            .and_then(Value::as_str)
            .is_some_and(|email| !email.trim().is_empty());
        if !has_email {
            return Err(TonicPowError::MissingField("email"));
        }
        self.request(ApiRequest::post("/users", user)).await
    }

    pub async fn update_user<T: Serialize + ?Sized>(
        &mut self,
        user: &T,
        session_token: Option<&str>,
    ) -> Result<Value> {
        self.put("/users", user, session_token).await
    }

    pub async fn forgot_password(&mut self, email: &str) -> Result<Value> {
        self.post("/users/password/forgot", &json!({ "email": email }), None)
            .await
    }

    pub async fn reset_password(
        &mut self,
        reset_token: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<Value> {
        let body = json!({
            "token": reset_token,
            "password": password,
            "password_confirm": password_confirm,
        });
        self.put("/users/password/reset", &body, None).await
    }

    pub async fn complete_email_verification(&mut self, email_token: &str) -> Result<Value> {
        self.put("/users/verify/email", &json!({ "token": email_token }), None)
            .await
    }

    pub async fn complete_phone_verification(
        &mut self,
        phone: &str,
        phone_code: &str,
    ) -> Result<Value> {
        let body = json!({ "phone": phone, "phone_code": phone_code });
        self.put("/users/verify/phone", &body, None).await
    }

    /// Activate a user once all application criteria are met.
    pub async fn activate_user(&mut self, user_id: u64) -> Result<Value> {
        self.put("/users/status/activate", &json!({ "id": user_id }), None)
            .await
    }

    /// Pause a user (payouts go to an internal address).
    pub async fn pause_user(&mut self, user_id: u64, reason: &str) -> Result<Value> {
        let body = json!({ "id": user_id, "reason": reason });
        self.put("/users/status/pause", &body, None).await
    }
}
