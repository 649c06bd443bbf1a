//! Tracking link endpoints

use serde::Serialize;
use serde_json::Value;

use super::TonicPow;
use crate::error::Result;
use crate::utils::UrlUtils;

impl TonicPow {
    pub async fn create_link<T: Serialize + ?Sized>(
        &mut self,
        link: &T,
        session_token: Option<&str>,
    ) -> Result<Value> {
        self.post("/links", link, session_token).await
    }

    pub async fn get_link(&mut self, link_id: u64, session_token: Option<&str>) -> Result<Value> {
        let path = format!("/links/details/{}", UrlUtils::segment(link_id));
        self.get(&path, session_token).await
    }

    /// Resolve a short code to its link.
    pub async fn check_link(&mut self, short_code: &str) -> Result<Value> {
        let path = format!("/links/check/{}", UrlUtils::segment(short_code));
        self.get(&path, None).await
    }

    pub async fn get_user_links(
        &mut self,
        user_id: u64,
        session_token: Option<&str>,
    ) -> Result<Value> {
        let path = format!("/links/user/{}", UrlUtils::segment(user_id));
        self.get(&path, session_token).await
    }
}
