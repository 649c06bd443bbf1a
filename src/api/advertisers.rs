//! Advertiser profile endpoints

use serde::Serialize;
use serde_json::Value;

use super::TonicPow;
use crate::error::Result;
use crate::utils::UrlUtils;

impl TonicPow {
    pub async fn create_advertiser_profile<T: Serialize + ?Sized>(
        &mut self,
        profile: &T,
        session_token: Option<&str>,
    ) -> Result<Value> {
        self.post("/advertisers", profile, session_token).await
    }

    pub async fn get_advertiser_profile(
        &mut self,
        profile_id: u64,
        session_token: Option<&str>,
    ) -> Result<Value> {
        let path = format!("/advertisers/details/{}", UrlUtils::segment(profile_id));
        self.get(&path, session_token).await
    }

    pub async fn update_advertiser_profile<T: Serialize + ?Sized>(
        &mut self,
        profile: &T,
        session_token: Option<&str>,
    ) -> Result<Value> {
        self.put("/advertisers", profile, session_token).await
    }
}
