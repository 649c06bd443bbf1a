//! Goal endpoints

use serde::Serialize;
use serde_json::Value;

use super::TonicPow;
use crate::error::Result;
use crate::utils::UrlUtils;

impl TonicPow {
    pub async fn create_goal<T: Serialize + ?Sized>(
        &mut self,
        goal: &T,
        session_token: Option<&str>,
    ) -> Result<Value> {
        self.post("/goals", goal, session_token).await
    }

    pub async fn get_goal(&mut self, goal_id: u64, session_token: Option<&str>) -> Result<Value> {
        let path = format!("/goals/details/{}", UrlUtils::segment(goal_id));
        self.get(&path, session_token).await
    }

    pub async fn update_goal<T: Serialize + ?Sized>(
        &mut self,
        goal: &T,
        session_token: Option<&str>,
    ) -> Result<Value> {
        self.put("/goals", goal, session_token).await
    }
}
