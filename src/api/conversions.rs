//! Conversion endpoints
//!
//! A conversion is fired against a goal, either by goal id or goal name for a
//! visitor session, or by goal id for a known user.

use serde_json::{json, Value};

use super::TonicPow;
use crate::error::{Result, TonicPowError};
use crate::utils::UrlUtils;

/// Optional fields shared by all conversion triggers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionOptions {
    pub additional_data: String,
    /// Delay before the conversion is processed (0 = immediately)
    pub delay_in_minutes: u32,
}

fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TonicPowError::MissingField(field));
    }
    Ok(value)
}

impl TonicPow {
    pub async fn get_conversion(&mut self, conversion_id: u64) -> Result<Value> {
        let path = format!("/conversions/details/{}", UrlUtils::segment(conversion_id));
        self.get(&path, None).await
    }

    pub async fn create_conversion_by_goal_id(
        &mut self,
        goal_id: u64,
        visitor_session: &str,
        options: &ConversionOptions,
    ) -> Result<Value> {
        let visitor_session = require(visitor_session, "tncpw_session")?;
        let body = json!({
            "goal_id": goal_id,
            "tncpw_session": visitor_session,
            "additional_data": options.additional_data,
            "delay_in_minutes": options.delay_in_minutes,
        });
        self.post("/conversions", &body, None).await
    }

    pub async fn create_conversion_by_goal_name(
        &mut self,
        goal_name: &str,
        visitor_session: &str,
        options: &ConversionOptions,
    ) -> Result<Value> {
        let goal_name = require(goal_name, "goal name")?;
        let visitor_session = require(visitor_session, "tncpw_session")?;
        let body = json!({
            "name": goal_name,
            "tncpw_session": visitor_session,
            "additional_data": options.additional_data,
            "delay_in_minutes": options.delay_in_minutes,
        });
        self.post("/conversions", &body, None).await
    }

    pub async fn create_conversion_by_user_id(
        &mut self,
        goal_id: u64,
        user_id: u64,
        options: &ConversionOptions,
    ) -> Result<Value> {
        let body = json!({
            "goal_id": goal_id,
            "user_id": user_id,
            "additional_data": options.additional_data,
            "delay_in_minutes": options.delay_in_minutes,
        });
        self.post("/conversions", &body, None).await
    }

    /// Cancel a delayed conversion before it is processed.
    pub async fn cancel_conversion(&mut self, conversion_id: u64, reason: &str) -> Result<Value> {
        let body = json!({ "id": conversion_id, "reason": reason });
        self.put("/conversions/cancel", &body, None).await
    }
}
