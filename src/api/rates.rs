//! Exchange rates

use serde_json::Value;

use super::TonicPow;
use crate::error::Result;
use crate::utils::{QueryBuilder, UrlUtils};

impl TonicPow {
    /// Current rate for `currency`, converting `amount` units of it.
    pub async fn get_current_rate(&mut self, currency: &str, amount: f64) -> Result<Value> {
        let path = QueryBuilder::new()
            .pair("amount", amount)
            .apply(&format!("/rates/{}", UrlUtils::segment(currency.trim())));
        self.get(&path, None).await
    }
}
