//! Visitor session endpoints

use serde::Serialize;
use serde_json::Value;

use super::TonicPow;
use crate::error::Result;
use crate::utils::UrlUtils;

impl TonicPow {
    pub async fn create_visitor_session<T: Serialize + ?Sized>(
        &mut self,
        visitor: &T,
    ) -> Result<Value> {
        self.post("/visitors/sessions", visitor, None).await
    }

    pub async fn get_visitor_session(&mut self, visitor_session: &str) -> Result<Value> {
        let path = format!(
            "/visitors/sessions/details/{}",
            UrlUtils::segment(visitor_session)
        );
        self.get(&path, None).await
    }
}
