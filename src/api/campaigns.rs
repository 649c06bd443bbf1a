//! Campaign endpoints

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use super::TonicPow;
use crate::error::{Result, TonicPowError};
use crate::utils::{QueryBuilder, UrlUtils};

/// Search parameters for [`TonicPow::find_campaigns`]; unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignSearch {
    pub current_page: Option<u32>,
    pub results_per_page: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search_query: Option<String>,
}

impl CampaignSearch {
    fn apply(&self, path: &str) -> String {
        QueryBuilder::new()
            .optional("current_page", self.current_page)
            .optional("results_per_page", self.results_per_page)
            .optional("sort_by", self.sort_by.as_deref())
            .optional("sort_order", self.sort_order.as_deref())
            .optional("search_query", self.search_query.as_deref())
            .apply(path)
    }
}

/// Format of the public campaigns feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedType {
    #[default]
    Rss,
    Atom,
    Json,
}

impl FeedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedType::Rss => "rss",
            FeedType::Atom => "atom",
            FeedType::Json => "json",
        }
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedType {
    type Err = TonicPowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rss" => Ok(FeedType::Rss),
            "atom" => Ok(FeedType::Atom),
            "json" => Ok(FeedType::Json),
            other => Err(TonicPowError::InvalidArgument(format!(
                "unknown feed type '{}'",
                other
            ))),
        }
    }
}

impl TonicPow {
    pub async fn create_campaign<T: Serialize + ?Sized>(
        &mut self,
        campaign: &T,
        session_token: Option<&str>,
    ) -> Result<Value> {
        self.post("/campaigns", campaign, session_token).await
    }

    pub async fn get_campaign(
        &mut self,
        campaign_id: u64,
        session_token: Option<&str>,
    ) -> Result<Value> {
        let path = format!("/campaigns/details/{}", UrlUtils::segment(campaign_id));
        self.get(&path, session_token).await
    }

    /// Refresh a campaign's balance and return the campaign.
    pub async fn get_campaign_balance(
        &mut self,
        campaign_id: u64,
        session_token: Option<&str>,
    ) -> Result<Value> {
        let path = format!("/campaigns/balance/{}", UrlUtils::segment(campaign_id));
        self.get(&path, session_token).await
    }

    pub async fn update_campaign<T: Serialize + ?Sized>(
        &mut self,
        campaign: &T,
        session_token: Option<&str>,
    ) -> Result<Value> {
        self.put("/campaigns", campaign, session_token).await
    }

    pub async fn list_campaigns(&mut self, session_token: Option<&str>) -> Result<Value> {
        self.get("/campaigns/list", session_token).await
    }

    pub async fn find_campaigns(&mut self, search: &CampaignSearch) -> Result<Value> {
        self.get(&search.apply("/campaigns/find"), None).await
    }

    /// Public feed of active campaigns. Non-JSON feeds come back as a string body.
    pub async fn campaigns_feed(&mut self, feed_type: FeedType) -> Result<Value> {
        let path = QueryBuilder::new()
            .pair("feed_type", feed_type)
            .apply("/campaigns/feed");
        self.get(&path, None).await
    }

    pub async fn campaign_statistics(&mut self) -> Result<Value> {
        self.get("/campaigns/statistics", None).await
    }

    pub async fn get_campaign_by_short_code(&mut self, short_code: &str) -> Result<Value> {
        let path = format!("/campaigns/link/{}", UrlUtils::segment(short_code));
        self.get(&path, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_only_sends_set_fields() {
        let search = CampaignSearch {
            current_page: Some(1),
            sort_by: Some("created_at".to_string()),
            sort_order: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            search.apply("/campaigns/find"),
            "/campaigns/find?current_page=1&sort_by=created_at"
        );
        assert_eq!(
            CampaignSearch::default().apply("/campaigns/find"),
            "/campaigns/find"
        );
    }

    #[test]
    fn feed_type_parses_case_insensitively() {
        assert_eq!("ATOM".parse::<FeedType>().unwrap(), FeedType::Atom);
        assert_eq!(FeedType::default().to_string(), "rss");
        assert!("csv".parse::<FeedType>().is_err());
    }
}
