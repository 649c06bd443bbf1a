//! tonicpow - A client for the TonicPow API
//!
//! This crate keeps an API session and a user session per client, moving
//! both through a per-client cookie jar around every call.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod exit_code;
pub mod http;
pub mod logging;
pub mod session;
pub mod utils;

pub use api::{CampaignSearch, ConversionOptions, FeedType, TonicPow, UserLookup};
pub use config::{ClientOptions, Config, Environment};
pub use error::{ApiError, Result, TonicPowError};
pub use session::{SameSite, Session, TokenSlot, TokenUpdate};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
