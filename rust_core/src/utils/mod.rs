//! Small shared utilities.

pub mod ident;
pub mod odds;

pub use ident::normalize_username;
pub use odds::{parse_decimal_odds, round_points};
