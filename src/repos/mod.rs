pub mod error;
pub mod user_lookup;
