pub mod audit;
pub mod authenticator;
pub mod chaos;
pub mod metrics;
pub mod password;
pub mod token;
