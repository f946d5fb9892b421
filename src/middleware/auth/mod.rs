//! Credential extraction per chain.
//!
//! Both mechanisms only populate the `SecurityContext`; deciding whether the
//! request may proceed is `middleware::security`'s job.
pub mod basic;
pub mod bearer;
