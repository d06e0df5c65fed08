//! Identity verifier implementations.

pub mod jwt;

pub use jwt::{Claims, JwtIdentityVerifier};
