//! Infrastructure layer: concrete implementations of the domain seams.

pub mod dto;
pub mod identity;
pub mod registry;
pub mod repository;
