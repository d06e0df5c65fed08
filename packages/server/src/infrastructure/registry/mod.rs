//! Connection registry implementations.

pub mod inmemory;

pub use inmemory::InMemoryConnectionRegistry;
