//! Durable store implementations.

pub mod inmemory;
pub mod seed;

pub use inmemory::InMemoryChatRepository;
pub use seed::{SeedError, SeedParticipant, load_seed_file};
