pub mod decisions_repo;

pub use decisions_repo::DecisionsRepository;
