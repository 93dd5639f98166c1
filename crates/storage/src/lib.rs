pub mod db;
pub mod repositories;

pub use repositories::DecisionsRepository;
