pub mod dto;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use dto::{Field, ProfileForm};
pub use repo_types::{NewUser, User};
