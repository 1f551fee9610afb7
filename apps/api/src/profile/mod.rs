// Profile: the signed-in user's display name and picture.

pub mod handlers;
pub mod repository;

pub use repository::{PgProfileRepository, ProfileRepository};
