pub mod admin;
pub mod profile;

pub use admin::{get_user, list_users, update_role, user_stats};
pub use profile::{change_password, delete_account, get_profile, update_profile};
