pub mod password_reset;
pub mod register;
pub mod session;

pub use password_reset::{forgot_password, reset_password};
pub use register::register;
pub use session::{login, logout, refresh, verify};
