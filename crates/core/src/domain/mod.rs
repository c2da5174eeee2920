pub mod interaction;
pub mod user;
