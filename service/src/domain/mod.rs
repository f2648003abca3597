//! Domain definitions.

pub mod house;
pub mod user;

pub use self::{house::House, user::User};
