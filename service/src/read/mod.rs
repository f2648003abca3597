//! Read entities definitions.

pub mod house;
pub mod user;
