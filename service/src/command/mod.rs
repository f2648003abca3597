//! [`Command`] definition.

pub mod authorize_user_session;
pub mod create_house;
pub mod create_user;
pub mod create_user_session;
pub mod delete_house;
pub mod delete_houses;
pub mod update_house;
pub mod update_user_password;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession, create_house::CreateHouse,
    create_user::CreateUser, create_user_session::CreateUserSession,
    delete_house::DeleteHouse, delete_houses::DeleteHouses,
    update_house::UpdateHouse, update_user_password::UpdateUserPassword,
};
