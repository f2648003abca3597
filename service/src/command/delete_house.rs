//! [`Command`] for deleting a [`House`].

use common::operations::{By, Delete};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{house, House},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`House`].
#[derive(Clone, Copy, Debug, From)]
pub struct DeleteHouse {
    /// ID of the [`House`] to delete.
    pub id: house::Id,
}

impl<Db> Command<DeleteHouse> for Service<Db>
where
    Db: Database<
        Delete<By<House, house::Id>>,
        Ok = u64,
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteHouse) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteHouse { id } = cmd;

        let deleted = self
            .database()
            .execute(Delete(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if deleted == 0 {
            return Err(tracerr::new!(E::HouseNotExists(id)));
        }

        tracing::info!(%id, "deleted `House`");

        Ok(())
    }
}

/// Error of [`DeleteHouse`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`House`] doesn't exist.
    #[display("`House(id: {_0})` does not exist")]
    #[from(ignore)]
    HouseNotExists(#[error(not(source))] house::Id),
}
