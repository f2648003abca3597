//! [`Command`] for deleting multiple [`House`]s at once.

use common::operations::{By, Delete};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{house, House},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting all the [`House`]s matching a
/// [`house::Criterion`].
#[derive(Clone, Debug, From)]
pub struct DeleteHouses {
    /// [`house::Criterion`] of the [`House`]s to delete.
    pub criterion: house::Criterion,
}

impl<Db> Command<DeleteHouses> for Service<Db>
where
    Db: Database<
        Delete<By<House, house::Criterion>>,
        Ok = u64,
        Err = Traced<database::Error>,
    >,
{
    /// Number of deleted [`House`]s.
    type Ok = u64;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteHouses) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteHouses { criterion } = cmd;

        let deleted = self
            .database()
            .execute(Delete(By::new(criterion.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tracing::info!(?criterion, deleted, "deleted `House`s in bulk");

        Ok(deleted)
    }
}

/// Error of [`DeleteHouses`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}
