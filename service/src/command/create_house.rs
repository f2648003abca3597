//! [`Command`] for registering a new [`House`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        house::{
            self,
            similarity::{self, Comparable as _, Match},
        },
        House,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for registering a new [`House`].
#[derive(Clone, Debug)]
pub struct CreateHouse {
    /// Attributes of the new [`House`].
    pub house: house::Draft,

    /// Indicator whether the [`House`] should be registered even if similar
    /// ones exist already.
    pub allow_similar: bool,
}

impl<Db> Command<CreateHouse> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<House, ()>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<House>, ()>>,
            Ok = Vec<House>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<house::Draft>,
            Ok = House,
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = House;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateHouse) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateHouse {
            house: draft,
            allow_similar,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent registration of the same `House`.
        tx.execute(Lock(By::<House, _>::new(())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let snapshot = tx
            .execute(Select(By::<Vec<House>, _>::new(())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let candidate = draft.record();
        if similarity::exists_exact(&candidate, &snapshot) {
            tracing::info!(
                address = %draft.address,
                "rejected `House` with occupied address",
            );
            return Err(tracerr::new!(E::AddressOccupied(draft.address)));
        }

        let similar = similarity::find_similar(
            &candidate,
            snapshot,
            self.config().similarity_threshold,
        );
        if !similar.is_empty() && !allow_similar {
            tracing::info!(
                address = %draft.address,
                similar = similar.len(),
                "rejected `House` having similar ones",
            );
            return Err(tracerr::new!(E::SimilarExist(similar)));
        }

        let house = tx
            .execute(Insert(draft))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tracing::info!(id = %house.id, "registered `House`");

        Ok(house)
    }
}

/// Error of [`CreateHouse`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`House`] with the same normalized [`house::Address`] is registered
    /// already.
    #[display("`House` with `{_0}` address is registered already")]
    #[from(ignore)]
    AddressOccupied(#[error(not(source))] house::Address),

    /// Similar [`House`]s are registered already.
    #[display("{} similar `House`s are registered already", _0.len())]
    #[from(ignore)]
    SimilarExist(#[error(not(source))] Vec<Match<House>>),
}
