//! [`Command`] for updating a registered [`House`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
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

/// [`Command`] for updating a registered [`House`] as a whole.
#[derive(Clone, Debug)]
pub struct UpdateHouse {
    /// ID of the [`House`] to update.
    pub id: house::Id,

    /// New attributes of the [`House`].
    pub house: house::Draft,

    /// Indicator whether the [`House`] should be updated even if similar
    /// ones exist already.
    pub allow_similar: bool,
}

impl<Db> Command<UpdateHouse> for Service<Db>
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
        > + Database<Update<House>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = House;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateHouse) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateHouse {
            id,
            house: draft,
            allow_similar,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<House, _>::new(())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let snapshot = tx
            .execute(Select(By::<Vec<House>, _>::new(())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let created_at = snapshot
            .iter()
            .find(|h| h.id == id)
            .map(|h| h.created_at)
            .ok_or(E::HouseNotExists(id))
            .map_err(tracerr::wrap!())?;

        let mut candidate = draft.record();
        candidate.id = Some(id);
        if similarity::exists_exact(&candidate, &snapshot) {
            tracing::info!(
                %id,
                address = %draft.address,
                "rejected `House` update with occupied address",
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
                %id,
                similar = similar.len(),
                "rejected `House` update having similar ones",
            );
            return Err(tracerr::new!(E::SimilarExist(similar)));
        }

        let house = draft.into_house(id, created_at);
        tx.execute(Update(house.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tracing::info!(%id, "updated `House`");

        Ok(house)
    }
}

/// Error of [`UpdateHouse`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`House`] doesn't exist.
    #[display("`House(id: {_0})` does not exist")]
    #[from(ignore)]
    HouseNotExists(#[error(not(source))] house::Id),

    /// Another [`House`] with the same normalized [`house::Address`] is
    /// registered already.
    #[display("`House` with `{_0}` address is registered already")]
    #[from(ignore)]
    AddressOccupied(#[error(not(source))] house::Address),

    /// Similar [`House`]s are registered already.
    #[display("{} similar `House`s are registered already", _0.len())]
    #[from(ignore)]
    SimilarExist(#[error(not(source))] Vec<Match<House>>),
}
