//! [`Duplicates`] definition.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{
        house::{
            self,
            similarity::{self, Comparable as _, Score},
        },
        House,
    },
    infra::{database, Database},
    read, Query, Service,
};

/// [`Query`] checking whether a [`house::Draft`] duplicates any of the
/// registered [`House`]s, without registering it.
#[derive(Clone, Debug)]
pub struct Duplicates {
    /// [`house::Draft`] to check.
    pub house: house::Draft,

    /// ID of the [`House`] being edited, if any.
    ///
    /// This [`House`] is never reported as a duplicate of itself.
    pub id: Option<house::Id>,

    /// [`Score`] threshold of similarity.
    ///
    /// The configured one is used, if [`None`].
    pub threshold: Option<Score>,
}

impl<Db> Query<Duplicates> for Service<Db>
where
    Db: Database<
        Select<By<Vec<House>, ()>>,
        Ok = Vec<House>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = read::house::Duplicates;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Duplicates {
            house,
            id,
            threshold,
        }: Duplicates,
    ) -> Result<Self::Ok, Self::Err> {
        let snapshot = self
            .database()
            .execute(Select(By::<Vec<House>, _>::new(())))
            .await
            .map_err(tracerr::wrap!())?;

        let mut candidate = house.record();
        candidate.id = id;
        let threshold =
            threshold.unwrap_or(self.config().similarity_threshold);

        Ok(read::house::Duplicates {
            exact: similarity::exists_exact(&candidate, &snapshot),
            similar: similarity::find_similar(&candidate, snapshot, threshold),
        })
    }
}
