//! [`Similar`] definition.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{
        house::{
            self,
            similarity::{self, Comparable as _, Match, Score},
        },
        House,
    },
    infra::{database, Database},
    Query, Service,
};

/// [`Query`] looking up the registered [`House`]s similar to a
/// [`house::Draft`].
///
/// Unlike the [`Duplicates`] check made before saving, this lookup is
/// stricter by default, using [`Score::DEFAULT_THRESHOLD`].
///
/// [`Duplicates`]: super::Duplicates
#[derive(Clone, Debug)]
pub struct Similar {
    /// [`house::Draft`] to look up similar [`House`]s for.
    pub house: house::Draft,

    /// ID of the [`House`] the [`house::Draft`] belongs to, if any.
    pub id: Option<house::Id>,

    /// [`Score`] threshold of similarity.
    ///
    /// [`Score::DEFAULT_THRESHOLD`] is used, if [`None`].
    pub threshold: Option<Score>,
}

impl<Db> Query<Similar> for Service<Db>
where
    Db: Database<
        Select<By<Vec<House>, ()>>,
        Ok = Vec<House>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Match<House>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Similar {
            house,
            id,
            threshold,
        }: Similar,
    ) -> Result<Self::Ok, Self::Err> {
        let snapshot = self
            .database()
            .execute(Select(By::<Vec<House>, _>::new(())))
            .await
            .map_err(tracerr::wrap!())?;

        let mut candidate = house.record();
        candidate.id = id;

        Ok(similarity::find_similar(
            &candidate,
            snapshot,
            threshold.unwrap_or(Score::DEFAULT_THRESHOLD),
        ))
    }
}
