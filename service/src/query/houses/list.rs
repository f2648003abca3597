//! [`List`] definition.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::House,
    infra::{database, Database},
    read::house::list::Selector,
    Query, Service,
};

/// [`Query`] of a filtered and sorted [`House`] list.
#[derive(Clone, Debug, Default)]
pub struct List {
    /// [`Selector`] of the list.
    pub selector: Selector,
}

impl<Db> Query<List> for Service<Db>
where
    Db: Database<
        Select<By<Vec<House>, ()>>,
        Ok = Vec<House>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<House>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        List { selector }: List,
    ) -> Result<Self::Ok, Self::Err> {
        let houses = self
            .database()
            .execute(Select(By::<Vec<House>, _>::new(())))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(selector.select(houses))
    }
}
