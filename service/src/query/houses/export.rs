//! [`Export`] definition.

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::House,
    export::{self, Layout},
    infra::{database, Database},
    read::house::list::Selector,
    Query, Service,
};

/// [`Query`] exporting a [`House`] list into a delimited text.
#[derive(Clone, Debug, Default)]
pub struct Export {
    /// [`Selector`] of the exported [`House`]s.
    pub selector: Selector,

    /// [`Layout`] of the export.
    pub layout: Layout,
}

impl<Db> Query<Export> for Service<Db>
where
    Db: Database<
        Select<By<Vec<House>, ()>>,
        Ok = Vec<House>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = String;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        Export { selector, layout }: Export,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let houses = self
            .database()
            .execute(Select(By::<Vec<House>, _>::new(())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let houses = selector.select(houses);

        let out = export::render(&houses, &layout, DateTime::current_year())
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tracing::info!(
            houses = houses.len(),
            fields = layout.fields.len(),
            "exported `House`s",
        );

        Ok(out)
    }
}

/// Error of [`Export`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Rendering error.
    #[display("Export failed: {_0}")]
    Export(export::Error),
}
