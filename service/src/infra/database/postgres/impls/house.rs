//! [`House`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        house::{self, address},
        House,
    },
    infra::{
        database::{
            self,
            postgres::{Connection, LikePattern},
            Postgres,
        },
        Database,
    },
    read,
};

/// Columns of a [`House`] row.
const COLUMNS: &str = "\
    id, address, apartments, total_area, build_year, floors, created_at";

/// Reads a [`House`] from the provided [`Row`] selected with [`COLUMNS`].
fn from_row(row: &Row) -> House {
    House {
        id: row.get("id"),
        address: row.get("address"),
        apartments: row.get("apartments"),
        total_area: row.get("total_area"),
        build_year: row.get("build_year"),
        floors: row.get("floors"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Vec<House>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<House>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<House>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!("SELECT {COLUMNS} FROM houses ORDER BY id");
        Ok(self
            .query(&sql, &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Option<House>, house::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<House>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<House>, house::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: house::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM houses \
             WHERE id = $1::INT4"
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<House>, address::Fragment>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<House>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<House>, address::Fragment>>,
    ) -> Result<Self::Ok, Self::Err> {
        let pattern = LikePattern::containing(by.into_inner().as_ref());

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM houses \
             WHERE address ILIKE $1::VARCHAR \
             ORDER BY address, id"
        );
        Ok(self
            .query(&sql, &[&pattern])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<House>, read::house::OlderThan>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<House>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<House>, read::house::OlderThan>>,
    ) -> Result<Self::Ok, Self::Err> {
        let years = by.into_inner().years();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM houses \
             WHERE build_year < \
                   EXTRACT(YEAR FROM CURRENT_DATE)::INT4 - $1::INT4 \
             ORDER BY build_year, id"
        );
        Ok(self
            .query(&sql, &[&years])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<read::house::TotalCount, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::house::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<By<read::house::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM houses";
        self.query_opt(SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i32>(0).into())
    }
}

impl<C> Database<Insert<house::Draft>> for Postgres<C>
where
    C: Connection,
{
    type Ok = House;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(draft): Insert<house::Draft>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO houses (\
                address, apartments, total_area, build_year, floors\
            ) \
            VALUES (\
                $1::VARCHAR, $2::INT4, $3::NUMERIC, $4::INT4, $5::INT4\
            ) \
            RETURNING id, created_at";
        let row = self
            .query_opt(
                SQL,
                &[
                    &draft.address,
                    &draft.apartments,
                    &draft.total_area,
                    &draft.build_year,
                    &draft.floors,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .expect("always exists");

        Ok(draft.into_house(row.get("id"), row.get("created_at")))
    }
}

impl<C> Database<Update<House>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(house): Update<House>,
    ) -> Result<Self::Ok, Self::Err> {
        let House {
            id,
            address,
            apartments,
            total_area,
            build_year,
            floors,
            created_at: _,
        } = house;

        const SQL: &str = "\
            UPDATE houses \
            SET address = $2::VARCHAR, \
                apartments = $3::INT4, \
                total_area = $4::NUMERIC, \
                build_year = $5::INT4, \
                floors = $6::INT4 \
            WHERE id = $1::INT4";
        self.exec(
            SQL,
            &[
                &id,
                &address,
                &apartments,
                &total_area,
                &build_year,
                &floors,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<House, house::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<House, house::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: house::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM houses \
            WHERE id = $1::INT4";
        self.exec(SQL, &[&id]).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Delete<By<House, house::Criterion>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<House, house::Criterion>>,
    ) -> Result<Self::Ok, Self::Err> {
        let deleted = match by.into_inner() {
            house::Criterion::BuildYear(year) => {
                const SQL: &str = "\
                    DELETE FROM houses \
                    WHERE build_year = $1::INT4";
                self.exec(SQL, &[&year]).await
            }
            house::Criterion::Apartments(bounds) => {
                const SQL: &str = "\
                    DELETE FROM houses \
                    WHERE apartments BETWEEN $1::INT4 AND $2::INT4";
                self.exec(SQL, &[&bounds.min(), &bounds.max()]).await
            }
            house::Criterion::TotalArea(bounds) => {
                const SQL: &str = "\
                    DELETE FROM houses \
                    WHERE total_area BETWEEN $1::NUMERIC AND $2::NUMERIC";
                self.exec(SQL, &[&bounds.min(), &bounds.max()]).await
            }
            house::Criterion::Address(fragment) => {
                let pattern = LikePattern::containing(fragment.as_ref());

                const SQL: &str = "\
                    DELETE FROM houses \
                    WHERE address ILIKE $1::VARCHAR";
                self.exec(SQL, &[&pattern]).await
            }
        };
        deleted.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Lock<By<House, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    /// Locks the whole registry against concurrent modifications until the
    /// end of the current transaction, while still allowing reads.
    async fn execute(
        &self,
        _: Lock<By<House, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "LOCK TABLE houses IN SHARE ROW EXCLUSIVE MODE";
        self.batch_exec(SQL).await.map_err(tracerr::wrap!())
    }
}
