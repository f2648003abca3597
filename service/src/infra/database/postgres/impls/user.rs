//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Reads a [`User`] from the provided [`Row`].
fn from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        login: row.get("login"),
        password_hash: row.get("password_hash"),
        salt: row.get("salt"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, login, password_hash, salt, created_at \
            FROM users \
            WHERE id = $1::INT4";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<'l, C> Database<Select<By<Option<User>, &'l user::Login>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();

        const SQL: &str = "\
            SELECT id, login, password_hash, salt, created_at \
            FROM users \
            WHERE login = $1::VARCHAR \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[login])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Insert<user::Draft>> for Postgres<C>
where
    C: Connection,
{
    type Ok = User;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(draft): Insert<user::Draft>,
    ) -> Result<Self::Ok, Self::Err> {
        let user::Draft {
            login,
            password_hash,
            salt,
        } = draft;

        const SQL: &str = "\
            INSERT INTO users (login, password_hash, salt) \
            VALUES ($1::VARCHAR, $2::VARCHAR, $3::VARCHAR) \
            RETURNING id, created_at";
        let row = self
            .query_opt(SQL, &[&login, &password_hash, &salt])
            .await
            .map_err(tracerr::wrap!())?
            .expect("always exists");

        Ok(User {
            id: row.get("id"),
            login,
            password_hash,
            salt,
            created_at: row.get("created_at"),
        })
    }
}

impl<C> Database<Update<User>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    /// Updates the credentials of the provided [`User`].
    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let User {
            id,
            login: _,
            password_hash,
            salt,
            created_at: _,
        } = user;

        const SQL: &str = "\
            UPDATE users \
            SET password_hash = $2::VARCHAR, \
                salt = $3::VARCHAR \
            WHERE id = $1::INT4";
        self.exec(SQL, &[&id, &password_hash, &salt])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<User, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM users \
            WHERE id = $1::INT4 \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<User, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    /// Locks registration of new [`User`]s until the end of the current
    /// transaction.
    async fn execute(
        &self,
        _: Lock<By<User, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE";
        self.batch_exec(SQL).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<read::user::TotalCount, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::user::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<By<read::user::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM users";
        self.query_opt(SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i32>(0).into())
    }
}
