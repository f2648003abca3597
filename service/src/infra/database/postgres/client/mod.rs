//! Postgres database clients lazily acquiring their [`Connection`]s.

pub mod non_tx;
pub mod tx;

use std::future::Future;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::postgres::Connection;

pub use self::{non_tx::NonTx, tx::Tx};

/// Returns the value stored in the provided `slot`, storing the one produced
/// by the `init` first, if the `slot` is empty.
///
/// The `init` runs at most once, even if this function is called
/// concurrently.
async fn get_or_try_init<C, F, Fut>(
    slot: &RwLock<Option<C>>,
    init: F,
) -> Result<RwLockReadGuard<'_, C>, Traced<database::Error>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<C, Traced<database::Error>>>,
{
    let read = slot.read().await;
    let guard = if read.is_some() {
        read
    } else {
        drop(read);

        let mut write = slot.write().await;
        if write.is_none() {
            *write = Some(init().await.map_err(tracerr::wrap!())?);
        }
        write.downgrade()
    };

    Ok(RwLockReadGuard::map(guard, |conn| {
        conn.as_ref()
            .expect("connection cannot be dropped while guard is alive")
    }))
}

/// Implements [`Connection`] for a client by delegating to the
/// [`Connection`] returned by its `connection()` method.
macro_rules! delegate_connection {
    ($client:ty) => {
        impl $crate::infra::postgres::Connection for $client {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<
                Vec<::tokio_postgres::Row>,
                ::tracerr::Traced<$crate::infra::database::Error>,
            >
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(::tracerr::wrap!())?
                    .query(stmt, params)
                    .await
                    .map_err(::tracerr::wrap!())
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<
                Option<::tokio_postgres::Row>,
                ::tracerr::Traced<$crate::infra::database::Error>,
            >
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(::tracerr::wrap!())?
                    .query_opt(stmt, params)
                    .await
                    .map_err(::tracerr::wrap!())
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<u64, ::tracerr::Traced<$crate::infra::database::Error>>
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(::tracerr::wrap!())?
                    .exec(stmt, params)
                    .await
                    .map_err(::tracerr::wrap!())
            }

            async fn batch_exec(
                &self,
                query: &str,
            ) -> Result<(), ::tracerr::Traced<$crate::infra::database::Error>>
            {
                self.connection()
                    .await
                    .map_err(::tracerr::wrap!())?
                    .batch_exec(query)
                    .await
                    .map_err(::tracerr::wrap!())
            }
        }
    };
}
use delegate_connection;
