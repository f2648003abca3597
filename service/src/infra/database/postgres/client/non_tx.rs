//! [`NonTx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection as _},
};

use super::{delegate_connection, get_or_try_init};

/// Non-transactional Postgres database client.
///
/// Acquires a [`connection::NonTx`] from the [`connection::Pool`] on the
/// first use and keeps it until it's taken by a [`Tx`] client.
///
/// [`Tx`]: super::Tx
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to acquire connections from.
    pool: connection::Pool,

    /// Acquired [`connection::NonTx`], if any.
    slot: Arc<RwLock<Option<connection::NonTx>>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client on top of the provided
    /// [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            slot: Arc::default(),
        }
    }

    /// Acquires a new [`connection::NonTx`] from the [`connection::Pool`],
    /// bypassing the one held by this [`NonTx`] client.
    pub(crate) async fn acquire(
        &self,
    ) -> Result<connection::NonTx, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    /// Returns the [`connection::NonTx`] held by this [`NonTx`] client,
    /// acquiring it if there is none.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::NonTx>, Traced<database::Error>>
    {
        get_or_try_init(&self.slot, || self.acquire()).await
    }

    /// Takes the [`connection::NonTx`] held by this [`NonTx`] client, if any.
    pub(crate) async fn take_connection(&self) -> Option<connection::NonTx> {
        self.slot.write().await.take()
    }
}

delegate_connection!(NonTx);
