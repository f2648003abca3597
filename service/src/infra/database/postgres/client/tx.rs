//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{connection, Connection as _},
};

use super::{delegate_connection, get_or_try_init, NonTx};

/// Transactional Postgres database client.
///
/// Begins its transaction on the first use, reusing the connection of the
/// [`NonTx`] client it was created from, if there is one.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`NonTx`] client this [`Tx`] client was created from.
    origin: NonTx,

    /// Whether the [`connection::NonTx`] of the `origin` may still be
    /// reused.
    reusable: Arc<Mutex<bool>>,

    /// Begun [`connection::Tx`], if any.
    slot: Arc<RwLock<Option<connection::Tx>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client from the provided [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            origin: client,
            reusable: Arc::new(Mutex::new(true)),
            slot: Arc::default(),
        }
    }

    /// Begins a new [`connection::Tx`].
    async fn begin(&self) -> Result<connection::Tx, Traced<database::Error>> {
        let reused = {
            let mut reusable = self.reusable.lock().await;
            if *reusable {
                *reusable = false;
                self.origin.take_connection().await
            } else {
                None
            }
        };
        let conn = match reused {
            Some(conn) => conn,
            None => self.origin.acquire().await.map_err(tracerr::wrap!())?,
        };

        let tx = connection::Tx::from_non_tx(conn)
            .await
            .map_err(tracerr::wrap!())?;
        tracing::trace!("began Postgres transaction");
        Ok(tx)
    }

    /// Returns the [`connection::Tx`] of this [`Tx`] client, beginning it if
    /// there is none.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        get_or_try_init(&self.slot, || self.begin()).await
    }

    /// Commits the transaction of this [`Tx`] client.
    ///
    /// Does nothing if the transaction hasn't begun yet. Next use of this
    /// [`Tx`] client begins a new transaction.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.slot.write().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())?;
        tracing::trace!("committed Postgres transaction");
        Ok(())
    }
}

delegate_connection!(Tx);
