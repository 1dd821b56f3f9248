use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tracing::{debug, warn};

/// One request's transaction scope.
///
/// A pooled connection is checked out and `BEGIN` issued by [`UnitOfWork::begin`].
/// Exactly one of the following then ends the scope and returns the connection:
///
/// - [`commit`](Self::commit) on success
/// - [`rollback`](Self::rollback) when the caller decides to abandon the work
/// - drop, on any other exit path (`?`, early return, panic), which rolls back
///
/// ```ignore
/// let uow = UnitOfWork::begin(&db).await?;
/// let model = active_model.insert(uow.connection()).await?; // error: dropped, rolled back
/// uow.commit().await?;
/// ```
pub struct UnitOfWork {
    txn: Option<DatabaseTransaction>,
}

impl UnitOfWork {
    pub async fn begin(db: &DatabaseConnection) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        debug!("Unit of work started");
        Ok(Self { txn: Some(txn) })
    }

    /// Connection to run statements on; every statement joins the open transaction.
    pub fn connection(&self) -> &DatabaseTransaction {
        match &self.txn {
            Some(txn) => txn,
            // `commit` and `rollback` consume `self`, so a live value always holds a transaction.
            None => unreachable!("unit of work used after it finished"),
        }
    }

    pub async fn commit(mut self) -> Result<(), DbErr> {
        if let Some(txn) = self.txn.take() {
            txn.commit().await?;
            debug!("Unit of work committed");
        }
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<(), DbErr> {
        if let Some(txn) = self.txn.take() {
            txn.rollback().await?;
            debug!("Unit of work rolled back");
        }
        Ok(())
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        // Dropping the transaction issues the ROLLBACK and releases the connection.
        if self.txn.take().is_some() {
            warn!("Unit of work dropped before commit, rolling back");
        }
    }
}
