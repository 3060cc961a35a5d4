use crate::ReferenceDb;

use super::AbstractMigrations;

#[async_trait]
impl AbstractMigrations for ReferenceDb {
    #[cfg(test)]
    /// Drop the database
    async fn drop_database(&self) {
        self.events.lock().await.clear();
        self.bookings.lock().await.clear();
    }

    /// Migrate the database
    async fn migrate_database(&self) -> Result<(), ()> {
        // Uniqueness is enforced by the reference implementation itself
        Ok(())
    }
}
