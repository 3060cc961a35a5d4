use crate::{
    mongodb::bson::{doc, from_document, Document},
    MigrationInfo, MongoDb,
};

pub const LATEST_REVISION: i32 = 1; // MUST BE +1 to last migration

pub async fn migrate_database(db: &MongoDb) -> Result<(), ()> {
    let migrations = db.col::<Document>("migrations");
    let data = migrations
        .find_one(doc! {})
        .await
        .map_err(|error| error!("Failed to fetch migration data: {error}"))?;

    let Some(doc) = data else {
        error!("Database was configured incorrectly, possibly because initalization failed.");
        return Err(());
    };

    let info: MigrationInfo = from_document(doc)
        .map_err(|error| error!("Failed to read migration information: {error}"))?;

    let revision = run_migrations(info.revision).await?;

    migrations
        .update_one(
            doc! {
                "_id": info.id
            },
            doc! {
                "$set": {
                    "revision": revision
                }
            },
        )
        .await
        .map_err(|error| error!("Failed to commit migration information: {error}"))?;

    info!("Migration complete. Currently at revision {}.", revision);
    Ok(())
}

pub async fn run_migrations(revision: i32) -> Result<i32, ()> {
    info!("Starting database migration.");

    // Revision 1 is the schema laid down by `init::create_database`.
    // Reminder to update LATEST_REVISION when adding new migrations.
    Ok(LATEST_REVISION.max(revision))
}

#[cfg(test)]
mod tests {
    use super::{run_migrations, LATEST_REVISION};

    #[tokio::test]
    async fn fresh_schema_needs_no_scripts() {
        assert_eq!(run_migrations(LATEST_REVISION).await, Ok(LATEST_REVISION));
        assert_eq!(run_migrations(0).await, Ok(LATEST_REVISION));
    }
}
