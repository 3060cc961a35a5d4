use super::scripts::LATEST_REVISION;

use crate::mongodb::bson::{doc, Document};
use crate::MongoDb;

/// Collections created on a fresh database
const COLLECTIONS: &[&str] = &["events", "bookings", "migrations"];

pub async fn create_database(db: &MongoDb) -> Result<(), ()> {
    info!("Creating database.");
    let db = db.db();

    for collection in COLLECTIONS {
        db.create_collection(*collection).await.map_err(|error| {
            error!("Failed to create {collection} collection: {error}");
        })?;
    }

    db.run_command(doc! {
        "createIndexes": "events",
        "indexes": [
            {
                "key": {
                    "slug": 1_i32
                },
                "name": "slug",
                "unique": true
            }
        ]
    })
    .await
    .map_err(|error| error!("Failed to create slug index: {error}"))?;

    db.run_command(doc! {
        "createIndexes": "bookings",
        "indexes": [
            {
                "key": {
                    "event_id": 1_i32
                },
                "name": "event_id"
            },
            {
                "key": {
                    "event_id": 1_i32,
                    "email": 1_i32
                },
                "name": "event_id_email",
                "unique": true
            }
        ]
    })
    .await
    .map_err(|error| error!("Failed to create booking indexes: {error}"))?;

    db.collection::<Document>("migrations")
        .insert_one(doc! {
            "_id": 0_i32,
            "revision": LATEST_REVISION
        })
        .await
        .map_err(|error| error!("Failed to save migration info: {error}"))?;

    info!("Created database.");
    Ok(())
}
