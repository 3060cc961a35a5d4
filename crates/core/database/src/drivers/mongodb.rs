use std::ops::Deref;

use futures::StreamExt;
use mongodb::bson::{doc, to_document, Document};
use mongodb::error::{ErrorKind, Result, WriteError, WriteFailure};
use mongodb::options::{CountOptions, FindOptions};
use mongodb::results::{InsertOneResult, UpdateResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Server error code for a unique index violation
const DUPLICATE_KEY: i32 = 11000;

database_derived!(
    /// MongoDB implementation
    pub struct MongoDb(pub ::mongodb::Client, pub String);
);

impl Deref for MongoDb {
    type Target = mongodb::Client;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[allow(dead_code)]
impl MongoDb {
    /// Get the Evently database
    pub fn db(&self) -> mongodb::Database {
        self.database(&self.1)
    }

    /// Get a collection by its name
    pub fn col<T: Send + Sync>(&self, collection: &str) -> mongodb::Collection<T> {
        self.db().collection(collection)
    }

    /// Insert one document into a collection
    pub async fn insert_one<T: Serialize + Send + Sync>(
        &self,
        collection: &'static str,
        document: T,
    ) -> Result<InsertOneResult> {
        self.col::<T>(collection).insert_one(document).await
    }

    /// Count documents by projection
    pub async fn count_documents(
        &self,
        collection: &'static str,
        projection: Document,
    ) -> Result<u64> {
        self.col::<Document>(collection)
            .count_documents(projection)
            .await
    }

    /// Check whether any document matches the projection
    pub async fn exists(&self, collection: &'static str, projection: Document) -> Result<bool> {
        self.col::<Document>(collection)
            .count_documents(projection)
            .with_options(CountOptions::builder().limit(1).build())
            .await
            .map(|count| count > 0)
    }

    /// Find multiple documents in a collection with options
    pub async fn find_with_options<O, T: DeserializeOwned + Unpin + Send + Sync>(
        &self,
        collection: &'static str,
        projection: Document,
        options: O,
    ) -> Result<Vec<T>>
    where
        O: Into<Option<FindOptions>>,
    {
        Ok(self
            .col::<T>(collection)
            .find(projection)
            .with_options(options)
            .await?
            .filter_map(move |s| async move {
                match s {
                    Ok(document) => Some(document),
                    Err(error) => {
                        warn!("Skipping malformed document in `{collection}`: {error}");
                        None
                    }
                }
            })
            .collect::<Vec<T>>()
            .await)
    }

    /// Find multiple documents in a collection
    pub async fn find<T: DeserializeOwned + Unpin + Send + Sync>(
        &self,
        collection: &'static str,
        projection: Document,
    ) -> Result<Vec<T>> {
        self.find_with_options(collection, projection, None).await
    }

    /// Find one document
    pub async fn find_one<T: DeserializeOwned + Unpin + Send + Sync>(
        &self,
        collection: &'static str,
        projection: Document,
    ) -> Result<Option<T>> {
        self.col::<T>(collection).find_one(projection).await
    }

    /// Find one document by its ID
    pub async fn find_one_by_id<T: DeserializeOwned + Unpin + Send + Sync>(
        &self,
        collection: &'static str,
        id: &str,
    ) -> Result<Option<T>> {
        self.find_one(
            collection,
            doc! {
                "_id": id
            },
        )
        .await
    }

    /// Update one document given a projection and partial document
    pub async fn update_one<T: Serialize>(
        &self,
        collection: &'static str,
        projection: Document,
        partial: T,
    ) -> Result<UpdateResult> {
        let query = doc! {
            "$set": to_document(&partial)?
        };

        self.col::<Document>(collection)
            .update_one(projection, query)
            .await
    }

    /// Update one document given an ID and partial document
    pub async fn update_one_by_id<T: Serialize>(
        &self,
        collection: &'static str,
        id: &str,
        partial: T,
    ) -> Result<UpdateResult> {
        self.update_one(
            collection,
            doc! {
                "_id": id
            },
            partial,
        )
        .await
    }
}

/// Whether a write was rejected by the unique index with the given name
pub fn is_duplicate_key(error: &mongodb::error::Error, index: &str) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(WriteError {
            code: DUPLICATE_KEY,
            message,
            ..
        })) => duplicate_index(message) == Some(index),
        _ => false,
    }
}

/// Name of the index reported in an E11000 server message
fn duplicate_index(message: &str) -> Option<&str> {
    let (_, rest) = message.split_once(" index: ")?;
    rest.split_whitespace().next()
}

#[cfg(test)]
mod tests {
    use super::duplicate_index;

    #[test]
    fn index_name_from_duplicate_key_message() {
        assert_eq!(
            duplicate_index(
                r#"E11000 duplicate key error collection: evently.events index: slug dup key: { slug: "launch-day" }"#
            ),
            Some("slug")
        );
        assert_eq!(
            duplicate_index(
                r#"E11000 duplicate key error collection: evently.bookings index: event_id_email dup key: { event_id: "01H", email: "a@b.co" }"#
            ),
            Some("event_id_email")
        );
        assert_eq!(
            duplicate_index(
                r#"E11000 duplicate key error collection: evently.events index: _id_ dup key: { _id: "01H" }"#
            ),
            Some("_id_")
        );
        assert_eq!(duplicate_index("E11000 duplicate key error"), None);
    }
}
