use evently_database::DatabaseInfo;

#[tokio::main]
async fn main() {
    evently_config::setup_logging();
    evently_config::init().await;

    let db = DatabaseInfo::Auto
        .connect()
        .await
        .expect("Failed to connect to the database.");

    db.migrate_database()
        .await
        .expect("Failed to migrate the database.");
}
