use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions},
    Client, Database, IndexModel,
};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::{subscriber::Subscriber, user::User};

pub const INSIGHTS: &str = "insights";
pub const TEAM_MEMBERS: &str = "team_members";
pub const OFFICES: &str = "offices";
pub const PUBLICATIONS: &str = "publications";
pub const SUBSCRIBERS: &str = "subscribers";
pub const CONTACT_MESSAGES: &str = "contact_messages";

pub async fn get_db_client(config: &AppConfig) -> Result<Database> {
    let mut options = ClientOptions::parse(&config.database_url).await?;
    options.app_name = Some("oncg-api".to_string());
    options.connect_timeout = Some(config.db_timeout);
    options.server_selection_timeout = Some(config.db_timeout);

    let client = Client::with_options(options)?;
    let db = client.database(&config.database_name);

    db.run_command(doc! { "ping": 1 }).await?;
    tracing::info!("Connected to database: {}", config.database_name);

    ensure_indexes(&db).await?;
    Ok(db)
}

async fn ensure_indexes(db: &Database) -> Result<()> {
    let unique_email = || {
        IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build()
    };

    db.collection::<User>(crate::services::user_store::USERS_COLLECTION)
        .create_index(unique_email())
        .await?;
    db.collection::<Subscriber>(SUBSCRIBERS)
        .create_index(unique_email())
        .await?;

    tracing::info!("Database indexes ensured");
    Ok(())
}
