use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::store::{StoreConfig, health_check, init_session};
use userrole::repositories::CqlStore;
use userrole::schema::Schema;
use userrole::{Gateway, GatewayOptions, Role, User};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting user/role demonstration");

    // Connect to the cluster
    let store_config = StoreConfig::from_env()?;
    let session = init_session(&store_config).await?;

    // Check cluster connectivity
    if health_check(&session).await? {
        info!("Store connection successful");
    } else {
        anyhow::bail!("Failed to reach the store");
    }

    let schema = Schema::new(&store_config.keyspace, store_config.replication_factor);
    let store = CqlStore::new(session, schema, store_config.consistency());
    let options = GatewayOptions::from_env()?;
    let gateway = Gateway::new(store, options);

    // Create keyspace and tables if missing
    gateway.bootstrap().await?;

    let user = User::new("Ada Lovelace").with_roles(vec![
        Role::new("Admin"),
        Role::new("Editor"),
        Role::new("User"),
    ]);

    gateway.create_user(&user).await?;

    let mut fetched = gateway.get_user(user.id).await?;
    println!("Fetched user: {}", serde_json::to_string_pretty(&fetched)?);

    // Rename and drop the last role
    fetched.name = "Ada King".to_string();
    fetched.roles.pop();
    gateway.update_user(&fetched).await?;

    let updated = gateway.get_user(user.id).await?;
    println!("Updated user: {}", serde_json::to_string_pretty(&updated)?);

    gateway.delete_user(user.id).await?;
    info!("Deleted user {}", user.id);

    // Roles outlive the users that referenced them
    for role in &user.roles {
        let orphan = gateway.get_role(role.id).await?;
        println!("Remaining role: {}", serde_json::to_string(&orphan)?);
    }

    Ok(())
}
