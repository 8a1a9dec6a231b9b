use rocket::{Build, Rocket};
use tracing::info;

mod config;
mod error;
mod password;
mod routes;
mod spa;
mod store;

#[cfg(test)]
mod tests_common;

use config::ServerConfig;
use store::CredentialStore;

fn build_rocket(config: ServerConfig, store: CredentialStore) -> Rocket<Build> {
    let figment = rocket::Config::figment().merge(("port", config.port));
    rocket::custom(figment)
        .mount("/", routes::root_routes())
        .mount("/", spa::spa_routes())
        .mount("/api", routes::api_routes())
        .register("/", error::catchers())
        .manage(store)
        .manage(config)
}

#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "titanium_server=info,rocket=warn".into()),
        )
        .init();

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let store = match CredentialStore::open(&config.data_dir).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("cannot open credential store: {e}");
            std::process::exit(1);
        }
    };

    info!(port = config.port, app_root = %config.app_root.display(), "starting portal");
    build_rocket(config, store).launch().await?;
    Ok(())
}
