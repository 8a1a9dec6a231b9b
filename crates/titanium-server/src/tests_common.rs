#![allow(clippy::unwrap_used)]

use std::fs;

use rocket::local::asynchronous::Client;
use tempfile::TempDir;

use crate::config::ServerConfig;
use crate::store::CredentialStore;

/// A tracked local client over throwaway stores and a stub app shell.
/// The `TempDir` guard must outlive the client.
pub async fn spawn_client() -> (Client, TempDir) {
    let dir = TempDir::new().unwrap();
    let app_root = dir.path().join("app");
    fs::create_dir(&app_root).unwrap();
    fs::write(app_root.join("index.html"), "<!doctype html><title>titanium</title>\n").unwrap();
    fs::write(app_root.join("app.js"), "console.log(\"titanium\");\n").unwrap();

    let config = ServerConfig {
        port: 0,
        app_root,
        data_dir: dir.path().join("data"),
    };
    let store = CredentialStore::open(&config.data_dir).await.unwrap();
    let client = Client::tracked(crate::build_rocket(config, store))
        .await
        .unwrap();
    (client, dir)
}
