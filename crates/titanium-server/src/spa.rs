//! Static serving for the built single-page app.
//!
//! Exact files under the app root are served as-is; any other
//! extension-less path falls through to `index.html` so client-side
//! routes survive a hard refresh. Paths under `/api` never reach the
//! fallback, and a path that names a file which does not exist stays a
//! plain 404.

use std::path::PathBuf;

use rocket::fs::NamedFile;
use rocket::{State, get, routes};

use crate::config::ServerConfig;

pub fn spa_routes() -> Vec<rocket::Route> {
    routes![spa]
}

#[get("/<path..>", rank = 20)]
async fn spa(config: &State<ServerConfig>, path: PathBuf) -> Option<NamedFile> {
    if path.starts_with("api") {
        return None;
    }

    let candidate = config.app_root.join(&path);
    if candidate.is_file() {
        return NamedFile::open(candidate).await.ok();
    }

    // A dot anywhere in the path marks a concrete asset request;
    // missing assets must not masquerade as the app shell.
    let names_file = path.to_str().is_some_and(|p| p.contains('.'));
    if names_file {
        return None;
    }

    NamedFile::open(config.app_root.join("index.html")).await.ok()
}
