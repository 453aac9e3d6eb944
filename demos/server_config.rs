//! Layered loading with hot reload: writes a config file, loads it with
//! defaults and environment on top, then watches it for changes.
//!
//! Run with `cargo run --example server_config`, then edit
//! `/tmp/hotfig-demo.json` (e.g. change the port) to see a reload fire.

use std::sync::Arc;
use std::time::Duration;

use hotfig::{DefaultsProvider, EnvProvider, FileProvider, Loader, Options};

hotfig::record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct ServerConfig {
        pub host: String [default = "127.0.0.1"],
        pub port: u16 [default = "8080"],
        pub request_timeout: Duration [default = "30s"],
        pub api_key: String [secret],
        pub database: DatabaseConfig [nested],
    }
}

hotfig::record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct DatabaseConfig {
        pub url: String [default = "postgres://localhost/demo"],
        pub pool_size: u32 [default = "5"],
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::temp_dir().join("hotfig-demo.json");
    std::fs::write(&path, r#"{"port": 9000, "apiKey": "demo-key-123456"}"#)?;

    let loader = Loader::new(
        Options::<ServerConfig>::new()
            .provider(DefaultsProvider::<ServerConfig>::new())
            .provider(FileProvider::new(&path))
            .provider(EnvProvider)
            .prefix("demo")
            .watch(&path, Duration::from_secs(1))
            .on_reload(|old: Arc<ServerConfig>, new: Arc<ServerConfig>| {
                println!("reloaded: port {} -> {}", old.port, new.port);
            })
            .on_reload_error(|err| eprintln!("reload failed: {err}")),
    );

    let config = loader.load()?;
    println!("loaded version {}", loader.version());
    hotfig::print(&*config);

    loader.start_watching()?;
    println!("watching {}; edit it to trigger a reload, Ctrl-C to quit", path.display());

    tokio::signal::ctrl_c().await?;
    loader.stop_watching().await;
    Ok(())
}
