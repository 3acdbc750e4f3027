use cobble::config::ServerConfig;
use cobble::logger::{log, set_level, LogSeverity::*};
use cobble::server::Server;
use cobble::Result;
use std::path::Path;
use std::process;

/// Read from the working directory when no path is given
const DEFAULT_CONFIG: &str = "server.json";

#[tokio::main]
async fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => fatal(format!("Could not load configuration: {}", err)),
    };
    set_level(config.log_level);
    log("Cobble init".to_string(), Info);

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(err) => fatal(format!("Could not start server: {}", err)),
    };
    if let Err(err) = server.serve().await {
        fatal(format!("Server stopped: {}", err));
    }
}

fn load_config() -> Result<ServerConfig> {
    match std::env::args().nth(1) {
        Some(path) => ServerConfig::load(path),
        None if Path::new(DEFAULT_CONFIG).is_file() => ServerConfig::load(DEFAULT_CONFIG),
        None => Ok(ServerConfig::default()),
    }
}

fn fatal(msg: String) -> ! {
    log(msg, Fatal);
    process::exit(1)
}
