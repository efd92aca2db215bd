#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use enverproxy_lib::{init_tracing, load_from_path, MqttPublisher, Reactor};
use tracing::{error, info};

/// Default location spec.md §6 names for the INI config file.
const DEFAULT_CONFIG_PATH: &str = "/etc/enverproxy-mqtt.conf";

#[derive(Parser, Debug)]
#[command(author, version, about = "Envertec microinverter bridge proxy")]
struct Cli {
    /// Path to the INI configuration file.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_from_path(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            // Tracing isn't set up yet without a verbosity to dispatch on,
            // so a config load failure goes straight to stderr.
            eprintln!("failed to load configuration from {}: {err}", cli.config.display());
            std::process::exit(1);
        }
    };

    if let Err(err) = init_tracing(&config) {
        eprintln!("failed to initialize logging: {err}");
        std::process::exit(1);
    }

    info!(
        listen_port = config.listen_port,
        forward = %config.forward_addr(),
        mqtt = ?config.mqtt_addr(),
        known_inverters = config.id2device.len(),
        "configuration loaded"
    );

    let config = Arc::new(config);
    let publisher = Arc::new(MqttPublisher::connect(&config));
    let reactor = Reactor::new(config, publisher);

    match reactor.run().await {
        Ok(()) => {
            info!("shutdown complete");
            std::process::exit(0);
        }
        Err(err) => {
            error!(%err, "reactor exited with error");
            std::process::exit(1);
        }
    }
}
