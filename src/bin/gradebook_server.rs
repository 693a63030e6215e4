//! Gradebook HTTP Server
//!
//! A standalone server binary exposing the student record API over HTTP,
//! backed by durable storage.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use gradebook::storage::open_store;
use gradebook::{GradeScale, Gradebook};

/// Server configuration
struct Config {
    /// Address to bind to
    addr: SocketAddr,
    /// Data directory for persistent storage
    data_dir: PathBuf,
    /// Grade threshold table to derive with
    scale: GradeScale,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".parse().unwrap(),
            data_dir: PathBuf::from("./registry.db"),
            scale: GradeScale::default(),
        }
    }
}

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    let port: u16 = args[i + 1].parse().unwrap_or_else(|_| {
                        eprintln!("error: invalid port number: {}", args[i + 1]);
                        std::process::exit(1);
                    });
                    config.addr.set_port(port);
                    i += 2;
                } else {
                    eprintln!("error: --port requires a value");
                    std::process::exit(1);
                }
            }
            "--data-dir" | "-d" => {
                if i + 1 < args.len() {
                    config.data_dir = PathBuf::from(&args[i + 1]);
                    i += 2;
                } else {
                    eprintln!("error: --data-dir requires a value");
                    std::process::exit(1);
                }
            }
            "--grade-scale" | "-g" => {
                if i + 1 < args.len() {
                    config.scale = match args[i + 1].as_str() {
                        "four" => GradeScale::four_tier(),
                        "five" => GradeScale::five_tier(),
                        other => {
                            eprintln!("error: unknown grade scale: {other} (expected 'four' or 'five')");
                            std::process::exit(1);
                        }
                    };
                    i += 2;
                } else {
                    eprintln!("error: --grade-scale requires a value");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                println!("gradebook-server - Gradebook HTTP Server");
                println!();
                println!("USAGE:");
                println!("    gradebook-server [OPTIONS]");
                println!();
                println!("OPTIONS:");
                println!("    -p, --port <PORT>          Port to listen on [default: 8080]");
                println!("    -d, --data-dir <DIR>       Data directory [default: ./registry.db]");
                println!("    -g, --grade-scale <NAME>   Threshold table, 'four' or 'five' [default: five]");
                println!("    -h, --help                 Print help information");
                std::process::exit(0);
            }
            arg => {
                eprintln!("error: unknown argument: {arg}");
                std::process::exit(1);
            }
        }
    }

    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        "starting gradebook server"
    );

    // Open durable storage (holds an exclusive lock for the process lifetime).
    // A failed bootstrap is the one fatal error; everything later is
    // reported per-request.
    let store = Arc::new(open_store(&config.data_dir, None)?);
    let engine = Arc::new(Gradebook::new(store, config.scale));

    let router = gradebook::transport::router(engine);

    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await?;

    tracing::info!("shut down");
    Ok(())
}
