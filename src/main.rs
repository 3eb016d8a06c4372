use std::fs::{self, OpenOptions};
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use threadbook::{util, App, Config};

#[derive(Parser)]
#[command(name = "threadbook", version, about)]
struct Cli {
    /// Override the data directory (default: ~/.threadbook)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the thread gateway instead of the chat client
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8787")]
        listen: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::paths::init_data_dir(cli.data_dir);

    match cli.command {
        Some(Command::Serve { listen }) => {
            // Server mode logs to stderr
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                )
                .with_writer(std::io::stderr)
                .init();

            let config = Config::load();
            threadbook::web::serve(listen, &config.serve).await
        }
        None => {
            // The TUI owns the terminal; logs go to a file
            // (~/.threadbook/logs/threadbook.log)
            fs::create_dir_all(util::logs_dir())?;

            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(util::log_file_path())?;

            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::WARN.into()),
                )
                .with_writer(log_file)
                .with_ansi(false)
                .init();

            let config = Config::load();
            let mut app = App::new(config);
            app.run().await
        }
    }
}
