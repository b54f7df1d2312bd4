use anyhow::Context;
use bookshelf_http::router::{module_prefix, openapi_document};
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bookshelf-cli", version, about = "Bookshelf service command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Listen on this port instead of the configured one
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the merged OpenAPI document as JSON
    Openapi,
    /// List mounted modules and their URL prefixes
    Routes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port } => {
            let mut settings =
                Settings::load().with_context(|| "failed to load bookshelf settings")?;
            if let Some(port) = port {
                settings.server.port = port;
            }
            bookshelf_telemetry::init(&settings.telemetry)?;

            tracing::info!(
                env = ?settings.environment,
                port = settings.server.port,
                "bookshelf-cli serving"
            );
            bookshelf_app::run(settings).await
        }
        Command::Openapi => {
            let document = openapi_document(&bookshelf_app::registry());
            let rendered = serde_json::to_string_pretty(&document)
                .context("failed to render OpenAPI document")?;
            println!("{}", rendered);
            Ok(())
        }
        Command::Routes => {
            for module in bookshelf_app::registry().modules() {
                println!("{}\t{}", module.name(), module_prefix(module.name()));
            }
            Ok(())
        }
    }
}
