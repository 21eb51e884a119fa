use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "slip",
    about = "Slipwire — fetch URLs through the Cronet-backed client",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a URL and print the response
    Fetch {
        /// URL to fetch
        url: String,
        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,
        /// Extra header as "Name: value" (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Raw request body
        #[arg(short, long)]
        data: Option<String>,
        /// Deadline in seconds
        #[arg(short, long, default_value_t = 10.0)]
        timeout: f64,
        /// Return the first redirect instead of following it
        #[arg(long)]
        no_redirects: bool,
        /// Pretty-print JSON response bodies
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("slipwire=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            url,
            method,
            headers,
            data,
            timeout,
            no_redirects,
            json,
        } => commands::fetch::fetch(
            &url,
            &method,
            &headers,
            data.as_deref(),
            timeout,
            no_redirects,
            json,
        ),
    }
}
