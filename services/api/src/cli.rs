use crate::demo::{run_demo, run_quote, DemoArgs, QuoteArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use prepseries::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Test Series Storefront",
    about = "Demonstrate and run the test-series storefront from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Price a selection against the seeded catalog without starting the server
    Quote(QuoteArgs),
    /// Run an end-to-end CLI demo covering purchase, submission, and evaluation
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Quote(args) => run_quote(args),
        Command::Demo(args) => run_demo(args),
    }
}
