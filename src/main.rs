use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use fxvoyage::core::Resolution;
use fxvoyage::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ConvertArgs {
    /// Amount to convert
    #[arg(short, long)]
    amount: Option<f64>,

    /// Currency to convert from
    #[arg(short, long)]
    source: Option<String>,

    /// Amount of the second source, enables compare mode
    #[arg(long)]
    compare_amount: Option<f64>,

    /// Currency of the second source, enables compare mode
    #[arg(long)]
    compare_source: Option<String>,

    /// Currency to convert into, repeatable
    #[arg(short, long = "target")]
    targets: Vec<String>,

    /// Keep only the first rate of each month
    #[arg(short, long)]
    monthly: bool,

    /// Start of the date range (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// End of the date range (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Rate resolution requested from the provider (hourly or daily)
    #[arg(short, long)]
    resolution: Option<Resolution>,

    /// Restore a request from a shared query string or URL
    #[arg(short, long)]
    query: Option<String>,

    /// Print the shareable query string for this request
    #[arg(long)]
    share: bool,
}

impl From<ConvertArgs> for fxvoyage::ConvertOptions {
    fn from(args: ConvertArgs) -> fxvoyage::ConvertOptions {
        fxvoyage::ConvertOptions {
            amount: args.amount,
            source: args.source,
            compare_amount: args.compare_amount,
            compare_source: args.compare_source,
            targets: args.targets,
            monthly: args.monthly,
            from: args.from,
            to: args.to,
            resolution: args.resolution,
            query: args.query,
            share: args.share,
        }
    }
}

impl From<Commands> for fxvoyage::AppCommand {
    fn from(cmd: Commands) -> fxvoyage::AppCommand {
        match cmd {
            Commands::Convert(args) => fxvoyage::AppCommand::Convert(args.into()),
            Commands::Currencies => fxvoyage::AppCommand::Currencies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert amounts over historical exchange rates
    Convert(ConvertArgs),
    /// List supported currencies
    Currencies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxvoyage::cli::setup::setup(),
        Some(cmd) => fxvoyage::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
