use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueHint};
use cryptoconditions_core::{
    Condition, Context, Fulfillment, Limits, PreimageSha256, Registry, Verifier,
};

#[derive(Parser)]
#[command(name = "cc")]
#[command(author, version, about = "Build and verify crypto-conditions", long_about = None)]
struct Cli {
    /// JSON file overriding the local policy limits
    #[arg(short, long, global = true, value_parser, value_hint = ValueHint::FilePath)]
    limits: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the condition a fulfillment satisfies
    Condition { fulfillment: String },
    /// Decode a condition and check it against the local limits
    Inspect { condition: String },
    /// Verify a fulfillment against a condition
    Verify {
        #[arg(short, long)]
        fulfillment: String,

        #[arg(short, long)]
        condition: String,

        /// Hex-encoded message the signatures cover
        #[arg(short, long, default_value = "")]
        message: String,
    },
    /// Build a preimage fulfillment from hex-encoded bytes
    Preimage { hex: String },
    /// List the condition types this build understands
    Types,
}

fn main() -> anyhow::Result<ExitCode> {
    // In order to view logs, run with `RUST_LOG=debug`
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let limits = match &cli.limits {
        Some(path) => Limits::from_json_file(path)?,
        None => Limits::default(),
    };
    let registry = Registry::global();

    match cli.command {
        Commands::Condition { fulfillment } => {
            let fulfillment =
                Fulfillment::parse_uri_in(&fulfillment, &Context::new(registry, limits))?;
            println!("{}", fulfillment.condition()?);
        }
        Commands::Inspect { condition } => {
            let condition = Condition::parse_uri(&condition)?;
            let type_name = registry
                .lookup(condition.type_id())
                .map(|d| d.name)
                .unwrap_or("unregistered");
            println!("type:                   {} ({})", condition.type_id(), type_name);
            println!("bitmask:                {:#x}", condition.bitmask());
            println!("fingerprint:            {}", hex::encode(condition.fingerprint()));
            println!("max fulfillment length: {}", condition.max_fulfillment_length());
            match condition.validate_with(&limits) {
                Ok(()) => println!("policy:                 supported"),
                Err(e) => println!("policy:                 {e}"),
            }
        }
        Commands::Verify {
            fulfillment,
            condition,
            message,
        } => {
            let message = hex::decode(&message).context("message is not valid hex")?;
            let verifier = Verifier::new(registry, limits);
            if !verifier.verify(&fulfillment, &condition, &message)? {
                tracing::info!("Fulfillment does not satisfy the condition");
                return Ok(ExitCode::FAILURE);
            }
            tracing::info!("Fulfillment verified");
        }
        Commands::Preimage { hex } => {
            let preimage = hex::decode(&hex).context("preimage is not valid hex")?;
            let fulfillment = Fulfillment::from(PreimageSha256::new(preimage));
            println!("fulfillment: {fulfillment}");
            println!("condition:   {}", fulfillment.condition()?);
        }
        Commands::Types => {
            for d in registry.iter() {
                println!(
                    "{:>2}  {:<18} bits {:#04x}  {:?}",
                    d.type_id, d.name, d.feature_bits, d.arity
                );
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
