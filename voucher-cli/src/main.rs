//! Voucher CLI
//!
//! Command-line interface for the voucher charge API.

use anyhow::Result;
use clap::{Parser, Subcommand};

use voucher_client::VoucherClient;
use voucher_types::{ChargeBody, FIXED_AMOUNT, FIXED_CURRENCY};

#[derive(Parser)]
#[command(name = "vouchers")]
#[command(author, version, about = "Voucher charge API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the voucher charge API
    #[arg(long, env = "VOUCHER_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Charge a card to pay for a voucher
    Charge {
        /// Card token from the payment form
        #[arg(long)]
        token: String,
        #[arg(long)]
        voucher: String,
        /// Amount in minor units, sent as given
        #[arg(long, default_value_t = FIXED_AMOUNT.to_string())]
        amount: String,
        #[arg(long, default_value_t = FIXED_CURRENCY.code().to_string())]
        currency: String,
    },
    /// Show whether a voucher is paid
    Status {
        voucher: String,
    },
    /// Show a processor charge and the voucher it paid for
    ChargeInfo {
        /// Processor charge id
        id: String,
    },
    /// Check API health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let client = VoucherClient::new(&cli.api_url);

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Charge {
            token,
            voucher,
            amount,
            currency,
        } => {
            let body = ChargeBody {
                token,
                voucher,
                amount,
                currency,
            };
            let ack = client.charge(&body).await?;
            println!("{}", serde_json::to_string_pretty(&ack)?);
        }

        Commands::Status { voucher } => {
            let status = client.voucher_status(&voucher).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }

        Commands::ChargeInfo { id } => {
            let info = client.get_charge(&id).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
