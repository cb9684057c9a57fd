//! ERP sale order CLI
//!
//! Entry point for the `erp` command-line tool. Connection settings come
//! from flags or `OPENERP_*` environment variables; all XML-RPC work is
//! done by `erp-core`.

use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use erp_core::{Credentials, ErpClient, UreqTransport};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "erp")]
#[command(about = "Inspect and edit ERP sale orders over XML-RPC", version)]
struct Cli {
    #[command(flatten)]
    connection: Connection,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Connection {
    /// Server base URL, without the /xmlrpc suffix
    #[arg(long, env = "OPENERP_BASE_URL", default_value = "http://localhost:8069")]
    base_url: String,

    /// Database to log into
    #[arg(long, env = "OPENERP_DB")]
    db: Option<String>,

    /// Login name
    #[arg(long, short = 'u', env = "OPENERP_USER")]
    user: Option<String>,

    /// Password, resent with every call
    #[arg(long, env = "OPENERP_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// List databases hosted by the server
    Databases,

    /// List open sale orders (draft, sent, in progress)
    Orders,

    /// Show the lines of a sale order
    Lines {
        /// Sale order id
        order_id: i64,
    },

    /// Replace the product on one order line
    SetProduct {
        /// Sale order id
        order_id: i64,

        /// Product id currently on the line
        old_product_id: i64,

        /// Internal reference (default_code) of the new product
        code: String,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult {
    let transport = UreqTransport::with_timeout(Duration::from_secs(cli.connection.timeout));
    let mut client = ErpClient::new(&cli.connection.base_url, transport);

    match cli.command {
        Commands::Databases => {
            let databases = client.list_databases()?;
            if cli.json {
                print_json(&databases)?;
            } else {
                for name in databases {
                    println!("{name}");
                }
            }
        }
        Commands::Orders => {
            client.login(&credentials(&cli.connection)?)?;
            let orders = client.get_open_sale_orders()?;
            if cli.json {
                print_json(&orders)?;
            } else if orders.is_empty() {
                println!("No open sale orders found.");
            } else {
                for order in orders {
                    let partner = order.partner.map(|p| p.label).unwrap_or_default();
                    println!(
                        "{:>6}  {:<12} {:<10} {}",
                        order.id,
                        order.name.unwrap_or_default(),
                        order.state.unwrap_or_default(),
                        partner
                    );
                }
            }
        }
        Commands::Lines { order_id } => {
            client.login(&credentials(&cli.connection)?)?;
            let lines = client.get_sale_order_lines(order_id)?;
            if cli.json {
                print_json(&lines)?;
            } else {
                for (i, line) in lines.iter().enumerate() {
                    let (id, label) = line
                        .product
                        .as_ref()
                        .map(|p| (p.id.to_string(), p.label.as_str()))
                        .unwrap_or_default();
                    let quantity = line.quantity.map(|q| q.to_string()).unwrap_or_else(|| "?".to_string());
                    println!("{:>3}. {}x {} (product {})", i + 1, quantity, label, id);
                }
            }
        }
        Commands::SetProduct {
            order_id,
            old_product_id,
            code,
        } => {
            client.login(&credentials(&cli.connection)?)?;
            client.update_order_line_product(order_id, old_product_id, &code)?;
            println!("Product updated successfully!");
        }
    }
    Ok(())
}

fn credentials(connection: &Connection) -> Result<Credentials, String> {
    let required = |value: &Option<String>, flag: &str, env: &str| {
        value
            .clone()
            .ok_or_else(|| format!("missing --{flag} (or {env})"))
    };
    Ok(Credentials {
        db: required(&connection.db, "db", "OPENERP_DB")?,
        username: required(&connection.user, "user", "OPENERP_USER")?,
        password: required(&connection.password, "password", "OPENERP_PASSWORD")?,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn set_product_takes_three_positionals() {
        let cli = Cli::try_parse_from([
            "erp",
            "--base-url",
            "http://erp.local",
            "--db",
            "demo",
            "set-product",
            "4",
            "21",
            "BB75",
        ])
        .unwrap();
        assert_eq!(cli.connection.base_url, "http://erp.local");
        assert!(matches!(
            cli.command,
            Commands::SetProduct { order_id: 4, old_product_id: 21, ref code } if code == "BB75"
        ));
    }

    #[test]
    fn missing_credentials_are_reported() {
        let cli = Cli::try_parse_from(["erp", "--db", "demo", "--password", "x", "orders"]).unwrap();
        let connection = Connection {
            user: None,
            ..cli.connection
        };
        let err = credentials(&connection).unwrap_err();
        assert!(err.contains("--user"));
    }
}
