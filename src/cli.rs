//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::FoliobackError;

#[derive(Parser, Debug)]
#[command(name = "folioback", about = "Investor account and portfolio backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database schema
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Start the JSON API server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Buy shares into an account
    Buy {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        account: i64,
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        quantity: i64,
        #[arg(long)]
        price: f64,
    },
    /// Sell shares from an account
    Sell {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        account: i64,
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        quantity: i64,
        #[arg(long)]
        price: f64,
    },
    /// Show holdings and balance for an account
    Holdings {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        account: i64,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::InitDb { config } => run_init_db(&config),
        Command::Serve { config } => run_serve(&config),
        Command::Buy {
            config,
            account,
            ticker,
            quantity,
            price,
        } => run_buy(&config, account, &ticker, quantity, price),
        Command::Sell {
            config,
            account,
            ticker,
            quantity,
            price,
        } => run_sell(&config, account, &ticker, quantity, price),
        Command::Holdings { config, account } => run_holdings(&config, account),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = FoliobackError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

#[cfg(feature = "sqlite")]
fn open_store(config: &FileConfigAdapter) -> Result<crate::adapters::sqlite_store::SqliteStore, ExitCode> {
    crate::adapters::sqlite_store::SqliteStore::from_config(config).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn run_init_db(config_path: &PathBuf) -> ExitCode {
    #[cfg(feature = "sqlite")]
    {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };
        let store = match open_store(&config) {
            Ok(s) => s,
            Err(code) => return code,
        };
        if let Err(e) = store.initialize_schema() {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Schema ready");
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config_path;
        eprintln!("error: sqlite feature is required for init-db");
        ExitCode::from(1)
    }
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use crate::ports::config_port::ConfigPort;
        use std::net::SocketAddr;
        use std::sync::Arc;

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .init();

        eprintln!("Loading config from {}", config_path.display());
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let store = match open_store(&config) {
            Ok(s) => s,
            Err(code) => return code,
        };
        if let Err(e) = store.initialize_schema() {
            eprintln!("error: {e}");
            return (&e).into();
        }

        let addr: SocketAddr = config
            .get_string("web", "listen")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
            .parse()
            .unwrap_or_else(|_| "127.0.0.1:8080".parse().unwrap());

        log::info!("listening on {addr}");

        let state = AppState {
            store: Arc::new(store),
        };
        let router = build_router(state);

        tokio::runtime::Runtime::new().unwrap().block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
            axum::serve(listener, router).await.unwrap();
        });

        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}

fn run_buy(
    config_path: &PathBuf,
    account: i64,
    ticker: &str,
    quantity: i64,
    price: f64,
) -> ExitCode {
    #[cfg(feature = "sqlite")]
    {
        use crate::domain::trade::PurchaseOrder;
        use crate::ports::trade_port::TradePort;

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };
        let store = match open_store(&config) {
            Ok(s) => s,
            Err(code) => return code,
        };

        let order = PurchaseOrder {
            account_number: account,
            ticker: ticker.to_string(),
            quantity,
            price,
        };
        match store.settle_purchase(&order) {
            Ok(result) => {
                println!(
                    "bought {} {} at {:.2}: now holding {}, balance {:.2}",
                    quantity, order.ticker, price, result.remaining_quantity, result.new_balance
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config_path, account, ticker, quantity, price);
        eprintln!("error: sqlite feature is required for buy");
        ExitCode::from(1)
    }
}

fn run_sell(
    config_path: &PathBuf,
    account: i64,
    ticker: &str,
    quantity: i64,
    price: f64,
) -> ExitCode {
    #[cfg(feature = "sqlite")]
    {
        use crate::domain::trade::SaleOrder;
        use crate::ports::trade_port::TradePort;

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };
        let store = match open_store(&config) {
            Ok(s) => s,
            Err(code) => return code,
        };

        let order = SaleOrder {
            account_number: account,
            ticker: ticker.to_string(),
            quantity,
            price,
        };
        match store.settle_sale(&order) {
            Ok(result) => {
                println!(
                    "sold {} {} at {:.2}: {} remaining, balance {:.2}",
                    quantity, order.ticker, price, result.remaining_quantity, result.new_balance
                );
                if result.holding_removed {
                    println!("holding closed");
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config_path, account, ticker, quantity, price);
        eprintln!("error: sqlite feature is required for sell");
        ExitCode::from(1)
    }
}

fn run_holdings(config_path: &PathBuf, account: i64) -> ExitCode {
    #[cfg(feature = "sqlite")]
    {
        use crate::ports::store_port::{AccountStore, HoldingStore};

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };
        let store = match open_store(&config) {
            Ok(s) => s,
            Err(code) => return code,
        };

        let acct = match store.get_account(account) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        let holdings = match store.holdings_for_account(account) {
            Ok(h) => h,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        println!("account {} balance {:.2}", acct.account_number, acct.balance);
        for holding in &holdings {
            println!(
                "  {:<8} {:>8} @ {:.2}",
                holding.ticker, holding.quantity, holding.purchase_price
            );
        }
        if holdings.is_empty() {
            println!("  (no holdings)");
        }
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config_path, account);
        eprintln!("error: sqlite feature is required for holdings");
        ExitCode::from(1)
    }
}
