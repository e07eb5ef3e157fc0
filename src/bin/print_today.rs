// src/bin/print_today.rs
use btc_this_day::config::Config;
use btc_this_day::services::context::AppContext;
use btc_this_day::services::views::{build_table, write_table_csv};
use log::{error, info};
use env_logger;
use dotenv::dotenv;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let ctx = AppContext::initialize(config).await?;

    // Usage: print_today [--csv] [YYYY-MM-DD]
    let args: Vec<String> = env::args().skip(1).collect();
    let as_csv = args.iter().any(|a| a == "--csv");

    if let Some(input) = args.iter().find(|a| a.as_str() != "--csv") {
        match ctx.set_genesis(input, false).await {
            Ok(Some(genesis)) => info!("Genesis {} resolved to {} @ {}", input, genesis.resolved_date, genesis.price),
            Ok(None) => {}
            Err(e) => error!("{}", e.user_message()),
        }
    }

    let table = ctx.with_current_state(build_table).await;

    if as_csv {
        write_table_csv(&table, std::io::stdout().lock())?;
        return Ok(());
    }

    println!("BTC on {}", table.header);
    if let Some(msg) = &table.empty_message {
        println!("{}", msg);
        return Ok(());
    }

    if table.show_my_genesis {
        println!("{:<40} {:>12} {:>12} {:>12} {:>10}", "Date", "Price", "Return", "My Return", "5y CAGR");
    } else {
        println!("{:<40} {:>12} {:>12} {:>10}", "Date", "Price", "Return", "5y CAGR");
    }

    for row in &table.rows {
        let label = if row.is_current_year {
            format!("{} [LIVE]", row.date_label)
        } else {
            row.date_label.clone()
        };
        match &row.return_since_my_genesis_text {
            Some(mine) => println!(
                "{:<40} {:>12} {:>12} {:>12} {:>10}",
                label, row.price_text, row.return_since_genesis_text, mine, row.cagr_5y_text
            ),
            None => println!(
                "{:<40} {:>12} {:>12} {:>10}",
                label, row.price_text, row.return_since_genesis_text, row.cagr_5y_text
            ),
        }
    }

    Ok(())
}
