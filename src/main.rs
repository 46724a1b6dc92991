use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sales_monitor::{
    AppState,
    config::Config,
    models::{
        chart::ChartData,
        filter::{FilterPatch, SortOrder},
        product::ProductsList,
    },
    controllers::listing::FetchMode,
    services::{
        auth::AuthSession,
        notifier::LogNotifier,
        products_api::{HttpProductsApi, StaticToken, TokenSource},
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sales-monitor", about = "Browse and manage product sales data")]
struct Cli {
    /// Bearer token (overrides SALES_MONITOR_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and print the access token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// List products with filters, sorting and paging
    Products {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        sold: Option<bool>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        /// Field to sort by, e.g. `price`
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, requires = "sort")]
        desc: bool,
        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// List product categories
    Categories,
    /// Show the lowest and highest product price
    PriceRange,
    /// Print monthly items and sales per category
    Charts,
    /// Delete a product
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sales_monitor=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Command::Login { username, password } => login(&config, &username, &password).await,
        command => {
            let token = cli.token.or_else(|| config.token.clone());
            run(&config, token, command).await
        }
    }
}

async fn login(config: &Config, username: &str, password: &str) -> Result<()> {
    let auth = AuthSession::new(config.api_base_url());
    auth.login(username, password).await.context("Login failed")?;
    if let Some(token) = auth.token() {
        println!("{}", token);
    }
    Ok(())
}

async fn run(config: &Config, token: Option<String>, command: Command) -> Result<()> {
    let base_url = config.api_base_url();
    if token.is_none() {
        tracing::warn!("No token configured; requests will be sent unauthenticated");
    }

    let api = Arc::new(HttpProductsApi::new(
        &base_url,
        Arc::new(StaticToken(token)),
        config.cache_ttl,
    ));
    let state = AppState::new(config, api, Arc::new(LogNotifier));

    tracing::info!("Using products backend at {}", base_url);

    match command {
        Command::Products {
            search,
            category,
            sold,
            min_price,
            max_price,
            sort,
            desc,
            page,
            page_size,
        } => {
            if let Some(size) = page_size {
                if !config.page_sizes.contains(&size) {
                    bail!("page size must be one of {:?}", config.page_sizes);
                }
            }

            let order = if desc { SortOrder::Desc } else { SortOrder::Asc };
            let mut patch = FilterPatch {
                limit: page_size,
                search: search.map(Some),
                category: category.map(Some),
                is_sold: sold.map(Some),
                price_min: min_price.map(Some),
                price_max: max_price.map(Some),
                ..FilterPatch::default()
            };
            if sort.is_some() {
                patch = patch.sort(sort, order);
            }

            let listing = &state.listing;
            listing.set_filter(patch, FetchMode::Immediate).await?;
            if page > 0 && listing.set_page(page).await?.is_none() {
                bail!("page {} is out of range", page);
            }

            let view = listing.view();
            if let Some(result) = &view.result {
                print_products(result);
                println!(
                    "page {}/{} ({} products)",
                    view.page_index() + 1,
                    view.page_count().max(1),
                    view.count()
                );
            }
        }
        Command::Categories => {
            for category in state.options.load_categories().await? {
                println!("{}", category);
            }
        }
        Command::PriceRange => {
            let range = state.options.load_price_range().await?;
            println!("{:.2} - {:.2}", range.min_price, range.max_price);
        }
        Command::Charts => {
            state.charts.load().await;
            if let Some(chart) = state.charts.items_chart() {
                println!("Total items in each category (monthly):");
                print_chart(&chart);
            }
            if let Some(chart) = state.charts.sales_chart() {
                println!("Category-wise sales amount (monthly):");
                print_chart(&chart);
            }
        }
        Command::Delete { id } => {
            state.editor.delete(id).await?;
        }
        Command::Login { .. } => bail!("login is handled separately"),
    }

    Ok(())
}

fn print_products(list: &ProductsList) {
    if list.is_empty() {
        println!("No products");
        return;
    }

    println!(
        "{:>6}  {:<32}  {:>10}  {:<16}  {:<5}  {:<10}",
        "ID", "TITLE", "PRICE", "CATEGORY", "SOLD", "SALE DATE"
    );
    for product in &list.results {
        println!(
            "{:>6}  {:<32}  {:>10.2}  {:<16}  {:<5}  {:<10}",
            product.id,
            truncate(&product.title, 32),
            product.price,
            product.category.as_deref().unwrap_or("-"),
            if product.sold { "yes" } else { "no" },
            product
                .date_of_sale
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
}

fn print_chart(chart: &ChartData) {
    print!("{:<16}", "");
    for month in &chart.months {
        print!("{:>12}", month);
    }
    println!();
    for series in &chart.series {
        print!("{:<16}", truncate(&series.label, 16));
        for value in &series.data {
            print!("{:>12.2}", value);
        }
        println!();
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
