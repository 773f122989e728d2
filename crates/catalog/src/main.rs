//! Boutique catalog command-line tool.
//!
//! Usage:
//!   boutique migrate
//!   boutique list --page 2 --brand 3 --brand 7 --sort price-asc
//!   boutique show 42

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use boutique_catalog::models::{NewProduct, ProductPatch};
use boutique_catalog::{
    CatalogService, Config, ListingRequest, LoggingRevalidator, ProductFilters, db,
};

/// Catalog maintenance and inspection.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending schema migrations.
    Migrate,

    /// List one page of products.
    List(ListArgs),

    /// Show one product with its brand names and categories.
    Show { id: i64 },

    /// Create a product from a JSON document.
    Create {
        /// NewProduct as JSON.
        #[arg(long)]
        json: String,
    },

    /// Update a product from a sparse JSON document.
    Update {
        id: i64,

        /// ProductPatch as JSON.
        #[arg(long)]
        json: String,
    },

    /// Delete a product with its reviews, comments and category links.
    Delete { id: i64 },

    /// List the categories of a product, or every category when no id is given.
    Categories { id: Option<i64> },

    /// List every brand.
    Brands,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Page number (1-indexed).
    #[arg(long)]
    page: Option<u32>,

    /// Rows per page.
    #[arg(long)]
    page_size: Option<u32>,

    /// Brand id; repeat to match any of several.
    #[arg(long = "brand")]
    brands: Vec<i64>,

    /// Category id; repeat to match any of several.
    #[arg(long = "category")]
    categories: Vec<i64>,

    #[arg(long)]
    gender: Option<String>,

    /// Inclusive price ceiling.
    #[arg(long)]
    price_to: Option<Decimal>,

    /// Discount range as MIN-MAX.
    #[arg(long)]
    discount: Option<String>,

    /// Occasion tag; repeat to match any of several.
    #[arg(long = "occasion")]
    occasions: Vec<String>,

    /// COLUMN-DIRECTION, e.g. price-asc.
    #[arg(long)]
    sort: Option<String>,
}

impl From<ListArgs> for ListingRequest {
    fn from(args: ListArgs) -> Self {
        ListingRequest {
            page_no: args.page,
            page_size: args.page_size,
            filters: ProductFilters {
                brand_ids: args.brands,
                category_ids: args.categories,
                gender: args.gender,
                price_range_to: args.price_to,
                discount: args.discount,
                occasions: args.occasions,
                sort_by: args.sort,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context("failed to load configuration")?;
    let pool = db::create_pool(&config).await?;
    info!(
        max_connections = config.database_max_connections,
        "database pool ready"
    );

    if let Command::Migrate = cli.command {
        db::run_migrations(&pool)
            .await
            .context("failed to run migrations")?;
        info!("migrations applied");
        return Ok(());
    }

    let service = CatalogService::new(pool, config.catalog, Arc::new(LoggingRevalidator));
    run(&service, cli.command).await
}

async fn run(service: &CatalogService, command: Command) -> Result<()> {
    match command {
        Command::Migrate => Ok(()),
        Command::List(args) => {
            let page = service.list_products(&args.into()).await?;
            let categories = service.categories_by_product(&page.products).await?;
            print_json(&serde_json::json!({
                "page": page,
                "categories": categories,
            }))
        }
        Command::Show { id } => {
            let product = service.get_product(id).await?;
            let brands = service.brand_names(&product.brand_ids()).await?;
            let categories = service.categories_for_product(id).await?;
            print_json(&serde_json::json!({
                "product": product,
                "brands": brands,
                "categories": categories,
            }))
        }
        Command::Create { json } => {
            let input: NewProduct = serde_json::from_str(&json).context("invalid product JSON")?;
            let id = service.create_product(input).await?;
            print_json(&serde_json::json!({ "id": id }))
        }
        Command::Update { id, json } => {
            let patch: ProductPatch = serde_json::from_str(&json).context("invalid patch JSON")?;
            service.update_product(id, patch).await?;
            print_json(&serde_json::json!({ "id": id, "updated": true }))
        }
        Command::Delete { id } => {
            service.delete_product(id).await?;
            print_json(&serde_json::json!({ "id": id, "deleted": true }))
        }
        Command::Categories { id: Some(id) } => {
            print_json(&service.categories_for_product(id).await?)
        }
        Command::Categories { id: None } => print_json(&service.list_categories().await?),
        Command::Brands => print_json(&service.list_brands().await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
