use sqlx::postgres::PgPoolOptions;
use storefront_directory::storage::{ReviewRepository, StoreRepository};
use storefront_directory::{AppConfig, PgStorage};

const TABLES: &[&str] = &["stores", "reviews", "hearts"];

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--create-schema]\n\
         \n\
         Requires env vars:\n\
           DATABASE_URL\n\
         Optional:\n\
           BIND_ADDR, DB_MAX_CONNECTIONS, SLUG_RETRY_LIMIT, TOP_STORES_LIMIT, SEARCH_LIMIT\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let create_schema = args.iter().any(|a| a == "--create-schema");

    // Force-read config (nice error messages if something is malformed)
    let config = AppConfig::from_env()?;
    println!("> Preflight:");
    println!("  BIND_ADDR={}", config.bind_addr);
    println!("  DB_MAX_CONNECTIONS={}", config.db_max_connections);
    println!("  SLUG_RETRY_LIMIT={}", config.service.slug_retry_limit);
    println!("  TOP_STORES_LIMIT={}", config.service.top_stores_limit);
    println!("  SEARCH_LIMIT={}", config.service.search_limit);

    let Some(database_url) = config.database_url.as_deref() else {
        return Err(anyhow::anyhow!(
            "DATABASE_URL is not set; the API server would fall back to in-memory storage"
        ));
    };

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await
        .map_err(|e| anyhow::anyhow!("Could not connect to DATABASE_URL: {}", e))?;
    let storage = PgStorage::from_pool(pool);
    storage.ping().await?;
    println!("  Database reachable.");

    if create_schema {
        storage.ensure_schema().await?;
        println!("  Schema ensured.");
    }

    for table in TABLES {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name::text = $1)",
        )
        .bind(*table)
        .fetch_one(storage.pool())
        .await?;
        if !exists {
            return Err(anyhow::anyhow!(
                "Table '{}' is missing. Re-run with --create-schema",
                table
            ));
        }
    }
    println!("  Tables present: {}", TABLES.join(", "));

    let stores = storage.list_stores(None).await?;
    let reviews = storage.list_reviews().await?;
    println!("  {} stores, {} reviews.", stores.len(), reviews.len());

    println!("> Preflight OK.");
    Ok(())
}
