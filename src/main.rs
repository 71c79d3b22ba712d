use std::env;

use anyhow::Result;
use chrono::Utc;
use compintel_rs::ranking::{DEFAULT_TOP_LIMIT, DEFAULT_WINDOW_DAYS};
use compintel_rs::{NewsFilter, NewsStore, marker_radius, resolve, top_threats};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <snapshot.json> [region]", args[0]);
        eprintln!("       {} migrate <snapshot.json>", args[0]);
        eprintln!("  snapshot.json: export with \"competitors\" and \"news\" arrays");
        eprintln!("  region: MENA, Europe, North America, APAC, South America, Middle East, ...");
        eprintln!("  migrate: fill in missing regions from each row's details and save");
        std::process::exit(1);
    }

    if args[1] == "migrate" {
        let Some(path) = args.get(2) else {
            eprintln!("Usage: {} migrate <snapshot.json>", args[0]);
            std::process::exit(1);
        };
        let store = NewsStore::load(path).await?;
        let updated = store.backfill_regions().await?;
        println!("Migration complete. Updated {} record(s).", updated);
        return Ok(());
    }

    let store = NewsStore::load(&args[1]).await?;

    let filter = match args.get(2) {
        Some(region) => NewsFilter::for_region(region.as_str()),
        None => NewsFilter::default(),
    };
    let items = store.list(&filter).await?;

    println!("{} news item(s)", items.len());

    let placement = resolve(&items);
    let max_count = placement.max_count();

    let mut buckets: Vec<_> = placement.buckets.values().collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    println!("\nMap buckets:");
    for bucket in buckets {
        println!(
            "  {:<24} {:>4} item(s)  max threat {}  at [{:.4}, {:.4}]  r={:.1}px",
            bucket.name,
            bucket.count,
            bucket.max_severity,
            bucket.coordinates.longitude(),
            bucket.coordinates.latitude(),
            marker_radius(bucket.count, max_count)
        );
    }
    println!("  {:<24} {:>4} item(s)", "(global/unresolved)", placement.unresolved);

    let top = top_threats(&items, Utc::now(), DEFAULT_WINDOW_DAYS, DEFAULT_TOP_LIMIT);
    if !top.is_empty() {
        println!("\nTop threats (last {} days):", DEFAULT_WINDOW_DAYS);
        for (i, ranked) in top.iter().enumerate() {
            println!(
                "  {}. [{}] {} (threat {}/5, {}, score {})",
                i + 1,
                ranked.item.competitor_id,
                ranked.item.title,
                ranked.item.threat_level,
                ranked.item.region_label().unwrap_or("Global"),
                ranked.score
            );
        }
    }

    Ok(())
}
