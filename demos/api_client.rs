/// Example HTTP client demonstrating how to call the dashboard API
///
/// Run the server first:
/// ```bash
/// COMPINTEL_DATA=data/news.json cargo run --bin server
/// ```
///
/// Then run this example:
/// ```bash
/// cargo run --example api_client
/// ```

use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct FlagRequest {
    value: bool,
}

#[derive(Deserialize, Debug)]
struct NewsListResponse {
    success: bool,
    count: usize,
    data: Vec<NewsData>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct NewsData {
    id: String,
    title: String,
    threat_level: i32,
    region: Option<String>,
    is_starred: bool,
}

#[derive(Deserialize, Debug)]
struct ItemResponse {
    data: NewsData,
}

#[derive(Deserialize, Debug)]
struct MapResponse {
    total: usize,
    unresolved: usize,
    buckets: Vec<MapBucket>,
}

#[derive(Deserialize, Debug)]
struct MapBucket {
    name: String,
    coordinates: [f64; 2],
    count: usize,
    max_severity: i32,
    radius: f64,
}

#[derive(Deserialize, Debug)]
struct RefreshStatusResponse {
    status: String,
    processed: u64,
    total: u64,
    percent_complete: u64,
}

#[derive(Deserialize, Debug)]
struct HealthResponse {
    status: String,
    version: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let client = reqwest::Client::new();

    println!("=== Competitor Intel API Client Demo ===\n");

    // 1. Health Check
    println!("1. Checking server health...");
    let health: HealthResponse = client
        .get(format!("{}/health", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!("   Server status: {}", health.status);
    println!("   Version: {}\n", health.version);

    // 2. Unread high-threat news in South America
    println!("2. Listing unread high-threat news in South America...");
    let news: NewsListResponse = client
        .get(format!("{}/api/news", base_url))
        .query(&[("region", "South America"), ("read", "false"), ("min_threat", "4")])
        .send()
        .await?
        .json()
        .await?;
    println!("   success={} count={}", news.success, news.count);
    for item in &news.data {
        println!(
            "   - [{}] {} (threat {}, {})",
            item.id,
            item.title,
            item.threat_level,
            item.region.as_deref().unwrap_or("Global")
        );
    }
    println!();

    // 3. Star the first one
    if let Some(first) = news.data.first() {
        println!("3. Starring {}...", first.id);
        let response = client
            .post(format!("{}/api/news/{}/star", base_url, first.id))
            .json(&FlagRequest { value: true })
            .send()
            .await?;
        if response.status().is_success() {
            let item: ItemResponse = response.json().await?;
            println!("   starred={}\n", item.data.is_starred);
        } else {
            println!("   Error: {}\n", response.text().await?);
        }
    } else {
        println!("3. Nothing to star\n");
    }

    // 4. Map buckets
    println!("4. Fetching map buckets...");
    let map: MapResponse = client
        .get(format!("{}/api/map", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!("   {} item(s), {} unresolved", map.total, map.unresolved);
    for bucket in &map.buckets {
        println!(
            "   {:<20} x{:<3} max threat {} at {:?} r={:.1}",
            bucket.name, bucket.count, bucket.max_severity, bucket.coordinates, bucket.radius
        );
    }
    println!();

    // 5. Refresh status
    println!("5. Checking ingester refresh status...");
    let status: RefreshStatusResponse = client
        .get(format!("{}/api/refresh-status", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!(
        "   {} ({}/{} competitors, {}%)\n",
        status.status, status.processed, status.total, status.percent_complete
    );

    println!("=== Demo Complete ===");

    Ok(())
}
