use chainpulse_data::{tracker::Interval, SharedChainTracker};
use chainpulse_instrument::{MarketIndex, OptionContract};
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() {
    // Initialise INFO Tracing log subscriber
    init_logging();

    println!("\n════════════════════════════════════════════════════════════");
    println!("📡 SHARED TRACKER POLL");
    println!("════════════════════════════════════════════════════════════");
    println!("✍️  Writer: one synthetic chain reading every 200ms");
    println!("👀 Reader: 1m change queries on the same tracker every 400ms");
    println!("════════════════════════════════════════════════════════════\n");

    let tracker = SharedChainTracker::default();
    let contract = OptionContract::call(20000i64);

    // Ingest writer owns a clone of the handle; both clones share one tracker.
    let writer = {
        let tracker = tracker.clone();
        tokio::spawn(async move {
            let mut poll = tokio::time::interval(Duration::from_millis(200));
            for tick in 0..10u64 {
                poll.tick().await;
                tracker.record(
                    MarketIndex::Nifty50,
                    contract,
                    1_000 + 150 * tick,
                    50_000 + 40 * tick,
                );
                info!(%contract, tick, "recorded chain reading");
            }
        })
    };

    // Dashboard reader polls while the writer is still recording. The run is
    // far shorter than a minute, so the window falls back to the oldest
    // retained sample: the delta reads as change since the start of ingest.
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(400)).await;

        match tracker.change_since(MarketIndex::Nifty50, contract, Interval::ONE_MINUTE) {
            Some(delta) => println!(
                "📈 {} | Δvolume {:+} | Δoi {:+}",
                contract, delta.volume, delta.open_interest
            ),
            None => println!("⏳ {} | warming up: need two samples", contract),
        }
    }

    if let Err(e) = writer.await {
        eprintln!("Ingest writer failed: {}", e);
        return;
    }

    let samples = tracker
        .read()
        .sample_count(MarketIndex::Nifty50, contract);
    println!("\n════════════════════════════════════════════════════════════");
    println!("✅ Writer finished - {} samples retained", samples);
    if let Some(delta) =
        tracker.change_since(MarketIndex::Nifty50, contract, Interval::TEN_MINUTES)
    {
        println!(
            "📊 Change over the whole run: Δvolume {:+}, Δoi {:+}",
            delta.volume, delta.open_interest
        );
    }
    println!("════════════════════════════════════════════════════════════");
}

// Initialise an INFO `Subscriber` for `Tracing` logs
fn init_logging() {
    tracing_subscriber::fmt()
        // Filter messages based on the INFO level
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        // Use colored output in debug mode
        .with_ansi(cfg!(debug_assertions))
        // Install this Tracing subscriber as global default
        .init()
}
