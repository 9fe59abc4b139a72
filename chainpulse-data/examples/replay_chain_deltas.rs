use chainpulse_data::{
    analytics::Crore,
    positions::{PositionBook, DEFAULT_LOT_SIZE},
    report::{ChainReport, ReportOptions},
    time, ChainSnapshot, ChainTracker, RawChainMessage,
};
use chainpulse_instrument::{MarketIndex, OptionContract};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn main() {
    // Initialise INFO Tracing log subscriber
    init_logging();

    println!("\n════════════════════════════════════════════════════════════");
    println!("🔁 OPTION CHAIN DELTA REPLAY");
    println!("════════════════════════════════════════════════════════════");
    println!("📊 Index: {}", MarketIndex::Nifty50);
    println!("🕰️  Session: 2025-06-02 09:15 IST, one synthetic tick per 30s");
    println!("🎯 Windows: 1m volume deltas, 1m OI deltas, ATM ± 2 strikes");
    println!("════════════════════════════════════════════════════════════\n");

    let open = time::EXCHANGE_TZ
        .with_ymd_and_hms(2025, 6, 2, 9, 15, 0)
        .unwrap()
        .with_timezone(&Utc);

    let mut tracker = ChainTracker::default();
    let mut book = PositionBook::new();
    let options = ReportOptions::default();
    let mut position = None;

    for tick in 0..6u64 {
        let at = open + Duration::seconds(30 * tick as i64);
        let snapshot = match snapshot_at(tick, at) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                eprintln!("Failed to validate synthetic payload: {}", e);
                return;
            }
        };

        let report = ChainReport::build(&snapshot, &mut tracker, &options);
        print_report(&report);

        // Paper-trade the ATM call: enter on the second tick, ride it.
        if tick == 1 {
            if let Some(atm) = report.atm {
                let contract = OptionContract::new(atm, chainpulse_instrument::OptionKind::Call);
                if let Some(row) = snapshot.row(contract) {
                    let id = book.open_at(
                        report.index,
                        contract,
                        row.ltp,
                        DEFAULT_LOT_SIZE,
                        at,
                    );
                    println!("🟢 Opened paper position {} @ {:.2}\n", id, row.ltp);
                    position = Some(id);
                }
            }
        }

        if position.is_some() {
            let summary = book.mark_to_market(&snapshot);
            for marked in &summary.positions {
                println!(
                    "💼 {} | entry {:.2} | ltp {:.2} | PnL {:+.2}",
                    marked.position.contract, marked.position.entry_ltp, marked.current_ltp,
                    marked.pnl
                );
            }
            println!();
        }
    }

    if let Some(id) = position {
        if let Some(closed) = book.exit(MarketIndex::Nifty50, &id) {
            println!("🔴 Exited paper position {}", closed.id);
        }
    }

    println!("════════════════════════════════════════════════════════════");
    println!("✅ Replay complete");
    println!("════════════════════════════════════════════════════════════");
}

/// Render one report the way the dashboard table lays it out.
fn print_report(report: &ChainReport) {
    println!(
        "── {} {} ── spot {} ── ATM {} ──",
        report.index,
        report.generated_at.with_timezone(&time::EXCHANGE_TZ).format("%H:%M:%S"),
        report
            .spot
            .map_or_else(|| "N/A".to_string(), |spot| spot.to_string()),
        report
            .atm
            .map_or_else(|| "N/A".to_string(), |atm| atm.to_string()),
    );
    println!(
        "{:>12} | {:>8} | {:>8} | {:>8} | {:>10} | {:>8}",
        "contract", "ltp", "volume", "Δvol 1m", "oi", "Δoi 1m"
    );

    for row in &report.rows {
        println!(
            "{:>12} | {:>8.2} | {:>8} | {:>8} | {:>10} | {:>8}{}",
            row.contract.to_string(),
            row.ltp,
            row.volume,
            fmt_delta(row.volume_delta),
            row.open_interest,
            fmt_delta(row.oi_delta),
            if row.atm { "  ⭐" } else { "" },
        );
    }

    let insights = &report.insights;
    println!(
        "PCR {} → {} | support {} | resistance {} | call OI {} | put OI {}",
        insights
            .put_call_ratio
            .map_or_else(|| "N/A".to_string(), |pcr| format!("{:.2}", pcr)),
        insights
            .bias
            .map_or("N/A", |bias| bias.label()),
        insights
            .strongest_support
            .map_or_else(|| "N/A".to_string(), |s| s.to_string()),
        insights
            .strongest_resistance
            .map_or_else(|| "N/A".to_string(), |s| s.to_string()),
        Crore::from(insights.total_call_oi),
        Crore::from(insights.total_put_oi),
    );
    println!();
}

fn fmt_delta(delta: Option<i64>) -> String {
    delta.map_or_else(|| "N/A".to_string(), |delta| format!("{:+}", delta))
}

/// Synthetic brokerage payload for one tick, in the vendor's own shape:
/// camelCase spellings, quoted numbers, and the underlying embedded as a
/// pseudo-row with a sentinel strike.
fn snapshot_at(tick: u64, at: DateTime<Utc>) -> Result<ChainSnapshot, chainpulse_data::DataError> {
    let mut chain = vec![serde_json::json!({
        "strikePrice": -1,
        "optionType": "",
        "ltp": format!("{}", 20_010 + 7 * tick),
    })];

    for (offset, strike) in [19_800u64, 19_900, 20_000, 20_100, 20_200].iter().enumerate() {
        let weight = offset as u64 + 1;
        chain.push(serde_json::json!({
            "strikePrice": strike,
            "optionType": "CE",
            "ltp": 50.0 + 2.5 * tick as f64 + offset as f64,
            "volume": weight * 100 * (tick + 1),
            "oi": 10_000 + weight * 90 * (tick + 1),
        }));
        chain.push(serde_json::json!({
            "strikePrice": strike,
            "optionType": "PE",
            "ltp": 40.0 - 1.5 * tick as f64 + offset as f64,
            "volume": weight * 60 * (tick + 1),
            "oi": 12_000 + weight * 70 * (tick + 1),
        }));
    }

    let message: RawChainMessage =
        serde_json::from_value(serde_json::json!({ "data": { "optionsChain": chain } }))
            .expect("synthetic payload is well-formed JSON");

    ChainSnapshot::from_raw(MarketIndex::Nifty50, message, at)
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
