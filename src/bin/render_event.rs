//! One-shot render of a single selection.
//!
//! Usage: render_event <event-id> [window] [sector|-] [state|-]
//! Prints the Plotly document for the selection, or `No data`.

use anyhow::{anyhow, Context, Result};
use serde_json::json;

use eventband::cache::EventDataCache;
use eventband::catalog::EventCatalog;
use eventband::config::Config;
use eventband::filter::reduce;
use eventband::model::EventId;
use eventband::series::build_chart;
use eventband::source::SourceKind;

fn optional(arg: Option<String>) -> Option<String> {
    arg.filter(|v| v != "-")
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let id = EventId::new(
        args.next()
            .ok_or_else(|| anyhow!("usage: render_event <event-id> [window] [sector|-] [state|-]"))?,
    );
    let cfg = Config::from_env();
    let window = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("bad window '{}'", raw))?,
        None => cfg.default_window,
    };
    let sector = optional(args.next());
    let state = optional(args.next());

    let source = SourceKind::from_config(&cfg).build(&cfg)?;
    let catalog = EventCatalog::load(source.as_ref()).await?;
    let summary = catalog
        .summary(&id)
        .ok_or_else(|| anyhow!("event {} is not in the index", id))?;

    let cache = EventDataCache::new(source);
    let rows = cache.get(&id).await?;
    let filtered = reduce(&rows, sector.as_deref(), state.as_deref(), window);
    if filtered.is_empty() {
        println!("No data");
        return Ok(());
    }

    let chart = build_chart(
        &filtered,
        window,
        &summary.title,
        &summary.date,
        summary.tic,
        cfg.title_wrap,
    );
    println!(
        "{}",
        json!({ "figure": chart.spec.to_plotly(), "eventTime": chart.time_label })
    );
    Ok(())
}
