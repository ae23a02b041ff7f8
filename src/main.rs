use anyhow::Result;
use reqwest::Client;
use sheetview::{
    command::{Command, HELP},
    config::{SheetLayout, SheetSource, OUTPUT_PAGE},
    ReloadOutcome, Viewer,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sheetview=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    // ─── 2) initial load ─────────────────────────────────────────────
    let source = SheetSource::default();
    info!(url = %source.export_url()?, "sheet source");
    let mut viewer =
        Viewer::new(Client::new(), source, SheetLayout::default()).with_output(OUTPUT_PAGE);

    report(viewer.reload().await);
    info!("page written to {}", OUTPUT_PAGE);
    println!("{}", HELP);

    // ─── 3) command loop ─────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let cmd = match line.parse::<Command>() {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("{:#}", e);
                continue;
            }
        };

        match cmd {
            Command::Metric(name) => {
                if let Err(e) = viewer.select_metric(&name) {
                    warn!("{:#}", e);
                }
            }
            Command::Chart(ty) => viewer.set_chart_type(ty),
            Command::Reload => report(viewer.reload().await),
            Command::List => {
                let state = viewer.state();
                for (i, h) in state.dataset.headers.iter().enumerate() {
                    let mark = if state.selected_metric.as_deref() == Some(h.as_str()) { "*" } else { " " };
                    println!("{} {:>3} {}", mark, i + 1, h);
                }
            }
            Command::Dump => {
                println!("{}", serde_json::to_string_pretty(&viewer.state().dataset.to_json())?);
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    info!("all done");
    Ok(())
}

fn report(outcome: ReloadOutcome) {
    match outcome {
        ReloadOutcome::Loaded { records } => info!(records, "sheet loaded"),
        ReloadOutcome::Failed => warn!("sheet load failed, previous data kept"),
        ReloadOutcome::Busy => warn!("load already running"),
    }
}
