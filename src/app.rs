// src/app.rs

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use reqwest::Client;
use tracing::{error, info, instrument, warn};

use crate::config::{SheetLayout, SheetSource};
use crate::error::LoadError;
use crate::fetch::fetch_csv;
use crate::process::{parse_sheet, Dataset};
use crate::render::chart::ChartType;
use crate::render::page::render_page;
use crate::stats;

/// Session state shown on the page.
#[derive(Debug, Clone, Default)]
pub struct ViewerState {
    pub dataset: Dataset,
    pub selected_metric: Option<String>,
    pub chart_type: ChartType,
    /// Message of the most recent failed load, cleared when a load starts.
    pub error: Option<String>,
    pub loading: bool,
}

/// Outcome of a reload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Loaded { records: usize },
    Failed,
    /// A load was already running.
    Busy,
}

/// Owns the session state and runs the fetch → parse pipeline into it.
pub struct Viewer {
    client: Client,
    source: SheetSource,
    layout: SheetLayout,
    state: ViewerState,
    /// Page rewritten after every state change, if set.
    output: Option<PathBuf>,
}

impl Viewer {
    pub fn new(client: Client, source: SheetSource, layout: SheetLayout) -> Self {
        Self {
            client,
            source,
            layout,
            state: ViewerState::default(),
            output: None,
        }
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    /// Fetch and parse the sheet, replacing the dataset on success.
    ///
    /// On failure the previous dataset stays and the error message is kept
    /// for display. Rejected while another load is in flight.
    #[instrument(level = "info", skip(self), fields(gid = %self.source.gid))]
    pub async fn reload(&mut self) -> ReloadOutcome {
        if self.state.loading {
            warn!("reload ignored, load already in progress");
            return ReloadOutcome::Busy;
        }
        self.state.loading = true;
        self.state.error = None;
        self.publish();

        let guard = LoadingGuard { viewer: &mut *self };
        let result = guard.viewer.load().await;
        guard.viewer.state.loading = false;
        drop(guard);

        let outcome = match result {
            Ok(dataset) => {
                let records = dataset.records.len();
                self.apply(dataset);
                info!(records, "load complete");
                ReloadOutcome::Loaded { records }
            }
            Err(e) => {
                error!(kind = e.kind(), error = %e, "load failed");
                self.state.error = Some(e.to_string());
                ReloadOutcome::Failed
            }
        };
        self.publish();
        outcome
    }

    async fn load(&self) -> Result<Dataset, LoadError> {
        let url = self.source.export_url().map_err(|e| LoadError::Fetch {
            status: None,
            reason: format!("{:#}", e),
        })?;
        let body = fetch_csv(&self.client, &url).await?;
        self.parse(&body)
    }

    /// Run the parse step on already-fetched CSV bytes.
    pub fn parse(&self, csv: &[u8]) -> Result<Dataset, LoadError> {
        parse_sheet(csv, &self.layout)
    }

    /// Replace the dataset wholesale and select its first metric.
    pub fn apply(&mut self, dataset: Dataset) {
        if let Some(first) = dataset.headers.first() {
            self.state.selected_metric = Some(first.clone());
        }
        self.state.dataset = dataset;
    }

    /// Select a metric by exact name or by 1-based position in the header list.
    pub fn select_metric(&mut self, name_or_index: &str) -> Result<&str> {
        let headers = &self.state.dataset.headers;
        let found = headers
            .iter()
            .find(|h| h.as_str() == name_or_index)
            .or_else(|| {
                name_or_index
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| i.checked_sub(1))
                    .and_then(|i| headers.get(i))
            })
            .cloned();

        match found {
            Some(metric) => {
                info!(%metric, "metric selected");
                self.state.selected_metric = Some(metric);
                self.publish();
                Ok(self.state.selected_metric.as_deref().unwrap_or_default())
            }
            None => bail!("unknown metric `{}`", name_or_index),
        }
    }

    pub fn set_chart_type(&mut self, chart_type: ChartType) {
        info!(chart = chart_type.as_str(), "chart type selected");
        self.state.chart_type = chart_type;
        self.publish();
    }

    pub fn render(&self) -> String {
        render_page(&self.state, stats::today())
    }

    /// Write the rendered page to `path`.
    pub fn write_page(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.render())
            .with_context(|| format!("writing page to {}", path.display()))
    }

    /// Rewrite the output page, if any. Failures are logged, not returned.
    pub fn publish(&self) {
        if let Some(path) = &self.output {
            if let Err(e) = self.write_page(path) {
                error!("{:#}", e);
            }
        }
    }
}

/// Clears the loading flag when a reload future is dropped mid-load.
struct LoadingGuard<'a> {
    viewer: &'a mut Viewer,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.viewer.state.loading {
            warn!("load cancelled");
            self.viewer.state.loading = false;
            self.viewer.publish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const SAMPLE: &str = "\
タイトル,,,,
,,,,
,,,売上,達成率%
,日付,,,
,2024-01-01,,\"1,000\",80%
,2024-01-02,,\"2,000\",120%
";

    fn viewer() -> Viewer {
        Viewer::new(Client::new(), SheetSource::default(), SheetLayout::default())
    }

    /// Serve `responses` one connection at a time on a loopback port and
    /// return a viewer whose source points at it.
    async fn local_viewer(responses: Vec<String>) -> Result<Viewer> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            for response in responses {
                let Ok((mut sock, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = [0u8; 2048];
                let _ = sock.read(&mut buf).await;
                let _ = sock.write_all(response.as_bytes()).await;
                let _ = sock.shutdown().await;
            }
        });
        let source = SheetSource {
            base_url: format!("http://{}/spreadsheets/d/", addr),
            ..SheetSource::default()
        };
        Ok(Viewer::new(Client::new(), source, SheetLayout::default()))
    }

    fn ok_response(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        )
    }

    #[test]
    fn apply_selects_first_metric() -> Result<()> {
        let mut v = viewer();
        let ds = v.parse(SAMPLE.as_bytes())?;
        v.apply(ds);
        assert_eq!(v.state().selected_metric.as_deref(), Some("売上"));
        assert_eq!(v.state().dataset.records.len(), 2);
        Ok(())
    }

    #[test]
    fn select_by_name_or_position() -> Result<()> {
        let mut v = viewer();
        let ds = v.parse(SAMPLE.as_bytes())?;
        v.apply(ds);
        assert_eq!(v.select_metric("達成率%")?, "達成率%");
        assert_eq!(v.select_metric("1")?, "売上");
        assert!(v.select_metric("0").is_err());
        assert!(v.select_metric("利益").is_err());
        assert_eq!(v.state().selected_metric.as_deref(), Some("売上"));
        Ok(())
    }

    #[test]
    fn writes_page() -> Result<()> {
        let mut v = viewer();
        let ds = v.parse(SAMPLE.as_bytes())?;
        v.apply(ds);
        v.set_chart_type(ChartType::Bar);
        let dir = tempdir()?;
        let path = dir.path().join("viewer.html");
        v.write_page(&path)?;
        let html = std::fs::read_to_string(&path)?;
        assert!(html.contains("<table class=\"data\">"));
        assert!(html.contains("value=\"bar\" selected"));
        Ok(())
    }

    #[tokio::test]
    async fn reload_replaces_then_keeps_data_on_error() -> Result<()> {
        let mut v = local_viewer(vec![
            ok_response(SAMPLE),
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                .to_string(),
            ok_response("too\nshort\n"),
        ])
        .await?;

        assert_eq!(v.reload().await, ReloadOutcome::Loaded { records: 2 });
        assert_eq!(v.state().selected_metric.as_deref(), Some("売上"));
        assert!(v.state().error.is_none());
        assert!(!v.state().loading);

        assert_eq!(v.reload().await, ReloadOutcome::Failed);
        let msg = v.state().error.clone().unwrap_or_default();
        assert!(msg.contains("500"), "{msg}");
        assert_eq!(v.state().dataset.records.len(), 2);
        assert!(!v.state().loading);

        assert_eq!(v.reload().await, ReloadOutcome::Failed);
        let msg = v.state().error.clone().unwrap_or_default();
        assert!(msg.starts_with("データの処理中にエラーが発生しました"), "{msg}");
        assert_eq!(v.state().dataset.records.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn output_page_follows_state() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("viewer.html");
        let mut v = local_viewer(vec![ok_response(SAMPLE)])
            .await?
            .with_output(&path);

        v.reload().await;
        let html = std::fs::read_to_string(&path)?;
        assert!(html.contains("データを更新"));
        assert!(html.contains("<option value=\"売上\" selected>"));

        v.select_metric("達成率%")?;
        let html = std::fs::read_to_string(&path)?;
        assert!(html.contains("<option value=\"達成率%\" selected>"));
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_reload_clears_loading() -> Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        // Accept connections and never answer.
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((sock, _)) = listener.accept().await {
                held.push(sock);
            }
        });
        let dir = tempdir()?;
        let path = dir.path().join("viewer.html");
        let source = SheetSource {
            base_url: format!("http://{}/spreadsheets/d/", addr),
            ..SheetSource::default()
        };
        let mut v = Viewer::new(Client::new(), source, SheetLayout::default()).with_output(&path);

        let timed_out = tokio::time::timeout(Duration::from_millis(200), v.reload()).await;
        assert!(timed_out.is_err());
        assert!(!v.state().loading);
        let html = std::fs::read_to_string(&path)?;
        assert!(html.contains("データを更新"));
        assert!(!html.contains("データ取得中..."));

        let again = tokio::time::timeout(Duration::from_millis(200), v.reload()).await;
        assert!(!matches!(again, Ok(ReloadOutcome::Busy)));
        assert!(!v.state().loading);
        Ok(())
    }

    #[tokio::test]
    async fn busy_reload_is_rejected() {
        let mut v = viewer();
        v.state.loading = true;
        assert_eq!(v.reload().await, ReloadOutcome::Busy);
        assert!(v.state().loading);
    }
}
