//! Self-contained HTML page: controls, chart, per-point details and table.

use chrono::NaiveDate;
use tracing::warn;

use crate::app::ViewerState;
use crate::process::Dataset;
use crate::render::chart::{render_chart_svg, ChartType};
use crate::render::format::{format_value, html_escape};
use crate::stats::{average_to_date, Average, MetricKind};

/// Render the whole page for the current state. `today` bounds the average.
pub fn render_page(state: &ViewerState, today: NaiveDate) -> String {
    let body = if state.dataset.is_empty() {
        String::new()
    } else {
        render_dataset(state, today)
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>スプレッドシートビューア</title>
    <style>{css}</style>
</head>
<body>
    <header class="app-header"><h1>スプレッドシートビューア</h1></header>
    <main class="container">
        {toolbar}
        {error}
        {body}
    </main>
</body>
</html>"#,
        css = inline_css(),
        toolbar = render_toolbar(state.loading),
        error = render_error(state.error.as_deref()),
        body = body,
    )
}

fn render_toolbar(loading: bool) -> String {
    let (label, disabled) = if loading {
        ("データ取得中...", " disabled")
    } else {
        ("データを更新", "")
    };
    format!(
        r#"<div class="toolbar"><h2>データ可視化</h2><button id="reload"{disabled}>{label}</button></div>"#,
    )
}

fn render_error(error: Option<&str>) -> String {
    match error {
        Some(msg) if !msg.is_empty() => {
            format!(r#"<div class="error" role="alert">{}</div>"#, html_escape(msg))
        }
        _ => String::new(),
    }
}

fn render_dataset(state: &ViewerState, today: NaiveDate) -> String {
    let ds = &state.dataset;
    let metric = state.selected_metric.as_deref().unwrap_or_default();
    let average = if metric.is_empty() {
        None
    } else {
        average_to_date(ds, metric, today)
    };

    let chart = if metric.is_empty() {
        String::new()
    } else {
        render_chart_section(ds, metric, state.chart_type, average)
    };

    format!(
        "{controls}\n{chart}\n{table}",
        controls = render_controls(ds, metric, state.chart_type),
        chart = chart,
        table = render_table(ds),
    )
}

fn render_controls(ds: &Dataset, metric: &str, chart_type: ChartType) -> String {
    let chart_options: String = [ChartType::Line, ChartType::Bar]
        .iter()
        .map(|ty| option(ty.as_str(), ty.label(), *ty == chart_type))
        .collect();
    let metric_options: String = ds
        .headers
        .iter()
        .map(|h| option(h, h, h == metric))
        .collect();

    format!(
        r#"<div class="controls">
    <label>グラフタイプ: <select id="chart-type">{chart_options}</select></label>
    <label>表示するデータ: <select id="metric">{metric_options}</select></label>
</div>"#,
    )
}

fn option(value: &str, label: &str, selected: bool) -> String {
    format!(
        r#"<option value="{}"{}>{}</option>"#,
        html_escape(value),
        if selected { " selected" } else { "" },
        html_escape(label)
    )
}

fn render_chart_section(
    ds: &Dataset,
    metric: &str,
    chart_type: ChartType,
    average: Option<Average>,
) -> String {
    let kind = MetricKind::of(metric);
    let svg = match render_chart_svg(ds, metric, chart_type, average) {
        Ok(svg) => svg,
        Err(e) => {
            warn!(%metric, error = %e, "chart rendering failed");
            format!(r#"<p class="chart-error">{}</p>"#, html_escape(&e.to_string()))
        }
    };
    let summary = match average {
        Some(avg) => format!(
            "<strong>平均値:</strong> {} <span class=\"samples\">({} 件)</span>",
            format_value(avg.value, kind),
            avg.samples
        ),
        None => "<strong>平均値:</strong> データなし".to_string(),
    };

    format!(
        r#"<section class="chart">
    <div class="chart-svg">{svg}</div>
    <p class="average">{summary}</p>
    {details}
</section>"#,
        details = render_point_details(ds, metric, average),
    )
}

/// What a chart tooltip shows, for every point that has a value.
fn render_point_details(ds: &Dataset, metric: &str, average: Option<Average>) -> String {
    let kind = MetricKind::of(metric);
    let items: String = ds
        .series(metric)
        .filter_map(|(date, v)| v.map(|v| (date, v)))
        .map(|(date, v)| {
            let deviation_line = match average {
                Some(avg) => {
                    let dev = avg.deviation_of(v);
                    let class = if dev.deviation >= 0.0 { "up" } else { "down" };
                    let pct = dev
                        .deviation_percent
                        .map(|p| format!("{:.2}%", p))
                        .unwrap_or_else(|| "-".to_string());
                    format!(
                        r#"<p class="{class}"><strong>平均との乖離:</strong> {} ({pct})</p>"#,
                        format_value(dev.deviation, kind),
                    )
                }
                None => String::new(),
            };
            let average_line = average
                .map(|a| format_value(a.value, kind))
                .unwrap_or_else(|| "データなし".to_string());
            format!(
                r#"<li class="point"><p><strong>日付:</strong> {date}</p><p><strong>{name}:</strong> {value}</p><p><strong>平均値:</strong> {average_line}</p>{deviation_line}</li>"#,
                date = html_escape(date),
                name = html_escape(metric),
                value = format_value(v, kind),
            )
        })
        .collect();

    format!(r#"<details class="points"><summary>各データ点の詳細</summary><ul>{items}</ul></details>"#)
}

fn render_table(ds: &Dataset) -> String {
    let head: String = ds
        .headers
        .iter()
        .map(|h| format!("<th>{}</th>", html_escape(h)))
        .collect();
    let kinds: Vec<MetricKind> = ds.headers.iter().map(|h| MetricKind::of(h)).collect();

    let rows: String = ds
        .records
        .iter()
        .map(|r| {
            let cells: String = r
                .values
                .iter()
                .zip(&kinds)
                .map(|(v, kind)| {
                    let text = v.map(|v| format_value(v, *kind)).unwrap_or_default();
                    format!(r#"<td class="num">{}</td>"#, text)
                })
                .collect();
            format!("<tr><td>{}</td>{}</tr>", html_escape(&r.date), cells)
        })
        .collect();

    format!(
        r#"<div class="table-wrap"><table class="data">
<thead><tr><th>日付</th>{head}</tr></thead>
<tbody>{rows}</tbody>
</table></div>"#,
    )
}

fn inline_css() -> &'static str {
    r#"
body { font-family: sans-serif; margin: 0; background: #fafafa; }
.app-header { padding: 12px 20px; background: #282c34; color: white; }
.container { margin: 20px; padding: 20px; background: #fff; border-radius: 8px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
.toolbar { display: flex; justify-content: space-between; align-items: center; margin-bottom: 20px; }
.toolbar h2 { margin: 0; }
button { padding: 8px 16px; background: #f0f0f0; border: 1px solid #ddd; border-radius: 4px; }
button[disabled] { cursor: not-allowed; }
.error { color: #dc2626; padding: 12px; margin-bottom: 20px; background: #fee2e2; border: 1px solid #fecaca; border-radius: 4px; }
.controls { display: flex; gap: 20px; margin-bottom: 20px; align-items: center; }
select { padding: 8px; border: 1px solid #ddd; border-radius: 4px; }
.points ul { list-style: none; padding: 0; display: flex; flex-wrap: wrap; gap: 8px; }
.point { padding: 10px; border: 1px solid #ccc; border-radius: 4px; background: #fff; }
.point p { margin: 0 0 5px; }
.up { color: #4caf50; }
.down { color: #f44336; }
.table-wrap { margin-top: 20px; overflow-x: auto; }
table.data { width: 100%; border-collapse: collapse; border: 1px solid #ddd; }
table.data th { padding: 10px; border: 1px solid #ddd; background: #f5f5f5; }
table.data td { padding: 10px; border: 1px solid #ddd; }
table.data td.num { text-align: right; }
"#
}
