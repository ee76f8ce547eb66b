use crate::errors::EMPTY_PERIOD_NOTICE;
use crate::models::{AggregateResult, GroupTotal, SalesRecord};
use crate::period::{PeriodKind, PeriodOptions, PeriodSelector};
use std::fmt::Write;

/// What the dashboard page shows for one request.
pub enum DashboardView<'a> {
    /// The sheet loaded but no row had a readable date.
    NoData,
    Empty {
        options: &'a PeriodOptions,
        selector: &'a PeriodSelector,
    },
    Ready {
        options: &'a PeriodOptions,
        result: &'a AggregateResult,
    },
}

pub fn render_dashboard(view: &DashboardView<'_>) -> String {
    let (label, controls, content) = match view {
        DashboardView::NoData => (
            "—".to_string(),
            String::new(),
            notice(EMPTY_PERIOD_NOTICE),
        ),
        DashboardView::Empty { options, selector } => (
            selector.label(),
            render_controls(options, selector),
            notice(EMPTY_PERIOD_NOTICE),
        ),
        DashboardView::Ready { options, result } => (
            result.label.clone(),
            render_controls(options, &result.selector),
            render_result(result),
        ),
    };

    INDEX_HTML
        .replace("{{PERIOD}}", &escape(&label))
        .replace("{{CONTROLS}}", &controls)
        .replace("{{CONTENT}}", &content)
}

fn notice(message: &str) -> String {
    format!(r#"<div class="notice">{}</div>"#, escape(message))
}

fn render_controls(options: &PeriodOptions, selector: &PeriodSelector) -> String {
    let current = selector.kind();
    let mut html = String::from(r#"<form class="controls" method="get" action="/">"#);

    html.push_str(
        r#"<label>Period <select name="period" onchange="this.form.value.value='';this.form.submit()">"#,
    );
    for kind in &options.kinds {
        let _ = write!(
            html,
            r#"<option value="{}"{}>{}</option>"#,
            kind,
            selected(*kind == current),
            kind_title(*kind)
        );
    }
    html.push_str("</select></label>");

    let value = selector.value_string();
    match current {
        PeriodKind::Daily => {
            let _ = write!(
                html,
                r#"<label>Date <input type="date" name="value" value="{}" min="{}" max="{}" /></label>"#,
                escape(&value),
                options.first_date.format("%Y-%m-%d"),
                options.last_date.format("%Y-%m-%d")
            );
        }
        PeriodKind::Weekly => {
            html.push_str(r#"<label>Week <select name="value">"#);
            for week in &options.weeks {
                let _ = write!(
                    html,
                    r#"<option value="{0}"{1}>{0} ({2} – {3})</option>"#,
                    escape(&week.bucket),
                    selected(week.bucket == value),
                    week.start.format("%d %b"),
                    week.end.format("%d %b %Y")
                );
            }
            html.push_str("</select></label>");
        }
        PeriodKind::Monthly => {
            html.push_str(r#"<label>Month <select name="value">"#);
            for month in &options.months {
                let _ = write!(
                    html,
                    r#"<option value="{0}"{1}>{0}</option>"#,
                    escape(month),
                    selected(*month == value)
                );
            }
            html.push_str("</select></label>");
        }
        PeriodKind::Yearly => {
            html.push_str(r#"<label>Year <select name="value">"#);
            for year in &options.years {
                let _ = write!(
                    html,
                    r#"<option value="{0}"{1}>{0}</option>"#,
                    year,
                    selected(year.to_string() == value)
                );
            }
            html.push_str("</select></label>");
        }
    }

    html.push_str(r#"<button type="submit">Show</button></form>"#);
    html
}

fn render_result(result: &AggregateResult) -> String {
    let scents = result
        .distinct_scent_count
        .map(|count| count.to_string())
        .unwrap_or_else(|| "—".to_string());

    let mut html = String::from(r#"<section class="panel">"#);
    for (label, value) in [
        ("Total sold (all time)", result.total_quantity_all.to_string()),
        ("Total sold", result.total_quantity_selected.to_string()),
        ("Variants", result.distinct_variant_count.to_string()),
        ("Scents", scents),
        ("Total stock", result.total_stock.to_string()),
    ] {
        let _ = write!(
            html,
            r#"<div class="stat"><span class="label">{label}</span><span class="value">{value}</span></div>"#
        );
    }
    html.push_str("</section>");

    html.push_str(&group_table(
        "Sales per variant",
        "Variant",
        "Quantity",
        &result.per_variant_totals,
    ));
    if let Some(scent_totals) = &result.per_scent_totals {
        html.push_str(&group_table("Best-selling scents", "Scent", "Quantity", scent_totals));
    }
    html.push_str(&group_table(
        "Stock summary",
        "Variant",
        "Stock",
        &result.stock_by_variant,
    ));
    html.push_str(&records_table(&result.records));
    html
}

/// Largest group first, with each group's share of the column total.
fn group_table(title: &str, key_header: &str, value_header: &str, rows: &[GroupTotal]) -> String {
    let mut sorted: Vec<&GroupTotal> = rows.iter().collect();
    sorted.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
    let total: u64 = rows.iter().map(|row| row.total).sum();

    let mut html = format!(
        r#"<section class="card"><h2>{}</h2><table><thead><tr><th>{}</th><th>{}</th><th>Share</th></tr></thead><tbody>"#,
        escape(title),
        escape(key_header),
        escape(value_header)
    );
    for row in sorted {
        let share = if total == 0 {
            0.0
        } else {
            row.total as f64 * 100.0 / total as f64
        };
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{share:.1}%</td></tr>",
            escape(&row.key),
            row.total
        );
    }
    html.push_str("</tbody></table></section>");
    html
}

fn records_table(records: &[SalesRecord]) -> String {
    let mut html = String::from(
        r#"<section class="card"><h2>Sales records</h2><table><thead><tr><th>No</th><th>Date</th><th>Variant</th><th>Scent</th><th>Quantity</th><th>Price</th><th>Cost</th><th>Stock</th></tr></thead><tbody>"#,
    );
    for record in records {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&record.number),
            record.date.format("%Y-%m-%d"),
            escape(&record.variant),
            escape(record.scent.as_deref().unwrap_or("")),
            record.quantity,
            amount(record.unit_price),
            amount(record.unit_cost),
            record.stock
        );
    }
    html.push_str("</tbody></table></section>");
    html
}

fn amount(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => format!("{v:.2}"),
        None => String::new(),
    }
}

fn kind_title(kind: PeriodKind) -> &'static str {
    match kind {
        PeriodKind::Daily => "Daily",
        PeriodKind::Weekly => "Weekly",
        PeriodKind::Monthly => "Monthly",
        PeriodKind::Yearly => "Yearly",
    }
}

fn selected(is_selected: bool) -> &'static str {
    if is_selected { " selected" } else { "" }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Jenna Scent Sales</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(1100px, 100%);
      margin: 0 auto;
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    h1 {
      font-family: "Georgia", serif;
      font-size: clamp(2rem, 4vw, 2.8rem);
      margin: 0;
      text-align: center;
    }

    .subtitle {
      margin: 0;
      color: #5f5c57;
      text-align: center;
    }

    .controls {
      display: flex;
      flex-wrap: wrap;
      gap: 16px;
      align-items: end;
    }

    .controls label {
      display: grid;
      gap: 6px;
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    select, input, button {
      font: inherit;
      padding: 8px 14px;
      border-radius: 999px;
      border: 1px solid rgba(47, 72, 88, 0.2);
    }

    button {
      background: var(--accent-2);
      color: white;
      cursor: pointer;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
      gap: 16px;
    }

    .stat, .card {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    .stat {
      display: grid;
      gap: 8px;
    }

    .stat .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .stat .value {
      font-size: 1.7rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .card h2 {
      margin: 0 0 12px;
      font-size: 1.3rem;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th, td {
      text-align: left;
      padding: 6px 10px;
      border-bottom: 1px solid rgba(47, 72, 88, 0.08);
    }

    .notice {
      padding: 18px;
      border-radius: 18px;
      background: #fff4d6;
      color: #8a5a00;
      font-weight: 600;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Jenna Scent Sales</h1>
      <p class="subtitle">Period: <strong>{{PERIOD}}</strong></p>
    </header>
    {{CONTROLS}}
    {{CONTENT}}
  </main>
</body>
</html>
"#;
