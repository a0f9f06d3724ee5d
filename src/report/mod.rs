//! JSON and HTML report generation, plus the chart series.

use crate::anomaly::AnomalySeverity;
use crate::config::CHART_TOP_N;
use crate::error::BalanceResult;
use crate::metrics::{MetricKey, REGISTRY};
use crate::pipeline::{ChartMetric, Controls, PipelineOutput, ScoredWeapon};
use crate::util::normalize_name;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// One bar of the chart: a weapon and its plotted value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: Option<f64>,
}

/// First `n` rows in their current sort order, paired with Score (0–100) or resolved TTK.
pub fn chart_series(rows: &[ScoredWeapon], metric: ChartMetric, n: usize) -> Vec<ChartPoint> {
    rows.iter()
        .take(n)
        .map(|r| ChartPoint {
            name: r.record.name.clone(),
            value: match metric {
                ChartMetric::Score => r.score,
                ChartMetric::Ttk => r.ttk(),
            },
        })
        .collect()
}

#[derive(Serialize)]
struct ReportEnvelope<'a> {
    generated_at: String,
    status: String,
    validation_text: String,
    controls: &'a Controls,
    chart: Vec<ChartPoint>,
    #[serde(flatten)]
    output: &'a PipelineOutput,
}

pub fn write_json_report(
    output: &PipelineOutput,
    controls: &Controls,
    path: &Path,
) -> BalanceResult<()> {
    let envelope = ReportEnvelope {
        generated_at: chrono::Utc::now().to_rfc3339(),
        status: output.status_text(),
        validation_text: format!(
            "{} | {}",
            output.validation.ok_text(),
            output.validation.missing_text()
        ),
        controls,
        chart: chart_series(&output.rows, controls.chart_metric, CHART_TOP_N),
        output,
    };
    let json = serde_json::to_string_pretty(&envelope)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn write_html_report(
    output: &PipelineOutput,
    controls: &Controls,
    out_dir: &Path,
) -> BalanceResult<()> {
    fs::create_dir_all(out_dir)?;
    let pages = weapon_page_names(&output.rows);
    fs::write(out_dir.join("index.html"), render_index(output, controls, &pages))?;
    fs::write(out_dir.join("anomalies.html"), render_anomalies_page(output))?;
    for (row, page) in output.rows.iter().zip(&pages) {
        fs::write(out_dir.join(page), render_weapon_page(row))?;
    }
    Ok(())
}

/// `weapon_<slug>.html`, where the slug keeps lowercase letters and digits and maps
/// everything else to `_`.
pub fn weapon_page_name(name: &str) -> String {
    format!("weapon_{}.html", page_slug(name))
}

fn page_slug(name: &str) -> String {
    normalize_name(name)
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Page file per row, aligned with `rows`. Slugs that collide get `_2`, `_3`, ... in row order.
pub fn weapon_page_names(rows: &[ScoredWeapon]) -> Vec<String> {
    let mut used = HashSet::new();
    rows.iter()
        .map(|r| {
            let slug = page_slug(&r.record.name);
            let mut name = format!("weapon_{}.html", slug);
            let mut n = 2;
            while !used.insert(name.clone()) {
                name = format!("weapon_{}_{}.html", slug, n);
                n += 1;
            }
            name
        })
        .collect()
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) => format!("{:.*}", decimals, v),
        None => "-".to_string(),
    }
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:1rem;} table{border-collapse:collapse;} th,td{border:1px solid #ccc;padding:6px;} a{color:#06c;} .bar{background:#06c;height:8px;} .track{background:#eee;width:160px;} .info{color:#666;} .warn{color:#c60;} .crit{color:#c00;} .info,.warn,.crit{margin:8px 0;padding:6px;border-left:4px solid;}";

fn render_index(output: &PipelineOutput, controls: &Controls, pages: &[String]) -> String {
    let rows: String = output
        .rows
        .iter()
        .zip(pages)
        .map(|(r, page)| {
            let top = if r.role_dominance_top10 { " ★" } else { "" };
            let spike = if r.outlier_warning { " ⚠" } else { "" };
            format!(
                r#"<tr><td><a href="{}">{}</a></td><td>{}</td><td>{}</td><td>{}%{}</td><td>{}σ{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
                html_escape(page),
                html_escape(&r.record.name),
                html_escape(&r.record.category),
                fmt_opt(r.score, 1),
                fmt_opt(r.role_dominance_index, 1),
                top,
                fmt_opt(r.outlier_index, 2),
                spike,
                fmt_opt(r.counter_score, 1),
                fmt_opt(r.ttk(), 2),
                fmt_opt(r.raw.get(MetricKey::Sustain), 1),
                fmt_opt(r.skill_floor, 1),
                fmt_opt(r.skill_ceiling, 1),
            )
        })
        .collect();
    let category = controls.category.as_deref().unwrap_or("All");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Weapon Balance – Rankings</title>
<style>{}</style>
</head>
<body>
<h1>Weapon Balance Report</h1>
<p>Armor {} · Zone {} · Category {} · Preset {} · Sort {} {}</p>
<p>{} · {} · {} · <a href="anomalies.html">Anomalies</a></p>
<input type="text" id="search" placeholder="Search weapon name…" style="margin-bottom:8px;">
<table><thead><tr><th>Weapon</th><th>Category</th><th>Score</th><th>Role</th><th>Outlier</th><th>Counter</th><th>TTK</th><th>Sustain</th><th>Floor</th><th>Ceiling</th></tr></thead>
<tbody>{}</tbody>
</table>
<script>
document.getElementById('search').oninput=function(){{
 var q=this.value.toLowerCase(), rows=document.querySelectorAll('tbody tr');
 rows.forEach(function(r){{
   r.style.display=r.cells[0].textContent.toLowerCase().indexOf(q)===-1?'none':'';
 }});
}};
</script>
</body>
</html>"#,
        STYLE,
        controls.armor,
        controls.zone,
        html_escape(category),
        controls.preset,
        output.sort.key,
        output.sort.dir,
        output.status_text(),
        html_escape(&output.validation.ok_text()),
        html_escape(&output.validation.missing_text()),
        rows
    )
}

fn render_anomalies_page(output: &PipelineOutput) -> String {
    let items: Vec<String> = output
        .validation
        .anomalies
        .iter()
        .map(|a| {
            let sev = match a.severity {
                AnomalySeverity::Info => "info",
                AnomalySeverity::Warn => "warn",
                AnomalySeverity::Crit => "crit",
            };
            format!(
                r#"<div class="{}"><strong>{}:</strong> {} <br><em>{}</em></div>"#,
                sev,
                html_escape(&a.code),
                html_escape(&a.summary),
                html_escape(&a.technical)
            )
        })
        .collect();
    let body = if items.is_empty() {
        "<p>No anomalies detected.</p>".to_string()
    } else {
        items.join("\n")
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Weapon Balance – Anomalies</title>
<style>{}</style>
</head>
<body>
<h1>Anomalies</h1>
<p><a href="index.html">Back to rankings</a></p>
<p>{}</p>
{}
</body>
</html>"#,
        STYLE,
        html_escape(&output.validation.ok_text()),
        body
    )
}

fn bar(v: Option<f64>) -> String {
    match v {
        Some(v) => format!(
            r#"<div class="track"><div class="bar" style="width:{:.0}%"></div></div>"#,
            v * 100.0
        ),
        None => "-".to_string(),
    }
}

fn render_weapon_page(r: &ScoredWeapon) -> String {
    let name = html_escape(&r.record.name);
    let metric_rows: String = REGISTRY
        .iter()
        .map(|d| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                d.label,
                fmt_opt(r.raw.get(d.key), 3),
                fmt_opt(r.normalized.get(d.key), 3),
                bar(r.normalized.get(d.key))
            )
        })
        .collect();
    let bp = &r.raw.breakpoint;
    let band_rows: String = r
        .distance_bands
        .iter()
        .map(|(band, score)| format!("<tr><td>{}</td><td>{}</td></tr>", band, fmt_opt(score, 1)))
        .collect();
    let notes = r
        .record
        .notes
        .as_deref()
        .map(|n| format!("<p>Notes: {}</p>", html_escape(n)))
        .unwrap_or_default();
    let flags = [
        (r.head_dep_high, "High headshot dependency"),
        (r.raw.reloads_every_kill, "Reloads every kill"),
        (r.outlier_warning, "Score spike within category"),
    ]
    .iter()
    .filter(|(on, _)| *on)
    .map(|(_, text)| format!("<li>{}</li>", text))
    .collect::<String>();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{} – Weapon Balance</title>
<style>{}</style>
</head>
<body>
<h1>{}</h1>
<p><a href="index.html">Back to rankings</a></p>
<p>Category {} · Firing mode {} · Armor pen {}</p>
<p>Score {} · Role dominance {}% · Outlier {}σ · Counter {} (rank {}%) · Skill floor {} · Skill ceiling {}</p>
{}
<ul>{}</ul>
<h2>Metrics</h2>
<table><thead><tr><th>Metric</th><th>Raw</th><th>Normalized</th><th></th></tr></thead><tbody>{}</tbody></table>
<p>Consistency {}</p>
<h2>Armor breakpoints (Body)</h2>
<table><thead><tr><th>ΔL</th><th>ΔM</th><th>ΔH</th><th>Avg</th></tr></thead>
<tbody><tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr></tbody></table>
<h2>Distance bands</h2>
<table><thead><tr><th>Band</th><th>Suitability</th></tr></thead><tbody>{}</tbody></table>
</body>
</html>"#,
        name,
        STYLE,
        name,
        html_escape(&r.record.category),
        html_escape(r.record.firing_mode.as_deref().unwrap_or("-")),
        html_escape(r.record.armor_pen_label.as_deref().unwrap_or("-")),
        fmt_opt(r.score, 1),
        fmt_opt(r.role_dominance_index, 1),
        fmt_opt(r.outlier_index, 2),
        fmt_opt(r.counter_score, 1),
        fmt_opt(r.counter_rank, 1),
        fmt_opt(r.skill_floor, 1),
        fmt_opt(r.skill_ceiling, 1),
        notes,
        if flags.is_empty() { "<li>None</li>".to_string() } else { flags },
        metric_rows,
        bar(r.normalized.consistency),
        fmt_opt(bp.delta_l, 2),
        fmt_opt(bp.delta_m, 2),
        fmt_opt(bp.delta_h, 2),
        fmt_opt(bp.avg, 2),
        band_rows
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
