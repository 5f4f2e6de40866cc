//! Static SVG drawings of chart series for the admin dashboard.

use std::f64::consts::PI;
use std::fmt::Write;

use super::chart::{ChartKind, ChartSeries};

const WIDTH: f64 = 480.0;
const HEIGHT: f64 = 260.0;
const EMPTY_FILL: &str = "#e2e8f0";
const LABEL_CHARS: usize = 14;

fn short_label(label: &str) -> String {
    if label.chars().count() <= LABEL_CHARS {
        return label.to_string();
    }
    let mut cut: String = label.chars().take(LABEL_CHARS - 1).collect();
    cut.push('…');
    cut
}

fn open_svg(out: &mut String, title: &str) {
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH} {HEIGHT}" role="img" aria-label="{}">"#,
        tera::escape_html(title)
    );
}

fn pie(series: &ChartSeries) -> String {
    let (cx, cy, r) = (120.0, 130.0, 110.0);
    let total = series.total() as f64;
    let mut out = String::new();
    open_svg(&mut out, &series.title);

    if total == 0.0 {
        let _ = write!(out, r#"<circle cx="{cx}" cy="{cy}" r="{r}" fill="{EMPTY_FILL}"/>"#);
    } else {
        let mut angle = -PI / 2.0;
        for (count, color) in series.data.iter().zip(&series.colors) {
            if *count == 0 {
                continue;
            }
            let sweep = *count as f64 / total * 2.0 * PI;
            if (sweep - 2.0 * PI).abs() < 1e-9 {
                let _ = write!(out, r#"<circle cx="{cx}" cy="{cy}" r="{r}" fill="{color}"/>"#);
                break;
            }
            let (x1, y1) = (cx + r * angle.cos(), cy + r * angle.sin());
            angle += sweep;
            let (x2, y2) = (cx + r * angle.cos(), cy + r * angle.sin());
            let large = if sweep > PI { 1 } else { 0 };
            let _ = write!(
                out,
                r#"<path d="M{cx},{cy} L{x1:.2},{y1:.2} A{r},{r} 0 {large} 1 {x2:.2},{y2:.2} Z" fill="{color}"/>"#
            );
        }
    }

    for (idx, ((label, count), color)) in series
        .labels
        .iter()
        .zip(&series.data)
        .zip(&series.colors)
        .enumerate()
    {
        let y = 30.0 + idx as f64 * 22.0;
        let _ = write!(
            out,
            r#"<rect x="260" y="{}" width="12" height="12" fill="{color}"/><text x="280" y="{}" font-size="12">{} ({count})</text>"#,
            y - 10.0,
            y,
            tera::escape_html(&short_label(label))
        );
    }
    out.push_str("</svg>");
    out
}

fn bar(series: &ChartSeries) -> String {
    let (left, bottom, top) = (30.0, HEIGHT - 40.0, 20.0);
    let max = series.data.iter().copied().max().unwrap_or(0).max(1) as f64;
    let slots = series.labels.len().max(1) as f64;
    let slot = (WIDTH - left - 10.0) / slots;
    let mut out = String::new();
    open_svg(&mut out, &series.title);
    let _ = write!(
        out,
        r##"<line x1="{left}" y1="{bottom}" x2="{}" y2="{bottom}" stroke="#94a3b8"/>"##,
        WIDTH - 10.0
    );
    let _ = write!(
        out,
        r#"<text x="4" y="{}" font-size="11">{}</text>"#,
        top + 4.0,
        max as u64
    );

    for (idx, ((label, count), color)) in series
        .labels
        .iter()
        .zip(&series.data)
        .zip(&series.colors)
        .enumerate()
    {
        let height = (*count as f64 / max) * (bottom - top);
        let x = left + idx as f64 * slot + slot * 0.15;
        let _ = write!(
            out,
            r#"<rect x="{x:.2}" y="{:.2}" width="{:.2}" height="{height:.2}" fill="{color}"><title>{} ({count})</title></rect>"#,
            bottom - height,
            slot * 0.7,
            tera::escape_html(label)
        );
        let _ = write!(
            out,
            r#"<text x="{:.2}" y="{}" font-size="10" text-anchor="middle">{}</text>"#,
            x + slot * 0.35,
            bottom + 14.0,
            tera::escape_html(&short_label(label))
        );
    }
    out.push_str("</svg>");
    out
}

pub fn render_svg(series: &ChartSeries) -> String {
    match series.kind {
        ChartKind::Pie => pie(series),
        ChartKind::Bar => bar(series),
    }
}
