use crate::history_list::HistoryRow;
use crate::models::{HistoryItem, Metric};

const RULE_WIDTH: usize = 64;
const BAR_WIDTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Good,
    Fair,
    Poor,
}

/// Overall score bands: 80+ good, 50+ fair.
pub fn score_band(score: f64) -> Band {
    if score >= 80.0 {
        Band::Good
    } else if score >= 50.0 {
        Band::Fair
    } else {
        Band::Poor
    }
}

/// Metric rating bands: 8+ good, 5+ fair.
pub fn rating_band(rating: f64) -> Band {
    if rating >= 8.0 {
        Band::Good
    } else if rating >= 5.0 {
        Band::Fair
    } else {
        Band::Poor
    }
}

/// Format a number without a trailing ".0" when it is whole.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

/// A 0-10 rating as a fixed-width bar, e.g. "█████████░".
pub fn rating_bar(rating: f64) -> String {
    let filled = (rating.clamp(0.0, 10.0) / 10.0 * BAR_WIDTH as f64).round() as usize;
    format!(
        "{}{}",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(BAR_WIDTH - filled)
    )
}

fn format_metric_line(metric: &Metric) -> String {
    format!(
        "{:<20} {:>14}  {} {:>4}/10",
        metric.name,
        metric.value,
        rating_bar(metric.rating),
        format_number(metric.rating)
    )
}

/// Plain-text report for one analysis.
pub fn format_report(item: &HistoryItem) -> String {
    let separator = "\u{2500}".repeat(RULE_WIDTH);
    let result = &item.result;
    let mut output = String::new();

    output.push_str(&format!("Analysis for: {}\n", item.file_name));
    output.push_str(&format!("Analyzed:     {}\n", item.timestamp));
    output.push_str(&separator);
    output.push('\n');
    output.push_str(&format!(
        "Overall Score: {} / 100\nVerdict:       {}\n\n{}\n",
        format_number(result.overall_score),
        result.recommendation,
        result.summary
    ));
    output.push_str(&separator);
    output.push('\n');

    for metric in &result.metrics {
        output.push_str(&format_metric_line(metric));
        output.push('\n');
        output.push_str(&format!("    {}\n", metric.explanation));
    }

    output.push_str(&separator);
    output
}

/// Side-by-side summary of two analyses, `left` being the older one.
pub fn format_comparison(left: &HistoryItem, right: &HistoryItem) -> String {
    let separator = "\u{2500}".repeat(RULE_WIDTH);
    let mut output = String::new();

    output.push_str(&format!(
        "{:<24} {:>18} {:>18}\n",
        "", truncate(&left.file_name, 18), truncate(&right.file_name, 18)
    ));
    output.push_str(&separator);
    output.push('\n');
    output.push_str(&format!(
        "{:<24} {:>18} {:>18}\n",
        "Overall Score",
        format_number(left.result.overall_score),
        format_number(right.result.overall_score)
    ));
    output.push_str(&format!(
        "{:<24} {:>18} {:>18}\n",
        "Verdict",
        truncate(left.result.recommendation.as_str(), 18),
        truncate(right.result.recommendation.as_str(), 18)
    ));

    // Metrics in the older analysis' order, then any only the newer one has
    let mut names: Vec<&str> = left.result.metrics.iter().map(|m| m.name.as_str()).collect();
    for metric in &right.result.metrics {
        if !names.contains(&metric.name.as_str()) {
            names.push(&metric.name);
        }
    }
    for name in names {
        output.push_str(&format!(
            "{:<24} {:>18} {:>18}\n",
            truncate(name, 24),
            metric_rating(left, name),
            metric_rating(right, name)
        ));
    }

    output.push_str(&separator);
    output
}

fn metric_rating(item: &HistoryItem, name: &str) -> String {
    item.result
        .metrics
        .iter()
        .find(|m| m.name == name)
        .map(|m| format!("{}/10", format_number(m.rating)))
        .unwrap_or_else(|| "--".to_string())
}

/// History list as a table, in the given row order.
pub fn format_history_table(rows: &[HistoryRow]) -> String {
    if rows.is_empty() {
        return "Your past analyses will appear here.".to_string();
    }

    let separator = "\u{2500}".repeat(RULE_WIDTH + 16);
    let mut output = String::new();
    output.push_str(&format!(
        "{:<15} {:<20} {:<24} {:<22} {:>5}\n",
        "ID", "Analyzed", "File", "Verdict", "Score"
    ));
    output.push_str(&separator);
    output.push('\n');
    for row in rows {
        output.push_str(&format!(
            "{:<15} {:<20} {:<24} {:<22} {:>5}\n",
            row.item.id,
            row.item.timestamp,
            truncate(&row.item.file_name, 24),
            row.item.result.recommendation,
            format_number(row.item.result.overall_score)
        ));
    }
    output.push_str(&separator);
    output.push('\n');
    output.push_str(&format!("Number of analyses: {}", rows.len()));
    output
}

/// Pretty-printed JSON for one history entry.
pub fn format_json(item: &HistoryItem) -> String {
    serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string())
}

/// Shorten to `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}\u{2026}", kept)
    }
}
