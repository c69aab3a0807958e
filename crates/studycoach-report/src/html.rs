//! HTML progress report.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use studycoach_core::history::{HistoryAggregator, TopicStats};
use studycoach_core::model::SkillLevel;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn level_class(level: SkillLevel) -> &'static str {
    match level {
        SkillLevel::Advanced => "pass",
        SkillLevel::Intermediate => "warn",
        SkillLevel::Beginner => "fail",
    }
}

/// Generate an HTML progress report from the quiz history.
pub fn generate_html(history: &HistoryAggregator) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>studycoach progress</title>\n");
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str("<h1>Progress analytics</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">{} quizzes | generated {}</p>\n",
        history.total_quizzes(),
        Local::now().format("%Y-%m-%d %H:%M")
    ));
    html.push_str("</header>\n");

    if history.is_empty() {
        html.push_str("<p>No quiz data yet. Take some quizzes to see your progress!</p>\n");
        html.push_str("</body>\n</html>");
        return html;
    }

    // Overall stats
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Total Quizzes</th><th>Questions Answered</th><th>Correct Answers</th><th>Avg. Accuracy</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr></tbody>\n",
        history.total_quizzes(),
        history.total_questions(),
        history.total_score(),
        history.average_accuracy() * 100.0
    ));
    html.push_str("</table>\n");

    html.push_str("<h2>Performance over time</h2>\n");
    html.push_str(&generate_line_chart(&history.accuracy_series()));

    let topics = history.per_topic();
    html.push_str("<h2>Accuracy by topic</h2>\n");
    html.push_str(&generate_bar_chart(&topics));
    html.push_str("</section>\n");

    // Per-quiz history, newest first
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Quiz history</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">#</th><th onclick=\"sortTable(1)\">Topic</th><th onclick=\"sortTable(2)\">Date</th><th onclick=\"sortTable(3)\">Score</th><th onclick=\"sortTable(4)\">Accuracy</th><th onclick=\"sortTable(5)\">Duration</th><th onclick=\"sortTable(6)\">Level</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    let total = history.total_quizzes();
    for (i, r) in history.recent(total).enumerate() {
        let level = r.level();
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}/{}</td><td>{:.1}%</td><td>{}s</td><td class=\"{}\">{}</td></tr>\n",
            total - i,
            html_escape(&r.topic),
            r.date.format("%Y-%m-%d %H:%M"),
            r.score,
            r.total,
            r.accuracy(),
            r.duration.as_secs(),
            level_class(level),
            level
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(&history.to_json().unwrap_or_default()));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML progress report to a file.
pub fn write_html_report(history: &HistoryAggregator, path: &Path) -> Result<()> {
    let html = generate_html(history);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

/// Accuracy per quiz as an SVG polyline, 0–100 % on the y axis.
fn generate_line_chart(series: &[f64]) -> String {
    let width = 600usize;
    let height = 200usize;
    let padding = 30usize;

    let plot_w = (width - 2 * padding) as f64;
    let plot_h = (height - 2 * padding) as f64;
    let step = if series.len() > 1 {
        plot_w / (series.len() - 1) as f64
    } else {
        0.0
    };

    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .map(|(i, accuracy)| {
            let x = padding as f64 + step * i as f64;
            let y = padding as f64 + plot_h * (1.0 - accuracy.clamp(0.0, 100.0) / 100.0);
            (x, y)
        })
        .collect();

    let mut svg = format!(
        "<svg width=\"{width}\" height=\"{height}\" xmlns=\"http://www.w3.org/2000/svg\">\n"
    );
    svg.push_str(&format!(
        "  <line x1=\"{padding}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"currentColor\" stroke-width=\"1\"/>\n",
        height - padding,
        width - padding,
        height - padding
    ));

    let polyline: Vec<String> = points
        .iter()
        .map(|(x, y)| format!("{x:.1},{y:.1}"))
        .collect();
    svg.push_str(&format!(
        "  <polyline points=\"{}\" fill=\"none\" stroke=\"#3b82f6\" stroke-width=\"2\"/>\n",
        polyline.join(" ")
    ));

    for ((x, y), accuracy) in points.iter().zip(series) {
        svg.push_str(&format!(
            "  <circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"4\" fill=\"#3b82f6\"><title>{accuracy:.1}%</title></circle>\n"
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

fn generate_bar_chart(topics: &[TopicStats]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = topics.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, topic) in topics.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (topic.accuracy * max_width as f64) as usize;

        let color = if topic.accuracy >= 0.8 {
            "#22c55e"
        } else if topic.accuracy >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&topic.topic)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}% ({} quizzes)</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            topic.accuracy * 100.0,
            topic.quizzes
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --warn: #fef9c3; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --warn: #713f12; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.warn { background: var(--warn); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, {numeric: true}) : vb.localeCompare(va, undefined, {numeric: true});
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Duration;
    use studycoach_core::model::HistoryRecord;

    fn make_history() -> HistoryAggregator {
        let date = NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        HistoryAggregator::from_records(vec![
            HistoryRecord {
                topic: "Rust <traits>".into(),
                score: 4,
                total: 5,
                date,
                duration: Duration::from_secs(70),
            },
            HistoryRecord {
                topic: "Calculus".into(),
                score: 1,
                total: 5,
                date,
                duration: Duration::from_secs(75),
            },
        ])
    }

    #[test]
    fn html_report_contains_required_elements() {
        let html = generate_html(&make_history());

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Calculus"));
        assert!(html.contains("Rust &lt;traits&gt;"));
        assert!(!html.contains("Rust <traits>"));
        assert!(html.contains("50.0%"));
        assert!(html.contains("<polyline"));
        assert!(html.contains("beginner"));
    }

    #[test]
    fn html_report_for_empty_history() {
        let html = generate_html(&HistoryAggregator::new());
        assert!(html.contains("No quiz data yet"));
        assert!(html.ends_with("</html>"));
    }

    #[test]
    fn line_chart_single_point() {
        let svg = generate_line_chart(&[100.0]);
        assert!(svg.contains("<circle cx=\"30.0\" cy=\"30.0\""));
    }

    #[test]
    fn html_report_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.html");

        write_html_report(&make_history(), &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
