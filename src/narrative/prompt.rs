//! Prompt assembly for the narrative generator.

use crate::analytics::summary::{InsightSummary, RECENT_PERIODS, fmt_pct};
use crate::domain::AlignedTable;

/// Trailing aligned-table rows quoted in the prompt.
pub const RECENT_ROWS: usize = 6;

/// Everything the generator is allowed to ground its answer on.
#[derive(Debug, Clone, Copy)]
pub struct PromptParts<'a> {
    pub question: &'a str,
    pub knowledge: &'a str,
    pub data_context: &'a str,
    pub summary: Option<&'a InsightSummary>,
    pub table: Option<&'a AlignedTable>,
}

pub fn build_prompt(parts: PromptParts<'_>) -> String {
    let analytics = parts
        .summary
        .map(analytics_block)
        .unwrap_or_else(|| "Analytics unavailable.".to_string());
    let rows = parts.table.map(recent_rows_block).unwrap_or_default();

    format!(
        "You are an expert economic analyst advising business leaders on strategy and pricing.\n\
         Expert Knowledge (series metadata and curated notes):\n{knowledge}\n\n\
         Data Context: {context}\n\n\
         Analytics Summary:\n{analytics}\n\
         {rows}\n\
         Question: {question}\n\n\
         Respond professionally in bullets, with clear business implications. \
         Ground every number in the data above.",
        knowledge = parts.knowledge,
        context = parts.data_context,
        question = parts.question.trim(),
    )
}

fn analytics_block(summary: &InsightSummary) -> String {
    format!(
        "- Latest YoY Change: {}\n- Recent Trend: {}\n- Anomalies last {RECENT_PERIODS} periods: {}\n",
        fmt_pct(summary.yoy_pct),
        summary.trend,
        summary.recent_anomalies
    )
}

fn recent_rows_block(table: &AlignedTable) -> String {
    if table.is_empty() {
        return String::new();
    }
    let mut out = format!("Recent data (date, {}):\n", table.columns.join(", "));
    let start = table.len().saturating_sub(RECENT_ROWS);
    for row in &table.rows[start..] {
        let cells: Vec<String> = row
            .values
            .iter()
            .map(|v| v.map(|x| format!("{x:.3}")).unwrap_or_else(|| "NA".to_string()))
            .collect();
        out.push_str(&format!("- {}: {}\n", row.date, cells.join(", ")));
    }
    out
}
