use comfy_table::{ContentArrangement, Table, presets};

use super::OrderRow;
use crate::config::OutputFormat;
use crate::order::Folded;

const NONE_DISPLAY: &str = "—";
const ELLIPSIS: &str = "…";
const DEFAULT_MAX_CELL_WIDTH: usize = 160;
const DEFAULT_MAX_OUTPUT_CHARS: usize = 200_000;

#[derive(Debug, Clone)]
pub struct TableOptions {
    pub max_cell_width: usize,
    pub max_output_chars: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            max_cell_width: DEFAULT_MAX_CELL_WIDTH,
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
        }
    }
}

fn new_table(format: OutputFormat) -> Table {
    let mut table = Table::new();
    match format {
        OutputFormat::Markdown => {
            table.load_preset(presets::ASCII_MARKDOWN);
        }
        _ => {
            table.load_preset(presets::UTF8_FULL);
        }
    }
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn render_order_table(
    rows: &[OrderRow],
    folded: &[Folded],
    format: OutputFormat,
    options: &TableOptions,
) -> String {
    let mut table = new_table(format);
    table.set_header(vec!["#", "Kind", "Phase", "Urn"]);
    for row in rows {
        table.add_row(vec![
            row.position.to_string(),
            row.kind.clone(),
            row.phase.clone().unwrap_or_else(|| NONE_DISPLAY.to_string()),
            truncate_string(&row.urn, options.max_cell_width),
        ]);
    }

    let mut output = table.to_string();
    output.push('\n');
    output.push_str(&format!("{} positions", rows.len()));

    if !folded.is_empty() {
        let mut table = new_table(format);
        table.set_header(vec!["Folded", "Reason", "Into"]);
        for item in folded {
            table.add_row(vec![
                truncate_string(&item.member.to_string(), options.max_cell_width),
                item.reason.as_str().to_string(),
                truncate_string(&item.owner.to_string(), options.max_cell_width),
            ]);
        }
        output.push_str("\n\n");
        output.push_str(&table.to_string());
    }

    truncate_output(output, options.max_output_chars)
}

pub fn render_key_value_table(
    title: &str,
    rows: &[(String, String)],
    format: OutputFormat,
    options: &TableOptions,
) -> String {
    let mut table = new_table(format);
    table.set_header(vec![title.to_string(), "Value".to_string()]);

    for (key, value) in rows {
        let key = truncate_string(key, options.max_cell_width);
        let value = truncate_string(value, options.max_cell_width);
        table.add_row(vec![key, value]);
    }

    truncate_output(table.to_string(), options.max_output_chars)
}

fn truncate_string(input: &str, max_len: usize) -> String {
    let len = input.chars().count();
    if len <= max_len {
        return input.to_string();
    }
    if max_len <= 1 {
        return ELLIPSIS.to_string();
    }
    let truncated: String = input.chars().take(max_len - 1).collect();
    format!("{}{}", truncated, ELLIPSIS)
}

fn truncate_output(output: String, max_len: usize) -> String {
    if output.len() <= max_len {
        return output;
    }
    let mut truncated = output.chars().take(max_len).collect::<String>();
    truncated.push_str("\n[output truncated]");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Urn;
    use crate::order::FoldReason;

    fn row(position: usize, phase: Option<&str>) -> OrderRow {
        OrderRow {
            position,
            kind: "Table".to_string(),
            phase: phase.map(String::from),
            urn: "Server[@Name='srv']/Database[@Name='db']/Table[@Name='t']".to_string(),
        }
    }

    #[test]
    fn truncates_cells() {
        assert_eq!(truncate_string("abcdefghijklmnopqrstuvwxyz", 8), "abcdefg…");
    }

    #[test]
    fn renders_rows_and_missing_phase() {
        let rows = [row(1, None), row(2, Some("Data"))];
        let out = render_order_table(&rows, &[], OutputFormat::Pretty, &TableOptions::default());
        assert!(out.contains("—"));
        assert!(out.contains("Data"));
        assert!(out.contains("2 positions"));
        assert!(!out.contains("Folded"));
    }

    #[test]
    fn lists_folded_members() {
        let table = Urn::root("Server", "srv").child("Database", "db").child("Table", "t");
        let folded = [Folded {
            owner: table.clone(),
            member: table.child("Index", "pk_t"),
            reason: FoldReason::KeyIndex,
        }];
        let out = render_order_table(
            &[row(1, None)],
            &folded,
            OutputFormat::Markdown,
            &TableOptions::default(),
        );
        assert!(out.contains("keyIndex"));
        assert!(out.contains("pk_t"));
    }

    #[test]
    fn truncates_output_when_too_long() {
        let rows: Vec<OrderRow> = (1..=50).map(|idx| row(idx, None)).collect();
        let options = TableOptions {
            max_output_chars: 50,
            ..TableOptions::default()
        };
        let out = render_order_table(&rows, &[], OutputFormat::Pretty, &options);
        assert!(out.contains("[output truncated]"));
    }
}
