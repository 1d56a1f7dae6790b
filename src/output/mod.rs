pub mod csv;
pub mod json;
pub mod table;

use std::io::IsTerminal;

use serde::Serialize;

use crate::cli::OutputFlags;
use crate::config::{OutputFormat, SettingsResolved};
use crate::model::Urn;
use crate::order::ScriptOrder;

pub use table::TableOptions;

pub fn select_format(flags: &OutputFlags, settings: &SettingsResolved) -> OutputFormat {
    if flags.json {
        return OutputFormat::Json;
    }
    if flags.markdown {
        return OutputFormat::Markdown;
    }
    if flags.pretty {
        return OutputFormat::Pretty;
    }

    let is_tty = std::io::stdout().is_terminal();
    if is_tty {
        settings.output.default_format
    } else {
        OutputFormat::Markdown
    }
}

/// One script position as rendered by every output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRow {
    pub position: usize,
    pub kind: String,
    pub phase: Option<String>,
    pub urn: String,
}

impl OrderRow {
    fn from_urn(position: usize, urn: &Urn) -> Self {
        Self {
            position,
            kind: urn.base().type_name().to_string(),
            phase: urn.phase().map(|phase| phase.as_str().to_string()),
            urn: urn.to_string(),
        }
    }
}

/// Rows numbered from 1 in script order.
pub fn order_rows(order: &ScriptOrder) -> Vec<OrderRow> {
    order
        .urns
        .iter()
        .enumerate()
        .map(|(idx, urn)| OrderRow::from_urn(idx + 1, urn))
        .collect()
}
