use std::io::{self, Write};

use anyhow::Result;
use tracing::debug;

use crate::cli::{CliArgs, OrderArgs};
use crate::commands::common;
use crate::config::OutputFormat;
use crate::db::SqlServerCatalog;
use crate::manifest::Manifest;
use crate::model::{ScriptBehavior, ScriptingOptions, Urn};
use crate::order::Orderer;
use crate::output::{self, TableOptions, csv, json, table};

pub fn run(args: &CliArgs, cmd: &OrderArgs) -> Result<()> {
    let resolved = common::load_config(args)?;
    let options = scripting_options(&resolved.settings.scripting, cmd)?;
    let manifest = Manifest::load(&cmd.manifest)?;
    let urns = if cmd.urns.is_empty() {
        manifest.urns()
    } else {
        cmd.urns
            .iter()
            .map(|raw| Urn::parse(raw))
            .collect::<Result<Vec<_>>>()?
    };
    debug!(
        manifest = %cmd.manifest.display(),
        objects = manifest.len(),
        requested = urns.len(),
        "loaded manifest"
    );

    let mut catalog = SqlServerCatalog::new(resolved.connection.clone())?;
    let order = Orderer::new(&mut catalog, &manifest, &manifest, options).order(&urns)?;
    let rows = output::order_rows(&order);

    if let Some(path) = &cmd.csv {
        csv::write_order(path, &rows)?;
    }
    if args.quiet {
        return Ok(());
    }

    let format = common::output_format(args, &resolved);
    let body = match format {
        OutputFormat::Json => {
            let payload = json::order_to_json(&rows, &order.folded);
            json::emit_json_value(&payload, common::json_pretty(&resolved))?
        }
        _ => table::render_order_table(&rows, &order.folded, format, &TableOptions::default()),
    };
    writeln!(io::stdout(), "{}", body)?;
    Ok(())
}

/// Config defaults with the command's flags applied on top.
fn scripting_options(defaults: &ScriptingOptions, cmd: &OrderArgs) -> Result<ScriptingOptions> {
    let mut options = defaults.clone();
    if cmd.data {
        options.include_data = true;
    }
    if cmd.data_only {
        options.include_ddl = false;
        options.include_data = true;
    }
    options.include_associations |= cmd.associations;
    options.include_owner |= cmd.owner;
    options.include_permissions |= cmd.permissions;
    options.design_mode |= cmd.design_mode;
    options.include_filestream |= cmd.filestream;
    if let Some(behavior) = &cmd.behavior {
        options.behavior = behavior.parse::<ScriptBehavior>()?;
    }
    Ok(options)
}
