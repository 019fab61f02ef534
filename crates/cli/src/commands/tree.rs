use crate::OutputFormat;
use crate::console::{ConsoleRow, ConsoleSession};
use crate::util::{CliResult, ViewArgs};
use clap::Args;
use owo_colors::{OwoColorize, Stream};
use std::collections::HashMap;
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    #[arg(value_name = "FILE", help = "XML document to load.")]
    pub file: PathBuf,

    #[command(flatten)]
    pub view: ViewArgs,

    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn run(args: &TreeArgs) -> CliResult<String> {
    let session = ConsoleSession::open(&args.file, args.view.options())?;
    let rows = session.tree.rows();
    tracing::debug!(rows = rows.len(), "rendering tree");
    let output = match args.format {
        OutputFormat::Text => render_tree_text(&rows),
        OutputFormat::Json => render_tree_json(&rows)?,
    };
    Ok(output)
}

struct Line<'a> {
    row: &'a ConsoleRow,
    prefix: String,
    is_last: bool,
    top_level: bool,
}

fn render_tree_text(rows: &[ConsoleRow]) -> String {
    let mut children: HashMap<Option<u64>, Vec<&ConsoleRow>> = HashMap::new();
    for row in rows {
        children.entry(row.parent).or_default().push(row);
    }

    let mut output = String::new();
    let mut stack: Vec<Line<'_>> = Vec::new();
    push_children(&mut stack, &children, None, String::new(), true);
    while let Some(line) = stack.pop() {
        let connector = if line.top_level {
            ""
        } else if line.is_last {
            "└ "
        } else {
            "├ "
        };
        let label = line.row.label.if_supports_color(Stream::Stdout, |t| t.bold().fg_rgb::<79, 166, 255>().to_string());
        let id = format!("#{}", line.row.id);
        let id = id.if_supports_color(Stream::Stdout, |t| t.dimmed().to_string());
        let _ = writeln!(output, "{}{connector}{label} {id}", line.prefix);

        let child_prefix = if line.top_level {
            String::new()
        } else if line.is_last {
            format!("{}  ", line.prefix)
        } else {
            format!("{}│ ", line.prefix)
        };
        push_children(&mut stack, &children, Some(line.row.id), child_prefix, false);
    }
    output.trim_end().to_owned()
}

/// Queues the children of `parent` so that the first one is written next.
fn push_children<'a>(
    stack: &mut Vec<Line<'a>>,
    children: &HashMap<Option<u64>, Vec<&'a ConsoleRow>>,
    parent: Option<u64>,
    prefix: String,
    top_level: bool,
) {
    let Some(rows) = children.get(&parent) else { return };
    let last_idx = rows.len().saturating_sub(1);
    stack.extend(rows.iter().enumerate().rev().map(|(i, row)| Line {
        row,
        prefix: prefix.clone(),
        is_last: i == last_idx,
        top_level,
    }));
}

fn render_tree_json(rows: &[ConsoleRow]) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}
