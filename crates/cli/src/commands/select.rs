use crate::OutputFormat;
use crate::console::ConsoleSession;
use crate::util::{CliResult, ViewArgs};
use clap::Args;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;
use xmlview_core::RowId;
use xmlview_runtime::IndexError;

#[derive(Args, Debug, Clone)]
pub struct SelectArgs {
    #[arg(value_name = "FILE", help = "XML document to load.")]
    pub file: PathBuf,

    #[arg(value_name = "ROW", required = true, num_args = 1.., help = "Row ids to select, as printed by `tree`.")]
    pub rows: Vec<u64>,

    #[command(flatten)]
    pub view: ViewArgs,

    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Selection {
    Detail { row: u64, name: String, text: String },
    Unbound { row: u64, message: String },
}

pub fn run(args: &SelectArgs) -> CliResult<String> {
    let session = ConsoleSession::open(&args.file, args.view.options())?;
    let selections: Vec<Selection> = args
        .rows
        .iter()
        .map(|&row| {
            session.viewer.on_select(RowId::new(row));
            match session.details.take().pop() {
                // comment and declaration rows have no tag name, use the row label
                Some(detail) if detail.name.is_empty() => {
                    let name = session.tree.label(row).unwrap_or_default();
                    Selection::Detail { row, name, text: detail.text }
                }
                Some(detail) => Selection::Detail { row, name: detail.name, text: detail.text },
                None => Selection::Unbound { row, message: IndexError::UnknownRow(RowId::new(row)).to_string() },
            }
        })
        .collect();

    let output = match args.format {
        OutputFormat::Text => render_select_text(&selections),
        OutputFormat::Json => render_select_json(&selections)?,
    };
    Ok(output)
}

fn render_select_text(selections: &[Selection]) -> String {
    let mut output = String::new();
    for selection in selections {
        match selection {
            Selection::Detail { row, name, text } => {
                let name = name.if_supports_color(Stream::Stdout, |t| t.bold().fg_rgb::<79, 166, 255>().to_string());
                let value = format!("\"{text}\"");
                let value = value.if_supports_color(Stream::Stdout, |t| t.fg_rgb::<136, 192, 74>().to_string());
                let _ = writeln!(output, "#{row} {name} = {value}");
            }
            Selection::Unbound { row, message } => {
                let message = message.if_supports_color(Stream::Stdout, |t| t.dimmed().to_string());
                let _ = writeln!(output, "#{row} {message}");
            }
        }
    }
    output.trim_end().to_owned()
}

fn render_select_json(selections: &[Selection]) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(selections)?)
}
