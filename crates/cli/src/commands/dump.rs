use crate::OutputFormat;
use crate::util::CliResult;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use xmlview_core::{Document, DocumentSource, FileSystemSource, Node};

#[derive(Args, Debug, Clone)]
pub struct DumpArgs {
    #[arg(value_name = "FILE", help = "XML document to parse.")]
    pub file: PathBuf,

    #[arg(long = "indent", value_name = "N", default_value_t = 2, help = "Indentation width for text output (0 = compact).")]
    pub indent: usize,

    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Serialize, Debug, PartialEq)]
struct NodeSummary {
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attributes: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeSummary>,
}

impl NodeSummary {
    fn from_node(node: &Node) -> Self {
        Self {
            name: node.name().to_owned(),
            text: node.text().to_owned(),
            attributes: node
                .attributes()
                .iter()
                .map(|attribute| (attribute.name().to_owned(), attribute.value().to_owned()))
                .collect(),
            children: node.children().iter().map(|child| Self::from_node(child)).collect(),
        }
    }
}

pub fn run(args: &DumpArgs) -> CliResult<String> {
    let bytes = FileSystemSource
        .read(&args.file)
        .map_err(|err| anyhow::anyhow!("failed to read {}: {err}", args.file.display()))?;
    let document = Document::from_bytes(&bytes)?;
    tracing::debug!(nodes = document.node_count(), "dumping document");

    let output = match args.format {
        OutputFormat::Text if args.indent == 0 => document.to_xml(),
        OutputFormat::Text => document.to_xml_pretty(args.indent),
        OutputFormat::Json => serde_json::to_string_pretty(&NodeSummary::from_node(document.root()))?,
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[rstest]
    #[case(0, "<r k=\"v\"><a>x &amp; y</a><!-- kept --><b/></r>")]
    #[case(2, "<r k=\"v\">\n  <a>x &amp; y</a>\n  <!-- kept -->\n  <b/>\n</r>")]
    fn text_output_reserializes(#[case] indent: usize, #[case] expected: &str) {
        let file = file_with("<?xml version=\"1.0\"?>\n<!-- prolog -->\n<r k='v'>\n  <a>x &amp; y</a>\n  <!-- kept -->\n  <b></b>\n</r>");
        let args = DumpArgs { file: file.path().to_path_buf(), indent, format: OutputFormat::Text };
        assert_eq!(run(&args).expect("run"), expected);
    }

    #[rstest]
    fn json_output_nests_children() {
        let file = file_with("<r><a id=\"1\">t</a></r>");
        let args = DumpArgs { file: file.path().to_path_buf(), indent: 2, format: OutputFormat::Json };
        let value: serde_json::Value = serde_json::from_str(&run(&args).expect("run")).expect("json");
        assert_eq!(value["name"], "r");
        assert_eq!(value["children"][0]["text"], "t");
        assert_eq!(value["children"][0]["attributes"][0], serde_json::json!(["id", "1"]));
    }

    #[rstest]
    fn parse_errors_carry_position() {
        let file = file_with("<r>\n<a></b></r>");
        let args = DumpArgs { file: file.path().to_path_buf(), indent: 2, format: OutputFormat::Text };
        let err = run(&args).expect_err("mismatch");
        assert!(err.to_string().contains("line 2"), "{err}");
    }
}
