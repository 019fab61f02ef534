use clap::Args;
use std::error::Error;
use xmlview_runtime::ViewerOptions;

pub type CliResult<T> = Result<T, Box<dyn Error>>;

/// Presentation flags shared by every command that renders rows.
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    #[arg(long = "hide-root", help = "Do not render a row for the root element; its children become top-level rows.")]
    pub hide_root: bool,

    #[arg(
        long = "label-attr",
        value_name = "NAME",
        help = "Append the value of this attribute to row labels, e.g. item \"42\"."
    )]
    pub label_attr: Option<String>,

    #[arg(long = "show-comments", help = "Render comments inside elements as [comment] rows.")]
    pub show_comments: bool,

    #[arg(long = "show-declarations", help = "Render processing instructions inside elements as [declaration] rows.")]
    pub show_declarations: bool,
}

impl ViewArgs {
    pub fn options(&self) -> ViewerOptions {
        let options = ViewerOptions::new()
            .with_show_root(!self.hide_root)
            .with_show_comments(self.show_comments)
            .with_show_declarations(self.show_declarations);
        match &self.label_attr {
            Some(name) => options.with_label_attribute(name.clone()),
            None => options,
        }
    }
}
