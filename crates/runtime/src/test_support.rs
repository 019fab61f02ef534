use crate::{Viewer, ViewerOptions};
use rstest::fixture;
use std::sync::Arc;
use xmlview_platform_mock::{MockDetailView, MockDocumentSource, MockErrorView, MockTreeWidget};

pub const SIMPLE: &str = "<root><a>hello</a><b/></root>";

/// A viewer wired to recording mocks, with handles to every collaborator.
pub struct MockViewer {
    pub viewer: Arc<Viewer>,
    pub widget: Arc<MockTreeWidget>,
    pub detail: Arc<MockDetailView>,
    pub errors: Arc<MockErrorView>,
    pub source: Arc<MockDocumentSource>,
}

impl MockViewer {
    pub fn build(widget: MockTreeWidget, source: MockDocumentSource, options: ViewerOptions) -> Self {
        let widget = Arc::new(widget);
        let detail = Arc::new(MockDetailView::new());
        let errors = Arc::new(MockErrorView::new());
        let source = Arc::new(source);
        let viewer = Viewer::new(widget.clone(), detail.clone(), errors.clone())
            .with_source(source.clone())
            .with_options(options);
        Self { viewer: Arc::new(viewer), widget, detail, errors, source }
    }

    pub fn row(&self, label: &str) -> xmlview_core::RowId {
        self.widget.find(label).unwrap_or_else(|| panic!("no row labelled {label}"))
    }
}

/// rstest fixture: viewer with default options and `simple.xml` / `broken.xml`
/// available from the mock source.
#[fixture]
pub fn mock_viewer() -> MockViewer {
    let source = MockDocumentSource::new()
        .with_file("simple.xml", SIMPLE)
        .with_file("broken.xml", "<root><a></root>");
    MockViewer::build(MockTreeWidget::new(), source, ViewerOptions::default())
}
