/// Namespace emitted on the output root unless overridden.
pub const PRESENTATION_NAMESPACE: &str = "http://schemas.microsoft.com/winfx/2006/xaml/presentation";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Whole document under `document_root_tag`.
    #[default]
    Document,
    /// Only the content around the `StartFragment`/`EndFragment` markers,
    /// wrapped in a `Span`.
    InlineFragment,
}

#[derive(Clone, Debug)]
pub struct ConverterConfig {
    /// Character budget for pagination splits and for top-level batches.
    pub block_max_size: usize,
    pub output: OutputMode,
    /// Root tag used in `OutputMode::Document`.
    pub document_root_tag: String,
    pub namespace: Option<String>,
    /// `html`/`body`/`div` elements whose `class` equals this are dropped
    /// together with their content.
    pub excluded_div_class: Option<String>,
    /// Replace a table holding exactly one cell by the cell's content.
    pub unwrap_single_cell_tables: bool,
    /// Translate `br`/`hr` into `LineBreak`s instead of dropping them.
    pub emit_line_breaks: bool,
    /// Application tags converted like `p`. Matched lower-cased.
    pub custom_paragraph_tags: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            block_max_size: 8192,
            output: OutputMode::Document,
            document_root_tag: "FlowDocument".to_string(),
            namespace: Some(PRESENTATION_NAMESPACE.to_string()),
            excluded_div_class: Some("include-text".to_string()),
            unwrap_single_cell_tables: true,
            emit_line_breaks: false,
            custom_paragraph_tags: vec!["nsrtitle".to_string()],
        }
    }
}

impl ConverterConfig {
    pub fn inline_fragment() -> Self {
        Self {
            output: OutputMode::InlineFragment,
            ..Self::default()
        }
    }

    pub fn with_block_max_size(mut self, block_max_size: usize) -> Self {
        self.block_max_size = block_max_size;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn with_excluded_div_class(mut self, class: Option<&str>) -> Self {
        self.excluded_div_class = class.map(str::to_string);
        self
    }

    pub fn with_single_cell_unwrap(mut self, enabled: bool) -> Self {
        self.unwrap_single_cell_tables = enabled;
        self
    }

    pub fn with_line_breaks(mut self, enabled: bool) -> Self {
        self.emit_line_breaks = enabled;
        self
    }

    pub fn with_namespace(mut self, namespace: Option<&str>) -> Self {
        self.namespace = namespace.map(str::to_string);
        self
    }

    pub(crate) fn root_tag(&self) -> &str {
        match self.output {
            OutputMode::Document => &self.document_root_tag,
            OutputMode::InlineFragment => "Section",
        }
    }

    pub(crate) fn is_custom_paragraph_tag(&self, name: &str) -> bool {
        self.custom_paragraph_tags
            .iter()
            .any(|tag| tag.eq_ignore_ascii_case(name))
    }

    pub(crate) fn is_excluded_class(&self, class: Option<&str>) -> bool {
        match (&self.excluded_div_class, class) {
            (Some(excluded), Some(class)) => excluded == class,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_tag_follows_output_mode() {
        let config = ConverterConfig::default();
        assert_eq!(config.root_tag(), "FlowDocument");
        let config = config.with_output(OutputMode::InlineFragment);
        assert_eq!(config.root_tag(), "Section");
    }

    #[test]
    fn excluded_class_is_exact_and_optional() {
        let config = ConverterConfig::default();
        assert!(config.is_excluded_class(Some("include-text")));
        assert!(!config.is_excluded_class(Some("include-text extra")));
        assert!(!config.is_excluded_class(None));

        let config = config.with_excluded_div_class(None);
        assert!(!config.is_excluded_class(Some("include-text")));
    }

    #[test]
    fn custom_paragraph_tags_match_case_insensitively() {
        let config = ConverterConfig::default();
        assert!(config.is_custom_paragraph_tag("NSRTITLE"));
        assert!(!config.is_custom_paragraph_tag("title"));
    }
}
