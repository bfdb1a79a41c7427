use serde::{Deserialize, Serialize};

/// Options for an [`Annotator`](crate::Annotator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Global switch for the selection subsystem. When off, every selection is ignored.
    pub enabled: bool,
    /// Selector of the element whose content can be commented
    pub content_selector: String,
    /// Regions inside the content that never accept selections (the comment UI itself)
    pub excluded_region_selectors: Vec<String>,
    /// Selections whose serialization is longer than this are refused
    pub max_selection_length: usize,
    /// Dynamic blocks without a `data-hash` are keyed by this many characters of their HTML
    pub dynamic_block_html_limit: usize,
    /// Images with a known width or height below this are not wrapped for selection
    pub min_image_dimension: u32,
    /// Ask the screenshot provider for a picture of every accepted selection
    pub capture_screenshot: bool,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            content_selector: "#mw-content-text".to_string(),
            excluded_region_selectors: vec![
                ".smartcomment-dialog".to_string(),
                ".smartcomment-timeline".to_string(),
            ],
            max_selection_length: 50_000,
            dynamic_block_html_limit: 500,
            min_image_dimension: 0,
            capture_screenshot: false,
        }
    }
}
