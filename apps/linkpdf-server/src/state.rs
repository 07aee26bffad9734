//! Application state shared by the HTTP handlers and the bot

use std::sync::Arc;

use linkpdf_core::Generator;

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<Generator>,
    /// File name offered for downloaded documents
    pub output_filename: String,
}

impl AppState {
    pub fn new(generator: Arc<Generator>, output_filename: impl Into<String>) -> Self {
        Self {
            generator,
            output_filename: output_filename.into(),
        }
    }
}
