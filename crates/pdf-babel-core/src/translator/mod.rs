mod google;
mod traits;

pub use google::GoogleWebTranslator;
pub use traits::{Translator, TranslatorInfo};

use crate::config::TranslatorConfig;
use crate::error::Result;
use std::sync::Arc;

/// Create a translator from configuration
pub fn create_translator(config: &TranslatorConfig) -> Result<Arc<dyn Translator>> {
    let translator =
        GoogleWebTranslator::new(config.endpoint.clone(), config.request_timeout_secs);

    Ok(Arc::new(translator))
}
