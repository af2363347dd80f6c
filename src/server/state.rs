use std::sync::Arc;

use crate::fonts::FontRegistry;
use crate::providers::TranslationProvider;
use crate::settings::Settings;
use crate::translator::Translator;

/// Shared by every request. The font registry is read-only after startup.
pub struct ServerState<P: TranslationProvider> {
    pub settings: Settings,
    pub fonts: Arc<FontRegistry>,
    pub translator: Translator<P>,
}

impl<P: TranslationProvider> ServerState<P> {
    pub fn new(settings: Settings, fonts: Arc<FontRegistry>, translator: Translator<P>) -> Self {
        Self {
            settings,
            fonts,
            translator,
        }
    }
}
