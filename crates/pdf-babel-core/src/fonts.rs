//! Script-aware font resolution for output rendering.
//!
//! Latin-script targets render fine with a built-in PDF base font. For a
//! fixed allow-list of non-Latin language codes, a usable TrueType font is
//! searched for along a configurable ordered path list and embedded in the
//! output; if nothing is found the built-in font is used anyway and a
//! warning flag is set, since the target script will likely render as
//! missing glyphs. The default path list is Bengali-oriented; serving other
//! scripts well means configuring additional paths.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::Lang;
use crate::pdf::font::{EmbeddedFont, PageFont};

/// Language codes whose script a built-in Latin base font cannot render.
pub const NON_LATIN_LANGS: &[&str] = &[
    "ar", "zh", "zh-CN", "zh-TW", "ja", "ko", "bn", "hi", "ru", "th", "el",
];

/// Whether a language's script is representable by the built-in font.
pub fn is_latin_script(lang: &Lang) -> bool {
    !NON_LATIN_LANGS.contains(&lang.as_str())
}

/// The outcome of font resolution.
pub struct ResolvedFont {
    pub font: PageFont,
    /// Set when a non-Latin target had to fall back to the built-in font;
    /// output characters may render incorrectly.
    pub fallback_warning: bool,
}

/// Pick a font for the given target language.
///
/// Latin-script targets return the built-in font immediately, without
/// touching the filesystem. Non-Latin targets take the first existing path
/// in `search_paths` that parses as a font.
pub fn resolve_font(target: &Lang, search_paths: &[PathBuf]) -> ResolvedFont {
    if is_latin_script(target) {
        return ResolvedFont {
            font: PageFont::fallback(),
            fallback_warning: false,
        };
    }

    for path in search_paths {
        if !path.exists() {
            continue;
        }

        match EmbeddedFont::from_file(path) {
            Ok(font) => {
                info!("Using font {} for target '{}'", path.display(), target);
                return ResolvedFont {
                    font: PageFont::Embedded(font),
                    fallback_warning: false,
                };
            }
            Err(e) => {
                warn!("Found font candidate {} but failed to load it: {e}", path.display());
                return ResolvedFont {
                    font: PageFont::fallback(),
                    fallback_warning: true,
                };
            }
        }
    }

    warn!(
        "No font found for non-Latin target '{}'; characters may render incorrectly",
        target
    );
    ResolvedFont {
        font: PageFont::fallback(),
        fallback_warning: true,
    }
}
