//! TrueType font lookup for labels, legend text and the report panel

use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use tracing::{debug, warn};

/// Fonts tried when no font is configured
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Load the configured font, falling back to well-known system fonts.
///
/// Returns `None` when nothing usable is found; drawing then skips text.
pub fn load_font(configured: Option<&Path>) -> Option<FontVec> {
    if let Some(path) = configured {
        match read_font(path) {
            Some(font) => return Some(font),
            None => warn!("Configured font {:?} could not be loaded, trying system fonts", path),
        }
    }

    let found = SYSTEM_FONTS
        .iter()
        .map(PathBuf::from)
        .filter(|path| path.is_file())
        .find_map(|path| read_font(&path));
    if found.is_none() {
        warn!("No TrueType font found; annotations will be drawn without text");
    }
    found
}

fn read_font(path: &Path) -> Option<FontVec> {
    let bytes = std::fs::read(path).ok()?;
    match FontVec::try_from_vec(bytes) {
        Ok(font) => {
            debug!("Loaded font {:?}", path);
            Some(font)
        }
        Err(e) => {
            debug!("Invalid font {:?}: {}", path, e);
            None
        }
    }
}
