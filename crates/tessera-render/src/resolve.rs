//! Style resolution.
//!
//! A unit declares the styles it knows how to render. When a caller asks for a
//! style the unit does not support, the unit renders in the most detailed style
//! it does support that is still no more detailed than the request:
//!
//! ```text
//! scale:      TEXT < LINK < BUTTON < CELL < PAGE
//! supported:  {TEXT, PAGE}
//! requested:  CELL  ->  TEXT
//! requested:  PAGE  ->  PAGE
//! ```

use crate::error::RenderError;
use crate::levels::{Scale, Style};

/// Picks the greatest supported style at or below `requested`.
///
/// Fails with [`RenderError::StyleUnavailable`] when every supported style is
/// above the request, or when `supported` is empty.
pub fn resolve(
    scale: &Scale<Style>,
    requested: Style,
    supported: &[Style],
) -> Result<Style, RenderError> {
    supported
        .iter()
        .copied()
        .filter(|style| *style <= requested)
        .max()
        .ok_or_else(|| RenderError::StyleUnavailable {
            requested: scale.name(requested).to_string(),
            supported: supported
                .iter()
                .map(|style| scale.name(*style).to_string())
                .collect(),
        })
}

/// Resolves against a unit's declared style names.
///
/// `None` means the unit supports every style, so the request is returned as is.
pub fn resolve_declared(
    scale: &Scale<Style>,
    requested: Style,
    declared: Option<&[&str]>,
) -> Result<Style, RenderError> {
    match declared {
        None => Ok(requested),
        Some(names) => {
            let supported = scale.require_all(names.iter().copied())?;
            resolve(scale, requested, &supported)
        }
    }
}
