use crate::constants::LEGACY_QUALITY_THRESHOLD;

/// Map a legacy quality value onto the current -5..+5 scale.
///
/// `scaled = raw / 2 * 270 + 2150`; when `scaled >= 800` the result is
/// `(scaled - 800) / 2700 * 10 - 5`, otherwise `raw` is returned unchanged.
/// Only called while upgrading a legacy-shaped ratings file, never on
/// current-format records.
pub fn rescale_legacy_quality(raw: f64) -> f64 {
    let scaled = raw / 2.0 * 270.0 + 2150.0;
    if scaled >= LEGACY_QUALITY_THRESHOLD {
        (scaled - 800.0) / 2700.0 * 10.0 - 5.0
    } else {
        // NOTE: mixes units with the branch above; kept for compatibility
        raw
    }
}

/// Whether a quality value read from a legacy file is still on the old scale.
pub fn is_legacy_quality(value: f64) -> bool {
    value >= LEGACY_QUALITY_THRESHOLD
}
