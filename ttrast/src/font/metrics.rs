//! Horizontal metrics from the `hmtx` table.

use ttrast_types::GlyphId;

use super::Font;

/// Advance width and left side bearing of a glyph.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct HMetric {
    pub advance_width: i32,
    pub left_side_bearing: i32,
}

impl Font<'_> {
    /// Returns the metrics of a glyph in font units.
    ///
    /// Glyphs past the last long metric share its advance width and read
    /// their side bearing from the trailing array. Glyphs past the end of
    /// the font have zero metrics.
    pub fn unscaled_h_metric(&self, glyph_id: GlyphId) -> HMetric {
        let ix = glyph_id.to_usize();
        let num_h_metrics = self.num_h_metrics;
        if ix >= self.num_glyphs() || num_h_metrics == 0 {
            return HMetric::default();
        }
        let hmtx = self.tables.hmtx;
        // hmtx size is validated at parse time
        let (advance_offset, lsb_offset) = if ix >= num_h_metrics {
            (
                4 * (num_h_metrics - 1),
                4 * num_h_metrics + 2 * (ix - num_h_metrics),
            )
        } else {
            (4 * ix, 4 * ix + 2)
        };
        HMetric {
            advance_width: hmtx.read_at::<u16>(advance_offset).unwrap_or_default() as i32,
            left_side_bearing: hmtx.read_at::<i16>(lsb_offset).unwrap_or_default() as i32,
        }
    }
}
