//! Managing outlines.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#managing-outlines>
//! and <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#moving-points>

use ttrast_types::Point;

use super::{
    super::{graphics::CoordAxis, math, zone::ZonePointer},
    Engine, OpResult,
};
use crate::{font::scale_value, glyph::PointMarker};

impl Engine<'_> {
    /// Flip point.
    ///
    /// FLIPPT[] (0x80)
    ///
    /// Pops: p: point number (uint32)
    ///
    /// Toggles the on curve state of `loop` points in the glyph zone.
    pub(super) fn op_flippt(&mut self) -> OpResult {
        for _ in 0..self.take_loop_counter() {
            let point_ix = self.value_stack.pop_usize()?;
            self.zone_mut(ZonePointer::Glyph).flip_on_curve(point_ix)?;
        }
        Ok(())
    }

    /// Flip range on.
    ///
    /// FLIPRGON[] (0x81)
    ///
    /// Pops: highpoint, lowpoint
    pub(super) fn op_fliprgon(&mut self) -> OpResult {
        self.set_on_curve_range(true)
    }

    /// Flip range off.
    ///
    /// FLIPRGOFF[] (0x82)
    ///
    /// Pops: highpoint, lowpoint
    pub(super) fn op_fliprgoff(&mut self) -> OpResult {
        self.set_on_curve_range(false)
    }

    fn set_on_curve_range(&mut self, on: bool) -> OpResult {
        let high = self.value_stack.pop_usize()?;
        let low = self.value_stack.pop_usize()?;
        self.zone_mut(ZonePointer::Glyph)
            .set_on_curve(low, high, on)
    }

    /// Shift point by the last point.
    ///
    /// SHP\[a\] (0x32 - 0x33)
    ///
    /// Pops: p: point to be shifted
    ///
    /// Moves `loop` points in zp2 by the distance the reference point
    /// (rp2 in zp1 when `a` is 0, rp1 in zp0 when `a` is 1) has been
    /// shifted from its original position.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#shift-point-by-the-last-point>
    pub(super) fn op_shp(&mut self, opcode: u8) -> OpResult {
        let d = self.point_displacement(opcode)?;
        for _ in 0..self.take_loop_counter() {
            let point_ix = self.value_stack.pop_usize()?;
            self.move_zp2_point(point_ix, d.dx, d.dy, true)?;
        }
        Ok(())
    }

    /// Shift contour by the last point.
    ///
    /// SHC\[a\] (0x34 - 0x35)
    ///
    /// Pops: c: contour to be shifted
    pub(super) fn op_shc(&mut self, opcode: u8) -> OpResult {
        let contour_ix = self.value_stack.pop_usize()?;
        let d = self.point_displacement(opcode)?;
        let zp2 = self.graphics.zp2;
        for point_ix in self.zone(zp2).contour(contour_ix)? {
            if d.zone != zp2 || d.point_ix != point_ix {
                self.move_zp2_point(point_ix, d.dx, d.dy, true)?;
            }
        }
        Ok(())
    }

    /// Shift zone by the last point.
    ///
    /// SHZ\[a\] (0x36 - 0x37)
    ///
    /// Pops: e: zone to be shifted
    ///
    /// The zone number is validated but the points of zp2 are the ones
    /// moved. Phantom points and touch state are left alone.
    ///
    /// See <https://gitlab.freedesktop.org/freetype/freetype/-/blob/57617782464411201ce7bbc93b086c1b4d7d84a5/src/truetype/ttinterp.c#L5236>
    pub(super) fn op_shz(&mut self, opcode: u8) -> OpResult {
        ZonePointer::try_from(self.value_stack.pop()?)?;
        let d = self.point_displacement(opcode)?;
        let zp2 = self.graphics.zp2;
        let zone = self.zone(zp2);
        let limit = zone.len().saturating_sub(zone.phantom_count);
        for point_ix in 0..limit {
            if d.zone != zp2 || d.point_ix != point_ix {
                self.move_zp2_point(point_ix, d.dx, d.dy, false)?;
            }
        }
        Ok(())
    }

    /// Shift point by a pixel amount.
    ///
    /// SHPIX[] (0x38)
    ///
    /// Pops: amount: magnitude of the shift (F26Dot6)
    ///       p1, p2, ... ploop: points to be shifted
    ///
    /// Moves along the freedom vector regardless of the projection vector.
    pub(super) fn op_shpix(&mut self) -> OpResult {
        let amount = self.value_stack.pop()?;
        let fv = self.graphics.freedom_vector;
        let dx = math::mul14(amount, fv.x);
        let dy = math::mul14(amount, fv.y);
        for _ in 0..self.take_loop_counter() {
            let point_ix = self.value_stack.pop_usize()?;
            self.move_zp2_point(point_ix, dx, dy, true)?;
        }
        Ok(())
    }

    /// Move stack indirect relative point.
    ///
    /// MSIRP\[a\] (0x3A - 0x3B)
    ///
    /// Pops: d: distance (F26Dot6)
    ///       p: point number
    ///
    /// Moves point `p` in zp1 so that its distance from rp0 in zp0 is `d`.
    pub(super) fn op_msirp(&mut self, opcode: u8) -> OpResult {
        let distance = self.value_stack.pop()?;
        let point_ix = self.value_stack.pop_usize()?;
        let gs = &self.graphics;
        let (zp0, zp1, rp0) = (gs.zp0, gs.zp1, gs.rp0);
        let rp0_point = self.zone(zp0).point(rp0)?;
        if zp1.is_twilight() {
            let rp0_original = self.zone(zp0).original(rp0)?;
            let zone = self.zone_mut(zp1);
            set_coords(zone.original_mut(point_ix)?, rp0_original);
            set_coords(zone.point_mut(point_ix)?, rp0_original);
        }
        let current = self.project(self.zone(zp1).point(point_ix)?, rp0_point);
        self.move_point(zp1, point_ix, distance.wrapping_sub(current))?;
        let gs = &mut self.graphics;
        gs.rp1 = gs.rp0;
        gs.rp2 = point_ix;
        if opcode & 1 != 0 {
            gs.rp0 = point_ix;
        }
        Ok(())
    }

    /// Move direct absolute point.
    ///
    /// MDAP\[a\] (0x2E - 0x2F)
    ///
    /// Pops: p: point number
    ///
    /// Touches point `p` in zp0, first rounding its projection when `a`
    /// is set. Sets rp0 and rp1 to `p`.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#move-direct-absolute-point>
    pub(super) fn op_mdap(&mut self, opcode: u8) -> OpResult {
        let point_ix = self.value_stack.pop_usize()?;
        let zp0 = self.graphics.zp0;
        let distance = if opcode & 1 != 0 {
            let current = self.graphics.project(self.zone(zp0).point(point_ix)?);
            self.graphics.round(current).wrapping_sub(current)
        } else {
            0
        };
        self.move_point(zp0, point_ix, distance)?;
        self.graphics.rp0 = point_ix;
        self.graphics.rp1 = point_ix;
        Ok(())
    }

    /// Move indirect absolute point.
    ///
    /// MIAP\[a\] (0x3E - 0x3F)
    ///
    /// Pops: n: CVT entry number
    ///       p: point number
    ///
    /// Moves point `p` in zp0 so that its projection is the CVT value. With
    /// `a` set the value is rounded, and the measured position wins when
    /// the two differ by more than the control value cut in.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#move-indirect-absolute-point>
    pub(super) fn op_miap(&mut self, opcode: u8) -> OpResult {
        let cvt_ix = self.value_stack.pop_usize()?;
        let point_ix = self.value_stack.pop_usize()?;
        let mut distance = self.cvt_value(cvt_ix)?;
        let zp0 = self.graphics.zp0;
        if zp0.is_twilight() {
            let fv = self.graphics.freedom_vector;
            let position = Point::new(math::mul14(distance, fv.x), math::mul14(distance, fv.y));
            let zone = self.zone_mut(zp0);
            set_coords(zone.original_mut(point_ix)?, position);
            set_coords(zone.point_mut(point_ix)?, position);
        }
        let current = self.graphics.project(self.zone(zp0).point(point_ix)?);
        if opcode & 1 != 0 {
            if (distance.wrapping_sub(current)).wrapping_abs() > self.graphics.control_value_cutin {
                distance = current;
            }
            distance = self.graphics.round(distance);
        }
        self.move_point(zp0, point_ix, distance.wrapping_sub(current))?;
        self.graphics.rp0 = point_ix;
        self.graphics.rp1 = point_ix;
        Ok(())
    }

    /// Move direct relative point.
    ///
    /// MDRP\[abcde\] (0xC0 - 0xDF)
    ///
    /// Pops: p: point number
    ///
    /// Moves point `p` in zp1 to preserve its original distance from rp0
    /// in zp0. The flag bits select:
    /// - 0x10: set rp0 to `p`
    /// - 0x08: keep at least the minimum distance
    /// - 0x04: round the distance
    /// - 0x03: distance type for engine compensation (ignored)
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#move-direct-relative-point>
    pub(super) fn op_mdrp(&mut self, opcode: u8) -> OpResult {
        let point_ix = self.value_stack.pop_usize()?;
        let gs = &self.graphics;
        let (zp0, zp1, rp0) = (gs.zp0, gs.zp1, gs.rp0);
        let original_distance = if zp0.is_twilight() || zp1.is_twilight() {
            self.dual_project(
                self.zone(zp1).original(point_ix)?,
                self.zone(zp0).original(rp0)?,
            )
        } else {
            let distance = self.dual_project(
                self.zone(zp1).unscaled(point_ix)?,
                self.zone(zp0).unscaled(rp0)?,
            );
            scale_value(self.scale, distance, self.units_per_em)
        };
        let gs = &self.graphics;
        let original_distance = apply_single_width(
            original_distance,
            gs.single_width,
            gs.single_width_cutin,
        );
        let mut distance = if opcode & 4 != 0 {
            gs.round(original_distance)
        } else {
            original_distance
        };
        if opcode & 8 != 0 {
            distance = apply_min_distance(distance, original_distance, gs.min_distance);
        }
        let current = self.project(
            self.zone(zp1).point(point_ix)?,
            self.zone(zp0).point(rp0)?,
        );
        self.move_point(zp1, point_ix, distance.wrapping_sub(current))?;
        let gs = &mut self.graphics;
        gs.rp1 = gs.rp0;
        gs.rp2 = point_ix;
        if opcode & 16 != 0 {
            gs.rp0 = point_ix;
        }
        Ok(())
    }

    /// Move indirect relative point.
    ///
    /// MIRP\[abcde\] (0xE0 - 0xFF)
    ///
    /// Pops: n: CVT entry number
    ///       p: point number
    ///
    /// Like MDRP[] but the target distance comes from the CVT. When the
    /// distance is rounded, the measured distance is used instead if it
    /// differs from the CVT value by more than the control value cut in.
    /// Auto flip matches the sign of the CVT value to the measurement.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#move-indirect-relative-point>
    pub(super) fn op_mirp(&mut self, opcode: u8) -> OpResult {
        let cvt_ix = self.value_stack.pop()?;
        let point_ix = self.value_stack.pop_usize()?;
        // An index of -1 reads as zero.
        let cvt_distance = if cvt_ix == -1 {
            0
        } else {
            self.cvt_value(cvt_ix as usize)?
        };
        let gs = &self.graphics;
        let (zp0, zp1, rp0) = (gs.zp0, gs.zp1, gs.rp0);
        let mut cvt_distance =
            apply_single_width(cvt_distance, gs.single_width, gs.single_width_cutin);
        let rp0_original = self.zone(zp0).original(rp0)?;
        if zp1.is_twilight() {
            let fv = self.graphics.freedom_vector;
            let position = Point::new(
                rp0_original.x.wrapping_add(math::mul14(cvt_distance, fv.x)),
                rp0_original.y.wrapping_add(math::mul14(cvt_distance, fv.y)),
            );
            let zone = self.zone_mut(zp1);
            set_coords(zone.original_mut(point_ix)?, position);
            set_coords(zone.point_mut(point_ix)?, position);
        }
        let original_distance = self.dual_project(self.zone(zp1).original(point_ix)?, rp0_original);
        let current = self.project(
            self.zone(zp1).point(point_ix)?,
            self.zone(zp0).point(rp0)?,
        );
        let gs = &self.graphics;
        if gs.auto_flip && (original_distance ^ cvt_distance) < 0 {
            cvt_distance = cvt_distance.wrapping_neg();
        }
        let mut distance = if opcode & 4 != 0 {
            if zp0 == zp1
                && (cvt_distance.wrapping_sub(original_distance)).wrapping_abs()
                    > gs.control_value_cutin
            {
                cvt_distance = original_distance;
            }
            gs.round(cvt_distance)
        } else {
            cvt_distance
        };
        if opcode & 8 != 0 {
            distance = apply_min_distance(distance, original_distance, gs.min_distance);
        }
        self.move_point(zp1, point_ix, distance.wrapping_sub(current))?;
        let gs = &mut self.graphics;
        gs.rp1 = gs.rp0;
        gs.rp2 = point_ix;
        if opcode & 16 != 0 {
            gs.rp0 = point_ix;
        }
        Ok(())
    }

    /// Align relative point.
    ///
    /// ALIGNRP[] (0x3C)
    ///
    /// Pops: p1, p2, ... ploop: point numbers
    ///
    /// Moves each point in zp1 onto rp0 in zp0 along the projection vector.
    pub(super) fn op_alignrp(&mut self) -> OpResult {
        let (zp0, zp1, rp0) = (self.graphics.zp0, self.graphics.zp1, self.graphics.rp0);
        let rp0_point = self.zone(zp0).point(rp0)?;
        for _ in 0..self.take_loop_counter() {
            let point_ix = self.value_stack.pop_usize()?;
            let distance = self.project(self.zone(zp1).point(point_ix)?, rp0_point);
            self.move_point(zp1, point_ix, distance.wrapping_neg())?;
        }
        Ok(())
    }

    /// Moves point p to the intersection of two lines.
    ///
    /// ISECT[] (0x0F)
    ///
    /// Pops: b1, b0: end points of line b in zp0
    ///       a1, a0: end points of line a in zp1
    ///       p: point in zp2 to move
    ///
    /// Parallel lines put the point at the average of the four end points.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#moves-point-p-to-the-intersection-of-two-lines>
    pub(super) fn op_isect(&mut self) -> OpResult {
        let b1 = self.value_stack.pop_usize()?;
        let b0 = self.value_stack.pop_usize()?;
        let a1 = self.value_stack.pop_usize()?;
        let a0 = self.value_stack.pop_usize()?;
        let point_ix = self.value_stack.pop_usize()?;
        let gs = &self.graphics;
        let (zp0, zp1, zp2) = (gs.zp0, gs.zp1, gs.zp2);
        let (b0, b1) = (self.zone(zp0).point(b0)?, self.zone(zp0).point(b1)?);
        let (a0, a1) = (self.zone(zp1).point(a0)?, self.zone(zp1).point(a1)?);
        let db = Point::new(b1.x.wrapping_sub(b0.x), b1.y.wrapping_sub(b0.y));
        let da = Point::new(a1.x.wrapping_sub(a0.x), a1.y.wrapping_sub(a0.y));
        let dx = b0.x.wrapping_sub(a0.x);
        let dy = b0.y.wrapping_sub(a0.y);
        let discriminant =
            math::mul_div(da.x, -db.y, 0x40).wrapping_add(math::mul_div(da.y, db.x, 0x40));
        let dot = math::mul_div(da.x, db.x, 0x40).wrapping_add(math::mul_div(da.y, db.y, 0x40));
        // Lines within about 3 degrees of parallel are treated as parallel.
        let position = if 19 * (discriminant as i64).abs() > (dot as i64).abs() {
            let v = math::mul_div(dx, -db.y, 0x40).wrapping_add(math::mul_div(dy, db.x, 0x40));
            Point::new(
                a0.x.wrapping_add(math::mul_div(v, da.x, discriminant)),
                a0.y.wrapping_add(math::mul_div(v, da.y, discriminant)),
            )
        } else {
            let sum_x = a0.x as i64 + a1.x as i64 + b0.x as i64 + b1.x as i64;
            let sum_y = a0.y as i64 + a1.y as i64 + b0.y as i64 + b1.y as i64;
            Point::new((sum_x / 4) as i32, (sum_y / 4) as i32)
        };
        let point = self.zone_mut(zp2).point_mut(point_ix)?;
        set_coords(point, position);
        point.flags.set_marker(PointMarker::TOUCHED);
        Ok(())
    }

    /// Align points.
    ///
    /// ALIGNPTS[] (0x27)
    ///
    /// Pops: p2: point in zp0
    ///       p1: point in zp1
    ///
    /// Moves both points halfway toward each other along the projection
    /// vector.
    pub(super) fn op_alignpts(&mut self) -> OpResult {
        let p2 = self.value_stack.pop_usize()?;
        let p1 = self.value_stack.pop_usize()?;
        let (zp0, zp1) = (self.graphics.zp0, self.graphics.zp1);
        let distance = self.project(self.zone(zp0).point(p2)?, self.zone(zp1).point(p1)?) / 2;
        self.move_point(zp1, p1, distance)?;
        self.move_point(zp0, p2, distance.wrapping_neg())
    }

    /// Interpolate point by the last relative stretch.
    ///
    /// IP[] (0x39)
    ///
    /// Pops: p1, p2, ... ploop: points in zp2
    ///
    /// Moves each point so that its position relative to rp1 (zp0) and
    /// rp2 (zp1) is the same as in the original outline. Original
    /// positions are measured in font units unless a twilight zone is
    /// involved.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#interpolate-point-by-the-last-relative-stretch>
    pub(super) fn op_ip(&mut self) -> OpResult {
        let gs = &self.graphics;
        let (zp0, zp1, zp2, rp1, rp2) = (gs.zp0, gs.zp1, gs.zp2, gs.rp1, gs.rp2);
        let in_twilight = zp0.is_twilight() || zp1.is_twilight() || zp2.is_twilight();
        let base_current = self.zone(zp0).point(rp1)?;
        let (base_original, old_range) = if in_twilight {
            let base = self.zone(zp0).original(rp1)?;
            (base, self.dual_project(self.zone(zp1).original(rp2)?, base))
        } else {
            let base = self.zone(zp0).unscaled(rp1)?;
            let range = self.dual_project(self.zone(zp1).unscaled(rp2)?, base);
            (base, scale_value(self.scale, range, self.units_per_em))
        };
        let current_range = self.project(self.zone(zp1).point(rp2)?, base_current);
        for _ in 0..self.take_loop_counter() {
            let point_ix = self.value_stack.pop_usize()?;
            let zone = self.zone(zp2);
            let original_distance = if in_twilight {
                self.dual_project(zone.original(point_ix)?, base_original)
            } else {
                let distance = self.dual_project(zone.unscaled(point_ix)?, base_original);
                scale_value(self.scale, distance, self.units_per_em)
            };
            let current_distance = self.project(zone.point(point_ix)?, base_current);
            let new_distance = match (original_distance, old_range) {
                (0, _) => 0,
                // Degenerate reference span keeps the original offset.
                (distance, 0) => distance,
                (distance, range) => math::mul_div(distance, current_range, range),
            };
            self.move_point(zp2, point_ix, new_distance.wrapping_sub(current_distance))?;
        }
        Ok(())
    }

    /// Untouch point.
    ///
    /// UTP[] (0x29)
    ///
    /// Pops: p: point number
    ///
    /// Clears the touched flag of point `p` in zp0 for each axis the
    /// freedom vector moves along.
    pub(super) fn op_utp(&mut self) -> OpResult {
        let point_ix = self.value_stack.pop_usize()?;
        let fv = self.graphics.freedom_vector;
        let zp0 = self.graphics.zp0;
        let point = self.zone_mut(zp0).point_mut(point_ix)?;
        if fv.x != 0 {
            point.flags.clear_marker(PointMarker::TOUCHED_X);
        }
        if fv.y != 0 {
            point.flags.clear_marker(PointMarker::TOUCHED_Y);
        }
        Ok(())
    }

    /// Interpolate untouched points through the outline.
    ///
    /// IUP\[a\] (0x30 - 0x31)
    ///
    /// `a` selects the x axis when set and the y axis otherwise. Always
    /// operates on the glyph zone.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#interpolate-untouched-points-through-the-outline>
    pub(super) fn op_iup(&mut self, opcode: u8) -> OpResult {
        let axis = if opcode & 1 != 0 {
            CoordAxis::X
        } else {
            CoordAxis::Y
        };
        self.zone_mut(ZonePointer::Glyph).iup(axis)
    }

    /// Get coordinate projected onto the projection vector.
    ///
    /// GC\[a\] (0x46 - 0x47)
    ///
    /// Pops: p: point number
    /// Pushes: value: coordinate location (F26Dot6)
    ///
    /// `a` selects the original position (dual projection) when set.
    pub(super) fn op_gc(&mut self, opcode: u8) -> OpResult {
        let point_ix = self.value_stack.pop_usize()?;
        let zone = self.zone(self.graphics.zp2);
        let value = if opcode & 1 != 0 {
            self.graphics.dual_project(zone.original(point_ix)?)
        } else {
            self.graphics.project(zone.point(point_ix)?)
        };
        self.value_stack.push(value)
    }

    /// Sets coordinate from the stack using the projection vector and
    /// freedom vector.
    ///
    /// SCFS[] (0x48)
    ///
    /// Pops: value: distance from origin to move point (F26Dot6)
    ///       p: point number
    pub(super) fn op_scfs(&mut self) -> OpResult {
        let value = self.value_stack.pop()?;
        let point_ix = self.value_stack.pop_usize()?;
        let zp2 = self.graphics.zp2;
        let current = self.graphics.project(self.zone(zp2).point(point_ix)?);
        self.move_point(zp2, point_ix, value.wrapping_sub(current))?;
        if zp2.is_twilight() {
            let zone = self.zone_mut(zp2);
            let position = zone.point(point_ix)?;
            set_coords(zone.original_mut(point_ix)?, position);
        }
        Ok(())
    }

    /// Measure distance.
    ///
    /// MD\[a\] (0x49 - 0x4A)
    ///
    /// Pops: p2: point in zp1
    ///       p1: point in zp0
    /// Pushes: distance (F26Dot6)
    ///
    /// MD[1] measures the current outline. MD[0] measures the original
    /// outline, in font units scaled to the current size unless a twilight
    /// zone is involved.
    pub(super) fn op_md(&mut self, opcode: u8) -> OpResult {
        let p2 = self.value_stack.pop_usize()?;
        let p1 = self.value_stack.pop_usize()?;
        let (zp0, zp1) = (self.graphics.zp0, self.graphics.zp1);
        let (zone0, zone1) = (self.zone(zp0), self.zone(zp1));
        let distance = if opcode & 1 != 0 {
            self.project(zone0.point(p1)?, zone1.point(p2)?)
        } else if zp0.is_twilight() || zp1.is_twilight() {
            self.dual_project(zone0.original(p1)?, zone1.original(p2)?)
        } else {
            let distance = self.dual_project(zone0.unscaled(p1)?, zone1.unscaled(p2)?);
            scale_value(self.scale, distance, self.units_per_em)
        };
        self.value_stack.push(distance)
    }
}

fn set_coords(point: &mut crate::glyph::FontPoint, position: Point<i32>) {
    point.x = position.x;
    point.y = position.y;
}

/// Replaces a distance that is close to the single width value.
fn apply_single_width(distance: i32, single_width: i32, cutin: i32) -> i32 {
    if cutin > 0 && (distance.wrapping_sub(single_width)).wrapping_abs() < cutin {
        if distance >= 0 {
            single_width
        } else {
            -single_width
        }
    } else {
        distance
    }
}

/// Keeps `distance` at least `min_distance` away from zero, in the direction
/// of the original distance.
fn apply_min_distance(distance: i32, original_distance: i32, min_distance: i32) -> i32 {
    if original_distance >= 0 {
        distance.max(min_distance)
    } else {
        distance.min(-min_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{mock::MockEngine, HintErrorKind, ZonePointer};
    use crate::{glyph::PointMarker, hint::code::opcodes as op};

    const GLYPH: ZonePointer = ZonePointer::Glyph;
    const TWILIGHT: ZonePointer = ZonePointer::Twilight;

    // Mock glyph points are at (i * 64, i * 32) with contours 0..4 and
    // 4..10 followed by four phantom points.

    #[test]
    fn flip_points() {
        #[rustfmt::skip]
        let code = [
            op::PUSHB010, 1, 2, 2,
            op::SLOOP,
            op::FLIPPT,
            op::PUSHB001, 4, 6,
            op::FLIPRGOFF,
        ];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        let on_curve = |ix: usize| engine.zones[1].points[ix].flags.is_on_curve();
        assert!(on_curve(0) && !on_curve(1) && !on_curve(2) && on_curve(3));
        assert!(!on_curve(4) && !on_curve(5) && !on_curve(6) && on_curve(7));
        assert_eq!(engine.graphics.loop_counter, 1);
    }

    #[test]
    fn shift_point_and_contour() {
        #[rustfmt::skip]
        let code = [
            // move rp2 = 0 by 10 units along x
            op::PUSHB001, 0, 10,
            op::SCFS,
            op::PUSHB000, 3,
            op::SHP0,
            op::PUSHB000, 1,
            op::SHC0,
        ];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert_eq!(engine.point_at(GLYPH, 0), (10, 0));
        assert_eq!(engine.point_at(GLYPH, 1), (64, 32));
        assert_eq!(engine.point_at(GLYPH, 3), (192 + 10, 96));
        // contour 1 is points 4..10
        assert_eq!(engine.point_at(GLYPH, 4), (256 + 10, 128));
        assert_eq!(engine.point_at(GLYPH, 9), (576 + 10, 288));
        assert_eq!(engine.point_at(GLYPH, 10), (640, 320));
    }

    #[test]
    fn shift_zone_skips_reference_and_phantoms() {
        #[rustfmt::skip]
        let code = [
            op::PUSHB001, 2, 5,
            op::SCFS,
            op::PUSHB000, 2,
            op::SRP2,
            op::PUSHB000, 1,
            op::SHZ0,
        ];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        // point 2 moved to x = 5 from 128
        assert_eq!(engine.point_at(GLYPH, 2), (5, 64));
        assert_eq!(engine.point_at(GLYPH, 0), (-123, 0));
        assert_eq!(engine.point_at(GLYPH, 9), (576 - 123, 288));
        assert_eq!(engine.point_at(GLYPH, 10), (640, 320));
        // SHZ does not touch
        assert!(!engine.zones[1].points[0].flags.has_marker(PointMarker::TOUCHED_X));
        let code = [op::PUSHB000, 2, op::SHZ0];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        assert_eq!(engine.run().unwrap_err().kind, HintErrorKind::InvalidZoneIndex(2));
    }

    #[test]
    fn shift_by_pixels() {
        #[rustfmt::skip]
        let code = [
            op::SVTCA0,
            op::PUSHB011, 1, 2, 2, 40,
            op::SWAP,
            op::SLOOP,
            op::SHPIX,
        ];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert_eq!(engine.point_at(GLYPH, 1), (64, 72));
        assert_eq!(engine.point_at(GLYPH, 2), (128, 104));
        assert!(engine.zones[1].points[1].flags.has_marker(PointMarker::TOUCHED_Y));
    }

    #[test]
    fn move_direct_absolute() {
        #[rustfmt::skip]
        let code = [
            // nudge point 1 off the grid and round it back
            op::PUSHB001, 1, 90,
            op::SCFS,
            op::PUSHB000, 1,
            op::MDAP1,
        ];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert_eq!(engine.point_at(GLYPH, 1), (64, 32));
        assert_eq!((engine.graphics.rp0, engine.graphics.rp1), (1, 1));
    }

    #[test]
    fn move_indirect_absolute() {
        // cvt[2] = 128
        #[rustfmt::skip]
        let code = [
            op::PUSHB001, 1, 2,
            op::MIAP0,
            op::PUSHB000, 0,
            op::SZP0,
            op::PUSHB001, 3, 2,
            op::MIAP1,
        ];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert_eq!(engine.point_at(GLYPH, 1), (128, 32));
        // twilight points are created on the freedom vector
        assert_eq!(engine.point_at(TWILIGHT, 3), (128, 0));
        assert_eq!(engine.zones[0].original[3].x, 128);
        assert_eq!(engine.graphics.rp0, 3);
    }

    #[test]
    fn miap_cutin_keeps_measurement() {
        // cvt[7] = 448 is far from point 1 at x = 64
        let code = [op::PUSHB001, 1, 7, op::MIAP1];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert_eq!(engine.point_at(GLYPH, 1), (64, 32));
    }

    #[test]
    fn move_direct_relative() {
        #[rustfmt::skip]
        let code = [
            op::PUSHB000, 1,
            op::SRP0,
            // move point 3 so it is 128 units from rp0 again
            op::PUSHB001, 3, 10,
            op::SCFS,
            op::PUSHB000, 3,
            // set rp0, min distance, round
            op::MDRP00000 | 0x1C,
        ];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert_eq!(engine.point_at(GLYPH, 3), (64 + 128, 96));
        let gs = engine.graphics;
        assert_eq!((gs.rp0, gs.rp1, gs.rp2), (3, 1, 3));
    }

    #[test]
    fn mdrp_min_distance() {
        #[rustfmt::skip]
        let code = [
            op::PUSHB000, 20,
            op::SMD,
            op::PUSHB000, 1,
            op::SRP0,
            // point 1 relative to itself has distance 0
            op::PUSHB000, 1,
            op::MDRP00000 | 0x08,
        ];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert_eq!(engine.point_at(GLYPH, 1), (64 + 20, 32));
    }

    #[test]
    fn move_indirect_relative() {
        // cvt[3] = 192, original distance from point 1 to point 4 is 192.
        #[rustfmt::skip]
        let code = [
            op::PUSHB000, 1,
            op::SRP0,
            op::PUSHB001, 4, 3,
            op::MIRP00000 | 0x04,
        ];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.zones[1].points[4].x += 7;
        engine.run().unwrap();
        assert_eq!(engine.point_at(GLYPH, 4), (256, 128));
    }

    #[test]
    fn mirp_creates_twilight_point() {
        // Twilight point 2 is created cvt[1] = 64 units from rp0 in the
        // glyph zone.
        #[rustfmt::skip]
        let code = [
            op::PUSHB000, 3,
            op::SRP0,
            op::PUSHB000, 0,
            op::SZP1,
            op::PUSHB001, 2, 1,
            op::MIRP00000,
        ];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert_eq!(engine.point_at(TWILIGHT, 2), (192 + 64, 96));
        assert_eq!(engine.zones[0].original[2].x, 192 + 64);
    }

    #[test]
    fn mirp_auto_flip() {
        // Point 1 is 128 units before rp0 = 3 while cvt[2] is +128.
        for (flip, expected) in [(op::FLIPON, 64), (op::FLIPOFF, 192 + 128)] {
            #[rustfmt::skip]
            let code = [
                flip,
                op::PUSHB000, 3,
                op::SRP0,
                op::PUSHB001, 1, 2,
                op::MIRP00000,
            ];
            let mut mock = MockEngine::new();
            let mut engine = mock.engine(&code);
            engine.run().unwrap();
            assert_eq!(engine.point_at(GLYPH, 1).0, expected);
        }
    }

    #[test]
    fn align_relative() {
        #[rustfmt::skip]
        let code = [
            op::PUSHB000, 1,
            op::SRP0,
            op::PUSHB010, 5, 6, 2,
            op::SLOOP,
            op::ALIGNRP,
        ];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert_eq!(engine.point_at(GLYPH, 5), (64, 160));
        assert_eq!(engine.point_at(GLYPH, 6), (64, 192));
    }

    #[test]
    fn align_points() {
        let code = [op::PUSHB001, 1, 3, op::ALIGNPTS];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert_eq!(engine.point_at(GLYPH, 1).0, 128);
        assert_eq!(engine.point_at(GLYPH, 3).0, 128);
    }

    #[test]
    fn intersect() {
        let mut mock = MockEngine::new();
        #[rustfmt::skip]
        let code = [
            op::PUSHB000, 0,
            op::SZP2,
            // point, a0, a1, b0, b1
            op::NPUSHB, 5, 0, 0, 1, 2, 3,
            op::ISECT,
        ];
        let mut engine = mock.engine(&code);
        // line a: (0, 0) -> (128, 128), line b: (0, 128) -> (128, 0)
        let points = &mut engine.zones[1].points;
        (points[0].x, points[0].y) = (0, 0);
        (points[1].x, points[1].y) = (128, 128);
        (points[2].x, points[2].y) = (0, 128);
        (points[3].x, points[3].y) = (128, 0);
        engine.run().unwrap();
        assert_eq!(engine.point_at(TWILIGHT, 0), (64, 64));
        assert!(engine.zones[0].points[0].flags.has_marker(PointMarker::TOUCHED));
    }

    #[test]
    fn intersect_parallel() {
        let mut mock = MockEngine::new();
        #[rustfmt::skip]
        let code = [
            op::PUSHB000, 0,
            op::SZP2,
            // all glyph points lie on one line
            op::NPUSHB, 5, 0, 0, 1, 2, 3,
            op::ISECT,
        ];
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert_eq!(engine.point_at(TWILIGHT, 0), (96, 48));
    }

    #[test]
    fn interpolate_point() {
        #[rustfmt::skip]
        let code = [
            op::PUSHB001, 0, 4,
            op::SRP2,
            op::SRP1,
            // stretch the span from 0..256 to 0..512
            op::PUSHB000, 4,
            op::PUSHW000, 0x02, 0x00,
            op::SCFS,
            op::PUSHB001, 1, 3,
            op::PUSHB000, 2,
            op::SLOOP,
            op::IP,
        ];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert_eq!(engine.point_at(GLYPH, 1).0, 128);
        assert_eq!(engine.point_at(GLYPH, 3).0, 384);
    }

    #[test]
    fn untouch_and_iup() {
        #[rustfmt::skip]
        let code = [
            // touch points 0 and 1 in place
            op::PUSHB001, 0, 1,
            op::MDAP0,
            op::MDAP0,
            // move point 2 by 64
            op::PUSHB001, 2, 192,
            op::SCFS,
            op::PUSHB000, 1,
            op::UTP,
            op::IUP1,
        ];
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert!(!engine.zones[1].points[1].flags.has_marker(PointMarker::TOUCHED_X));
        // point 1 is halfway between 0 and 2; point 3 follows point 2
        assert_eq!(engine.point_at(GLYPH, 1).0, 96);
        assert_eq!(engine.point_at(GLYPH, 3).0, 192 + 64);
        // second contour has no touched points
        assert_eq!(engine.point_at(GLYPH, 5).0, 320);
    }

    #[test]
    fn get_and_measure() {
        #[rustfmt::skip]
        let code = [
            op::PUSHB001, 3, 10,
            op::SCFS,
            op::PUSHB000, 3,
            op::GC0,
            op::PUSHB000, 3,
            op::GC1,
            op::PUSHB001, 3, 1,
            op::MD1,
            op::PUSHB001, 3, 1,
            op::MD0,
        ];
        let mut mock = MockEngine::new();
        assert_eq!(
            mock.engine(&code).run_to_stack().unwrap(),
            [10, 192, -54, 128]
        );
    }
}
