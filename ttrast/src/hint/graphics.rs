//! Graphics state for the TrueType interpreter.

use core::ops::{Deref, DerefMut};

use ttrast_types::Point;

use super::{
    math::{ceil, floor, round, round_pad},
    zone::ZonePointer,
};

/// Axis a vector is aligned with, if any. Aligned vectors take a fast path
/// when projecting and moving points.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum CoordAxis {
    #[default]
    Both,
    X,
    Y,
}

/// Active rounding function, named after the instruction that selects it.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum RoundMode {
    /// RTG
    #[default]
    Grid,
    /// RTHG
    HalfGrid,
    /// RTDG
    DoubleGrid,
    /// RDTG
    DownToGrid,
    /// RUTG
    UpToGrid,
    /// ROFF
    Off,
    /// SROUND
    Super,
    /// S45ROUND
    Super45,
}

/// Rounding mode plus the super rounding parameters, all in 26.6.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct RoundState {
    pub mode: RoundMode,
    pub threshold: i32,
    pub phase: i32,
    pub period: i32,
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            mode: RoundMode::Grid,
            threshold: 0,
            phase: 0,
            period: 64,
        }
    }
}

impl RoundState {
    /// Decodes the operand of `SROUND` or `S45ROUND`.
    ///
    /// Bits 6-7 select the period, bits 4-5 the phase and bits 0-3 the
    /// threshold.
    pub fn super_round(selector: i32, is_45: bool) -> Self {
        let mut period = match (selector >> 6) & 3 {
            0 => 32,
            2 => 128,
            _ => 64,
        };
        if is_45 {
            period = period * 46341 / 65536;
        }
        let phase = period * ((selector >> 4) & 3) / 4;
        let threshold = match selector & 15 {
            0 => period - 1,
            n => period * (n - 4) / 8,
        };
        Self {
            mode: if is_45 {
                RoundMode::Super45
            } else {
                RoundMode::Super
            },
            threshold,
            phase,
            period,
        }
    }

    pub fn round(&self, distance: i32) -> i32 {
        match self.mode {
            RoundMode::Off => distance,
            RoundMode::Grid => keep_sign(distance, round),
            RoundMode::HalfGrid => keep_sign(distance, |d| floor(d) + 32),
            RoundMode::DoubleGrid => keep_sign(distance, |d| round_pad(d, 32)),
            RoundMode::DownToGrid => keep_sign(distance, floor),
            RoundMode::UpToGrid => keep_sign(distance, ceil),
            RoundMode::Super => self.super_magnitude(distance, |d| d & -self.period),
            RoundMode::Super45 => {
                self.super_magnitude(distance, |d| d / self.period * self.period)
            }
        }
    }

    /// Applies a super rounding `snap` to the magnitude of `distance`. A
    /// result that would flip the sign collapses to the phase.
    fn super_magnitude(&self, distance: i32, snap: impl Fn(i32) -> i32) -> i32 {
        let magnitude = snap(distance.abs() + self.threshold - self.phase) + self.phase;
        let magnitude = if magnitude < 0 { self.phase } else { magnitude };
        if distance >= 0 {
            magnitude
        } else {
            -magnitude
        }
    }
}

/// Rounds the magnitude of `distance` and never lets the result cross zero.
fn keep_sign(distance: i32, f: impl Fn(i32) -> i32) -> i32 {
    if distance >= 0 {
        f(distance).max(0)
    } else {
        (-f(-distance)).min(0)
    }
}

/// The part of the graphics state that `prep` may set for every glyph.
///
/// Vectors, reference points, zone pointers and the loop counter are not
/// here since each glyph program starts with their defaults.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct RetainedGraphicsState {
    /// MIRP flips the sign of a cvt entry to match the measured distance.
    pub auto_flip: bool,
    /// Largest difference between a cvt entry and the original distance for
    /// which the cvt entry is used.
    pub control_value_cutin: i32,
    /// Lowest ppem addressed by DELTAP1 and DELTAC1.
    pub delta_base: u16,
    /// Delta steps are `1 / 2^delta_shift` pixels.
    pub delta_shift: u16,
    /// INSTCTRL flags. Bit 0 inhibits glyph programs, bit 1 resets the
    /// graphics state they start from.
    pub instruct_control: u8,
    pub min_distance: i32,
    pub round_state: RoundState,
    /// Dropout control request. Stored for SCANCTRL but the rasterizer does
    /// not use it.
    pub scan_control: bool,
    /// Distances this close to `single_width` snap to it.
    pub single_width_cutin: i32,
    pub single_width: i32,
}

impl Default for RetainedGraphicsState {
    fn default() -> Self {
        Self {
            auto_flip: true,
            // 17/16 pixels in 26.6
            control_value_cutin: 68,
            delta_base: 9,
            delta_shift: 3,
            instruct_control: 0,
            min_distance: 64,
            round_state: RoundState::default(),
            scan_control: false,
            single_width_cutin: 0,
            single_width: 0,
        }
    }
}

/// Full interpreter graphics state. Vectors are unit length in 2.14.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct GraphicsState {
    pub retained: RetainedGraphicsState,
    /// Direction along which distances are measured.
    pub proj_vector: Point<i32>,
    pub proj_axis: CoordAxis,
    /// Projection vector used on original, unhinted positions.
    pub dual_proj_vector: Point<i32>,
    pub dual_proj_axis: CoordAxis,
    /// Direction along which points move.
    pub freedom_vector: Point<i32>,
    pub freedom_axis: CoordAxis,
    /// Cached `freedom . projection` in 2.14.
    pub fdotp: i32,
    pub rp0: usize,
    pub rp1: usize,
    pub rp2: usize,
    /// Repeat count for the looping point instructions.
    pub loop_counter: u32,
    pub zp0: ZonePointer,
    pub zp1: ZonePointer,
    pub zp2: ZonePointer,
}

impl GraphicsState {
    /// Creates a state with default values for everything but the retained
    /// fields.
    pub fn new(retained: RetainedGraphicsState) -> Self {
        Self {
            retained,
            ..Default::default()
        }
    }

    pub fn round(&self, distance: i32) -> i32 {
        self.round_state.round(distance)
    }

    /// Updates the cached dot product of the freedom and projection
    /// vectors.
    pub fn update_projection_state(&mut self) {
        self.proj_axis = axis_of(self.proj_vector);
        self.dual_proj_axis = axis_of(self.dual_proj_vector);
        self.freedom_axis = axis_of(self.freedom_vector);
        let fdotp = (self.freedom_vector.x * self.proj_vector.x
            + self.freedom_vector.y * self.proj_vector.y)
            >> 14;
        // Nearly perpendicular vectors would send movements to infinity.
        self.fdotp = if fdotp.abs() < 0x400 { 0x4000 } else { fdotp };
    }

    /// Projects `v` onto the projection vector.
    pub fn project(&self, v: Point<i32>) -> i32 {
        match self.proj_axis {
            CoordAxis::X => v.x,
            CoordAxis::Y => v.y,
            CoordAxis::Both => super::math::dot14(v, self.proj_vector),
        }
    }

    /// Projects `v` onto the dual projection vector.
    pub fn dual_project(&self, v: Point<i32>) -> i32 {
        match self.dual_proj_axis {
            CoordAxis::X => v.x,
            CoordAxis::Y => v.y,
            CoordAxis::Both => super::math::dot14(v, self.dual_proj_vector),
        }
    }
}

impl Default for GraphicsState {
    fn default() -> Self {
        let x_axis = Point::new(0x4000, 0);
        Self {
            retained: RetainedGraphicsState::default(),
            proj_vector: x_axis,
            proj_axis: CoordAxis::X,
            dual_proj_vector: x_axis,
            dual_proj_axis: CoordAxis::X,
            freedom_vector: x_axis,
            freedom_axis: CoordAxis::X,
            fdotp: 0x4000,
            rp0: 0,
            rp1: 0,
            rp2: 0,
            loop_counter: 1,
            zp0: ZonePointer::default(),
            zp1: ZonePointer::default(),
            zp2: ZonePointer::default(),
        }
    }
}

impl Deref for GraphicsState {
    type Target = RetainedGraphicsState;

    fn deref(&self) -> &Self::Target {
        &self.retained
    }
}

impl DerefMut for GraphicsState {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.retained
    }
}

fn axis_of(v: Point<i32>) -> CoordAxis {
    match (v.x, v.y) {
        (0x4000, 0) => CoordAxis::X,
        (0, 0x4000) => CoordAxis::Y,
        _ => CoordAxis::Both,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_modes() {
        let mut state = RoundState::default();
        let cases = [
            (RoundMode::Off, 90),
            (RoundMode::Grid, 64),
            (RoundMode::HalfGrid, 96),
            (RoundMode::DownToGrid, 64),
            (RoundMode::UpToGrid, 128),
            (RoundMode::DoubleGrid, 96),
        ];
        for (mode, expected) in cases {
            state.mode = mode;
            assert_eq!(state.round(90), expected, "{mode:?}");
            assert_eq!(state.round(-90), -expected, "{mode:?}");
        }
        // Sign is preserved for small values.
        state.mode = RoundMode::DownToGrid;
        assert_eq!(state.round(-10), 0);
    }

    #[test]
    fn super_round() {
        let state = RoundState::super_round(0x58, false);
        assert_eq!((state.period, state.phase, state.threshold), (64, 16, 32));
        let rounded = [-81, -80, -17, -16, 0, 16, 47, 48].map(|v| state.round(v));
        assert_eq!(rounded, [-80, -80, -16, -16, 16, 16, 16, 80]);
    }

    #[test]
    fn super_round_45() {
        let state = RoundState::super_round(0x48, true);
        assert_eq!(state.mode, RoundMode::Super45);
        assert_eq!((state.period, state.phase, state.threshold), (45, 0, 22));
        assert_eq!(state.round(50), 45);
        assert_eq!(state.round(70), 90);
    }

    #[test]
    fn projection_axes() {
        let mut state = GraphicsState::default();
        assert_eq!(state.project(Point::new(5, 7)), 5);
        state.proj_vector = Point::new(0, 0x4000);
        state.update_projection_state();
        assert_eq!(state.proj_axis, CoordAxis::Y);
        assert_eq!(state.project(Point::new(5, 7)), 7);
        // x axis freedom and y axis projection are perpendicular
        assert_eq!(state.fdotp, 0x4000);
        state.proj_vector = Point::new(0x2D41, 0x2D41);
        state.update_projection_state();
        assert_eq!(state.proj_axis, CoordAxis::Both);
        assert_eq!(state.fdotp, 0x2D41);
        assert_eq!(state.project(Point::new(100, 100)), 141);
    }
}
