//! Tilt-compensated compass heading.
//!
//! One [`update`] per uplink: widen the hard-iron calibration bounds, low-pass
//! the magnetometer and accelerometer, remove the hard-iron offset, correct for
//! pitch and roll and finally fold the heading into the range the telemetry
//! consumers expect (see [`remap_heading`]).

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::HeadingConfig;
use crate::drivers::filter::AxesLowPass;
use crate::state::{Axes, SensorSnapshot};

// ── Calibration ───────────────────────────────────────────────────────────────

/// Hard-iron bounds measured on the reference board, in mGauss.
pub const FACTORY_MAG_MIN: Axes<i32> = Axes::new(-412, -7109, 0);
pub const FACTORY_MAG_MAX: Axes<i32> = Axes::new(6535, 0, 6216);

/// Running per-axis magnetometer extremes. Bounds only ever widen.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationBounds {
    min: Axes<i32>,
    max: Axes<i32>,
}

impl CalibrationBounds {
    pub const fn new(min: Axes<i32>, max: Axes<i32>) -> Self {
        Self { min, max }
    }

    pub fn widen(&mut self, sample: Axes<i32>) {
        self.min = self.min.zip_with(sample, i32::min);
        self.max = self.max.zip_with(sample, i32::max);
    }

    /// Hard-iron offset: integer midpoint of the bounds, truncated toward zero.
    pub fn midpoint(&self) -> Axes<i32> {
        self.min
            .zip_with(self.max, |lo, hi| ((i64::from(lo) + i64::from(hi)) / 2) as i32)
    }

    pub fn min(&self) -> Axes<i32> {
        self.min
    }

    pub fn max(&self) -> Axes<i32> {
        self.max
    }
}

impl Default for CalibrationBounds {
    fn default() -> Self {
        Self::new(FACTORY_MAG_MIN, FACTORY_MAG_MAX)
    }
}

// ── Filter state ──────────────────────────────────────────────────────────────

/// Everything the heading filter remembers between uplinks.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeadingFilterState {
    bounds: CalibrationBounds,
    mag: AxesLowPass,
    acc: AxesLowPass,
    /// Returned when the current sample cannot produce a heading.
    last_heading: f32,
}

impl HeadingFilterState {
    pub fn new(config: HeadingConfig) -> Self {
        Self::with_bounds(config, CalibrationBounds::default())
    }

    pub fn with_bounds(config: HeadingConfig, bounds: CalibrationBounds) -> Self {
        Self {
            bounds,
            mag: AxesLowPass::new(config.mag_alpha),
            acc: AxesLowPass::new(config.acc_alpha),
            last_heading: 0.0,
        }
    }

    pub fn bounds(&self) -> &CalibrationBounds {
        &self.bounds
    }

    pub fn filtered_magneto(&self) -> Axes<f32> {
        self.mag.output()
    }

    pub fn filtered_accelero(&self) -> Axes<f32> {
        self.acc.output()
    }

    pub fn last_heading(&self) -> f32 {
        self.last_heading
    }
}

impl Default for HeadingFilterState {
    fn default() -> Self {
        Self::new(HeadingConfig::default())
    }
}

// ── Heading ───────────────────────────────────────────────────────────────────

/// Run one filter step and return the heading in degrees.
///
/// A zero accelerometer vector (or any non-finite intermediate) leaves the
/// heading undefined; the calibration and filter history are still updated
/// and the previous heading is returned.
pub fn update(state: &mut HeadingFilterState, snapshot: &SensorSnapshot) -> f32 {
    state.bounds.widen(snapshot.magneto);

    let mag = state.mag.filter(snapshot.magneto.map(|v| v as f32));
    let acc = state.acc.filter(snapshot.accelero_raw.map(f32::from));

    let offset = state.bounds.midpoint();
    let mag = mag.zip_with(offset, |m, mid| m - mid as f32);

    match tilt_compensated_heading(mag, acc) {
        Some(raw) => {
            state.last_heading = remap_heading(raw);
            state.last_heading
        }
        None => state.last_heading,
    }
}

/// Heading in degrees (`atan2` range) of a hard-iron corrected magnetometer
/// sample, compensated with the attitude of the accelerometer vector.
pub fn tilt_compensated_heading(mag: Axes<f32>, acc: Axes<f32>) -> Option<f32> {
    let norm = (acc.x * acc.x + acc.y * acc.y + acc.z * acc.z).sqrt();
    if !norm.is_finite() || norm <= 0.0 {
        return None;
    }
    let acc_x_norm = (acc.x / norm).clamp(-1.0, 1.0);
    let acc_y_norm = acc.y / norm;

    let pitch = acc_x_norm.asin();
    let (sin_pitch, cos_pitch) = (pitch.sin(), pitch.cos());
    // Rounding can push the ratio just past ±1 near level attitude
    let roll = -(acc_y_norm / cos_pitch).clamp(-1.0, 1.0).asin();
    let (sin_roll, cos_roll) = (roll.sin(), roll.cos());

    let mag_x_comp = mag.x * cos_pitch + mag.z * sin_pitch;
    let mag_y_comp =
        mag.x * sin_roll * sin_pitch + mag.y * cos_roll + mag.z * sin_roll * cos_pitch;

    let heading = mag_y_comp.atan2(mag_x_comp).to_degrees();
    heading.is_finite().then_some(heading)
}

/// Fold an `atan2` heading into the telemetry convention.
///
/// The mapping is discontinuous at 0° and not monotonic; receivers decode
/// exactly this shape, so it must not be "fixed".
pub fn remap_heading(heading: f32) -> f32 {
    if heading <= -180.0 || heading >= 180.0 {
        0.0
    } else if heading < 0.0 {
        180.0 + heading
    } else {
        -(180.0 - heading)
    }
}
