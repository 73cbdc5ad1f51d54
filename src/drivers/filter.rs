use crate::state::Axes;

/// Exponential low-pass filter.
///
/// The output starts at zero rather than at the first input, so a fresh
/// filter ramps up towards the signal.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LowPassFilter {
    alpha: f32,
    last_output: f32,
}

impl LowPassFilter {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            last_output: 0.0,
        }
    }

    pub fn filter(&mut self, input: f32) -> f32 {
        self.last_output = blend(self.alpha, input, self.last_output);
        self.last_output
    }

    pub fn output(&self) -> f32 {
        self.last_output
    }

    pub fn reset(&mut self) {
        self.last_output = 0.0;
    }
}

/// One [`LowPassFilter`] per axis.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxesLowPass {
    axes: Axes<LowPassFilter>,
}

impl AxesLowPass {
    pub fn new(alpha: f32) -> Self {
        let lpf = LowPassFilter::new(alpha);
        Self {
            axes: Axes::new(lpf, lpf, lpf),
        }
    }

    pub fn filter(&mut self, input: Axes<f32>) -> Axes<f32> {
        Axes::new(
            self.axes.x.filter(input.x),
            self.axes.y.filter(input.y),
            self.axes.z.filter(input.z),
        )
    }

    pub fn output(&self) -> Axes<f32> {
        self.axes.map(|lpf| lpf.output())
    }
}

#[inline]
fn blend(alpha: f32, input: f32, previous: f32) -> f32 {
    input * alpha + previous * (1.0 - alpha)
}
