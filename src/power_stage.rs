//! Power stage seam used to align the rotor during zero calibration.

use embedded_hal::pwm::SetDutyCycle;
use libm::{cosf, sinf, sqrtf};

/// Three-phase duty cycle, each phase a fraction in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseDuty {
    pub u: f32,
    pub v: f32,
    pub w: f32,
}

/// Field-oriented modulation and PWM output of the motor driver
pub trait PowerStage {
    type Error;

    /// Duty cycles that produce the field vector `(d_axis, q_axis)` at the
    /// electrical angle `theta`. Axis magnitudes are fractions of full
    /// modulation.
    fn compute_duty_cycle(&self, d_axis: f32, q_axis: f32, theta: f32) -> PhaseDuty;

    /// Push duty cycles to the PWM outputs
    ///
    /// # Errors
    ///
    /// Returns the PWM driver's error if a channel cannot be updated
    fn apply_duty_cycle(&mut self, duty: PhaseDuty) -> Result<(), Self::Error>;
}

/// Sinusoidal modulation onto three [`SetDutyCycle`] channels
#[derive(Debug)]
pub struct PwmStage<U, V, W> {
    u: U,
    v: V,
    w: W,
}

impl<U, V, W, E> PwmStage<U, V, W>
where
    U: SetDutyCycle<Error = E>,
    V: SetDutyCycle<Error = E>,
    W: SetDutyCycle<Error = E>,
{
    pub fn new(u: U, v: V, w: W) -> Self {
        Self { u, v, w }
    }

    pub fn release(self) -> (U, V, W) {
        (self.u, self.v, self.w)
    }
}

impl<U, V, W, E> PowerStage for PwmStage<U, V, W>
where
    U: SetDutyCycle<Error = E>,
    V: SetDutyCycle<Error = E>,
    W: SetDutyCycle<Error = E>,
{
    type Error = E;

    fn compute_duty_cycle(&self, d_axis: f32, q_axis: f32, theta: f32) -> PhaseDuty {
        let (d_axis, q_axis) = limit_magnitude(d_axis, q_axis, 1.0);
        let (alpha, beta) = inverse_park(d_axis, q_axis, theta);
        let (u, v, w) = inverse_clarke(alpha, beta);
        PhaseDuty {
            u: (0.5 + 0.5 * u).clamp(0.0, 1.0),
            v: (0.5 + 0.5 * v).clamp(0.0, 1.0),
            w: (0.5 + 0.5 * w).clamp(0.0, 1.0),
        }
    }

    fn apply_duty_cycle(&mut self, duty: PhaseDuty) -> Result<(), E> {
        set_fraction(&mut self.u, duty.u)?;
        set_fraction(&mut self.v, duty.v)?;
        set_fraction(&mut self.w, duty.w)
    }
}

fn set_fraction<P: SetDutyCycle>(channel: &mut P, fraction: f32) -> Result<(), P::Error> {
    let max = channel.max_duty_cycle();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let duty = (fraction.clamp(0.0, 1.0) * f32::from(max) + 0.5) as u16;
    channel.set_duty_cycle(duty.min(max))
}

/// dq to αβ
fn inverse_park(d: f32, q: f32, theta: f32) -> (f32, f32) {
    let (sin_theta, cos_theta) = (sinf(theta), cosf(theta));
    (d * cos_theta - q * sin_theta, d * sin_theta + q * cos_theta)
}

/// αβ to uvw
fn inverse_clarke(alpha: f32, beta: f32) -> (f32, f32, f32) {
    const SQRT3_DIV_2: f32 = 0.866_025_4;
    (
        alpha,
        -0.5 * alpha + SQRT3_DIV_2 * beta,
        -0.5 * alpha - SQRT3_DIV_2 * beta,
    )
}

fn limit_magnitude(d: f32, q: f32, max: f32) -> (f32, f32) {
    let magnitude = sqrtf(d * d + q * q);
    if magnitude > max {
        let scale = max / magnitude;
        (d * scale, q * scale)
    } else {
        (d, q)
    }
}
