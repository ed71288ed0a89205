/*
    Magswim, adaptive charged-particle swimming through magnetic fields
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/


use super::error_ctrl::ErrorCtrl;
use super::{DynamicsSnafu, IntegrationDetails, PropagationError, Propagator};
use crate::dynamics::Dynamics;
use crate::linalg::Vector6;
use crate::state::StateVector;
use snafu::ResultExt;
use std::f64;

/// Largest factor by which a step may grow after an accepted step.
const MAX_GROWTH: f64 = 5.0;
/// Smallest factor by which a step may shrink after a rejected step.
const MAX_SHRINK: f64 = 0.1;

/// A propagator instance holds the state of one propagation: the current state and path length,
/// the integrator details of the previous step, and the adapted step size for the next one.
#[derive(Debug)]
pub struct PropInstance<'a, D: Dynamics, E: ErrorCtrl> {
    /// The state of this propagator instance, position in meters
    pub state: StateVector,
    /// Path length travelled so far, in meters
    pub s: f64,
    /// The propagator setup (kind, stages, etc.)
    pub prop: &'a Propagator<D, E>,
    /// Stores the details of the previous integration step
    pub details: IntegrationDetails,
    pub(crate) step_size: f64, // Stores the adapted step for the _next_ call
    pub(crate) max_step: f64,
    pub(crate) fixed_step: bool,
    // Allows us to do pre-allocation of the ki vectors
    pub(crate) k: Vec<Vector6<f64>>,
}

impl<'a, D: Dynamics, E: ErrorCtrl> PropInstance<'a, D, E> {
    /// Allows setting the step size of the propagator
    pub fn set_step(&mut self, step_size: f64, fixed: bool) {
        self.step_size = step_size;
        self.fixed_step = fixed;
    }

    /// Caps the adaptive step size of this instance, without changing the propagator options.
    pub fn set_max_step(&mut self, max_step: f64) {
        self.max_step = max_step.max(self.prop.opts.min_step);
        if self.step_size > self.max_step {
            self.step_size = self.max_step;
        }
    }

    /// Step size which will be attempted by the next call.
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Restarts this instance from another state and path length, with a new initial step.
    pub fn reset(&mut self, state: StateVector, s: f64, step_size: f64) {
        self.state = state;
        self.s = s;
        self.step_size = step_size.min(self.max_step).max(self.prop.opts.min_step);
        self.fixed_step = self.prop.opts.fixed_step;
    }

    /// Calls `finally` on the current state, e.g. to normalize the direction before the first step.
    pub fn prepare(&mut self) -> Result<(), PropagationError> {
        self.state = StateVector::from_vector(
            self.prop
                .dynamics
                .finally(*self.state.as_vector())
                .context(DynamicsSnafu)?,
        );
        Ok(())
    }

    /// Takes one adaptive step, or a final step of exactly the remaining path length if the next
    /// step would go past `s_max`. Returns true once `s_max` is reached.
    pub fn step_toward(&mut self, s_max: f64) -> Result<bool, PropagationError> {
        let remaining = s_max - self.s;
        if remaining <= 0.0 {
            return Ok(true);
        }

        if self.s + self.step_size >= s_max {
            // Take one final step of exactly the needed path length
            let prev_step_size = self.step_size;
            let prev_step_kind = self.fixed_step;
            self.set_step(remaining, true);

            let rslt = self.single_step();

            // Restore the step size for subsequent calls
            self.set_step(prev_step_size, prev_step_kind);
            rslt?;
            // Avoid an accumulation of rounding in the path length
            self.s = s_max;
            Ok(true)
        } else {
            self.single_step()?;
            Ok(false)
        }
    }

    /// This method propagates the provided Dynamics for the provided path length.
    pub fn for_path_length(&mut self, delta_s: f64) -> Result<StateVector, PropagationError> {
        let s_max = self.s + delta_s;
        self.until_path_length(s_max)
    }

    /// Propagates the provided Dynamics until the provided path length. Returns the end state.
    pub fn until_path_length(&mut self, s_max: f64) -> Result<StateVector, PropagationError> {
        self.prepare()?;
        while !self.step_toward(s_max)? {}
        Ok(self.state)
    }

    /// Take a single propagator step.
    pub fn single_step(&mut self) -> Result<(), PropagationError> {
        let (step, state_vec) = self.derive()?;
        let state_vec = self
            .prop
            .dynamics
            .finally(state_vec)
            .context(DynamicsSnafu)?;
        self.state = StateVector::from_vector(state_vec);
        self.s += step;

        Ok(())
    }

    /// Evaluates the stages from the current state with the provided step and returns the
    /// candidate state and its error estimate.
    fn evaluate(&mut self, step_size: f64) -> Result<(Vector6<f64>, Vector6<f64>), PropagationError> {
        let state_vec = *self.state.as_vector();
        self.k[0] = self
            .prop
            .dynamics
            .eom(0.0, &state_vec)
            .context(DynamicsSnafu)?;
        let mut a_idx: usize = 0;
        for i in 0..(self.prop.stages - 1) {
            // Let's compute the c_i by summing the relevant items from the list of coefficients.
            // \sum_{j=1}^{i-1} a_ij  ∀ i ∈ [2, s]
            let mut ci: f64 = 0.0;
            // The wi stores the a_{s1} * k_1 + a_{s2} * k_2 + ... + a_{s, s-1} * k_{s-1} +
            let mut wi = Vector6::<f64>::zeros();
            for kj in &self.k[0..i + 1] {
                let a_ij = self.prop.a_coeffs[a_idx];
                ci += a_ij;
                wi += a_ij * kj;
                a_idx += 1;
            }

            self.k[i + 1] = self
                .prop
                .dynamics
                .eom(ci * step_size, &(state_vec + step_size * wi))
                .context(DynamicsSnafu)?;
        }
        // Compute the next state and the error
        let mut next_state = state_vec;
        let mut error_est = Vector6::<f64>::zeros();
        for (i, ki) in self.k.iter().enumerate() {
            let b_i = self.prop.b_coeffs[i];
            if !self.fixed_step {
                let b_i_star = self.prop.b_coeffs[i + self.prop.stages];
                error_est += step_size * (b_i - b_i_star) * ki;
            }
            next_state += step_size * b_i * ki;
        }
        Ok((next_state, error_est))
    }

    /// This method integrates the dynamics of the propagator. Everything passed to this function is in **meters**.
    ///
    /// This function returns the step sized used and the new state as y_{n+1} = y_n + \frac{dy_n}{ds}.
    /// To get the integration details, check `self.latest_details`.
    fn derive(&mut self) -> Result<(f64, Vector6<f64>), PropagationError> {
        let state_vec = *self.state.as_vector();
        let min_step = self.prop.opts.min_step;
        // Reset the number of attempts used (we don't reset the error because it's set before it's read)
        self.details.attempts = 1;
        // It's mutable because we may change it below
        let mut step_size = self.step_size;
        loop {
            let (next_state, error_est) = match self.evaluate(step_size) {
                Ok((next_state, error_est)) if next_state.iter().all(|v| v.is_finite()) => {
                    (next_state, error_est)
                }
                other => {
                    if self.fixed_step || step_size <= min_step {
                        // Nothing left to shrink: this is a genuine fault
                        return Err(match other {
                            Err(e) => e,
                            Ok(_) => PropagationError::NonFiniteState {
                                s: self.s,
                                step: step_size,
                            },
                        });
                    }
                    trace!(
                        "non finite stage at s = {:.6e} m with step {:.3e} m, shrinking",
                        self.s,
                        step_size
                    );
                    self.details.attempts = self.details.attempts.saturating_add(1);
                    step_size = (step_size * MAX_SHRINK).max(min_step);
                    continue;
                }
            };

            if self.fixed_step {
                // Using a fixed step, no adaptive step necessary
                self.details.step = step_size;
                self.details.error = 0.0;
                return Ok((step_size, next_state));
            }

            // Compute the error estimate.
            self.details.error = E::estimate(&error_est, &next_state, &state_vec);
            if self.details.error <= self.prop.opts.tolerance
                || step_size <= min_step
                || self.details.attempts >= self.prop.opts.attempts
            {
                if self.details.attempts >= self.prop.opts.attempts {
                    warn!(
                        "Could not further decrease step size: maximum number of attempts reached ({})",
                        self.details.attempts
                    );
                }

                self.details.step = step_size;
                if self.details.error < self.prop.opts.tolerance {
                    // Error is less than tolerance, let's attempt to increase the step for the next iteration.
                    let proposed_step = if self.details.error > 0.0 {
                        0.9 * step_size
                            * (self.prop.opts.tolerance / self.details.error)
                                .powf(1.0 / f64::from(self.prop.order))
                    } else {
                        f64::INFINITY
                    };
                    step_size = proposed_step.min(MAX_GROWTH * step_size).min(self.max_step);
                }
                // In all cases, let's update the step size to whatever was the adapted step size
                self.step_size = step_size;
                return Ok((self.details.step, next_state));
            } else {
                // Error is too high and we aren't using the smallest step, and we haven't hit the max number of attempts.
                // So let's adapt the step size.
                trace!(
                    "rejected step of {:.3e} m at s = {:.6e} m (error {:.3e})",
                    step_size,
                    self.s,
                    self.details.error
                );
                self.details.attempts += 1;
                let proposed_step = 0.9
                    * step_size
                    * (self.prop.opts.tolerance / self.details.error)
                        .powf(1.0 / f64::from(self.prop.order - 1));
                step_size = proposed_step.max(MAX_SHRINK * step_size).max(min_step);
                // Note that we don't set self.step_size, that will be updated right before we return
            }
        }
    }

    /// Copy the details of the latest integration step.
    pub fn latest_details(&self) -> IntegrationDetails {
        self.details
    }
}
