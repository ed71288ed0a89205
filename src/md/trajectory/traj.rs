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


use super::{EmptySnafu, NoInterpolationDataSnafu, TrajError};
use crate::field::FieldProbe;
use crate::linalg::{Rotation3, Vector3};
use crate::state::StateVector;
use crate::units::{LengthUnit, CENTIMETERS_PER_METER};
use snafu::ensure;
use std::fmt;

/// One sample of a trajectory: the path length and the state at that path length.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrajSample {
    pub s: f64,
    pub state: StateVector,
}

/// Store the trajectory of a swim, i.e. states ordered by strictly increasing path length.
///
/// The path length and the positions share the same length unit, `unit`. Trajectories built by
/// the swimmer are in meters until they are handed out with [`Traj::to_external`].
#[derive(Clone, Debug, PartialEq)]
pub struct Traj {
    /// Optionally name this trajectory
    pub name: Option<String>,
    /// Length unit of the path length and of the positions
    pub unit: LengthUnit,
    samples: Vec<TrajSample>,
}

impl Default for Traj {
    fn default() -> Self {
        Self::new()
    }
}

impl Traj {
    /// A new empty trajectory in meters.
    pub fn new() -> Self {
        Self {
            name: None,
            unit: LengthUnit::Meter,
            samples: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            name: None,
            unit: LengthUnit::Meter,
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Appends a sample, whose path length must be greater than that of the last sample.
    pub fn push(&mut self, s: f64, state: StateVector) -> Result<(), TrajError> {
        if let Some(last) = self.samples.last() {
            if s <= last.s || !s.is_finite() {
                return Err(TrajError::NonMonotonicPathLength { prev: last.s, next: s });
            }
        }
        self.samples.push(TrajSample { s, state });
        Ok(())
    }

    /// Removes and returns the last sample.
    pub fn remove_last(&mut self) -> Option<TrajSample> {
        self.samples.pop()
    }

    /// Drops every sample past the path length `s`.
    pub fn truncate_after(&mut self, s: f64) {
        let keep = self.samples.partition_point(|sample| sample.s <= s);
        self.samples.truncate(keep);
    }

    /// Returns the last sample of this trajectory
    pub fn last(&self) -> Option<&TrajSample> {
        self.samples.last()
    }

    /// Path length of the last sample.
    pub fn last_path_length(&self) -> Result<f64, TrajError> {
        self.samples.last().map(|sample| sample.s).ok_or(TrajError::Empty)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[TrajSample] {
        &self.samples
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrajSample> {
        self.samples.iter()
    }

    /// Evaluate the trajectory at this specific path length.
    ///
    /// The position is a cubic Hermite interpolation between the two bracketing samples, using
    /// the directions as the derivatives of the position with respect to the path length. The
    /// direction is the normalized derivative of that interpolant.
    pub fn at(&self, s: f64) -> Result<StateVector, TrajError> {
        ensure!(!self.samples.is_empty(), EmptySnafu);
        let first = self.samples[0];
        let last = self.samples[self.samples.len() - 1];
        ensure!(
            s.is_finite() && s >= first.s && s <= last.s,
            NoInterpolationDataSnafu { s }
        );

        // Index of the first sample at or after s
        let idx = self.samples.partition_point(|sample| sample.s < s);
        let right = self.samples[idx];
        if right.s == s {
            // Oh wow, we actually had this exact state!
            return Ok(right.state);
        }
        let left = self.samples[idx - 1];

        let h = right.s - left.s;
        let tau = (s - left.s) / h;
        let (p0, m0) = (left.state.position(), left.state.direction());
        let (p1, m1) = (right.state.position(), right.state.direction());

        let tau2 = tau * tau;
        let tau3 = tau2 * tau;
        let h00 = 2.0 * tau3 - 3.0 * tau2 + 1.0;
        let h10 = tau3 - 2.0 * tau2 + tau;
        let h01 = -2.0 * tau3 + 3.0 * tau2;
        let h11 = tau3 - tau2;
        let position = h00 * p0 + h10 * h * m0 + h01 * p1 + h11 * h * m1;

        let dh00 = 6.0 * tau2 - 6.0 * tau;
        let dh10 = 3.0 * tau2 - 4.0 * tau + 1.0;
        let dh01 = -6.0 * tau2 + 6.0 * tau;
        let dh11 = 3.0 * tau2 - 2.0 * tau;
        let derivative = (dh00 * p0 + dh01 * p1) / h + dh10 * m0 + dh11 * m1;

        Ok(StateVector::from_parts(&position, &derivative).normalized())
    }

    /// Line integral of the field component transverse to the path, `∫|t × B| ds`, by the
    /// trapezoidal rule over the samples. Returned in kilogauss times the unit of this trajectory.
    pub fn field_integral<F: FieldProbe>(&self, probe: &F) -> Result<f64, TrajError> {
        ensure!(!self.samples.is_empty(), EmptySnafu);
        let to_cm = self.unit.in_meters() * CENTIMETERS_PER_METER;
        let transverse = |state: &StateVector| -> f64 {
            let b: Vector3<f64> = probe.field_at(&(state.position() * to_cm));
            state.direction().cross(&b).norm()
        };

        let mut bdl = 0.0;
        let mut prev = transverse(&self.samples[0].state);
        for pair in self.samples.windows(2) {
            let next = transverse(&pair[1].state);
            bdl += 0.5 * (prev + next) * (pair[1].s - pair[0].s);
            prev = next;
        }
        Ok(bdl)
    }

    /// Converts this trajectory, which must be in meters, into the provided unit.
    pub fn to_external(&self, unit: LengthUnit) -> Self {
        let factor = self.unit.in_meters() / unit.in_meters();
        Self {
            name: self.name.clone(),
            unit,
            samples: self
                .samples
                .iter()
                .map(|sample| TrajSample {
                    s: sample.s * factor,
                    state: sample.state.scaled(factor),
                })
                .collect(),
        }
    }

    /// This trajectory in another frame, `rotation` mapping the current frame into that one.
    pub fn rotated(&self, rotation: &Rotation3<f64>) -> Self {
        Self {
            name: self.name.clone(),
            unit: self.unit,
            samples: self
                .samples
                .iter()
                .map(|sample| TrajSample {
                    s: sample.s,
                    state: sample.state.rotated(rotation),
                })
                .collect(),
        }
    }
}

impl fmt::Display for Traj {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.samples.is_empty() {
            return write!(f, "Empty Trajectory!");
        }
        let name = self.name.as_deref().unwrap_or("Trajectory");
        write!(
            f,
            "{name} from s = {} to s = {} {} ({} samples)",
            self.samples[0].s,
            self.samples[self.samples.len() - 1].s,
            self.unit,
            self.samples.len()
        )
    }
}
