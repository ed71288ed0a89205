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


use super::{DegenerateDirectionSnafu, Dynamics, DynamicsError};
use crate::field::FieldProbe;
use crate::linalg::{Vector3, Vector6};
use crate::units::{CENTIMETERS_PER_METER, CURVATURE_PER_KILOGAUSS};
use snafu::ensure;
use std::fmt;

/// `LorentzDynamics` provides the equations of motion of a charged track in a static magnetic field.
///
/// The state is `(x, y, z, tx, ty, tz)` with the position in meters and `t` the unit direction.
/// With `s` the path length, `dr/ds = t` and `dt/ds = α (t × B)` where `α = q c / p`, which is
/// `q · 0.0299792458 / p` per meter per kilogauss for `p` in GeV/c.
#[derive(Clone)]
pub struct LorentzDynamics<F: FieldProbe> {
    pub probe: F,
    charge: i32,
    momentum: f64,
    alpha: f64,
}

impl<F: FieldProbe> LorentzDynamics<F> {
    /// Initialize the dynamics of a track of `charge` (in e) and `momentum` (in GeV/c).
    pub fn new(probe: F, charge: i32, momentum: f64) -> Self {
        Self {
            probe,
            charge,
            momentum,
            alpha: f64::from(charge) * CURVATURE_PER_KILOGAUSS / momentum,
        }
    }

    /// Field in kG at a position given in meters.
    pub fn field_kg(&self, position_m: &Vector3<f64>) -> Result<Vector3<f64>, DynamicsError> {
        let pos_cm = position_m * CENTIMETERS_PER_METER;
        let b = self.probe.field_at(&pos_cm);
        if b.iter().all(|v| v.is_finite()) {
            Ok(b)
        } else {
            Err(DynamicsError::NonFiniteField {
                x: pos_cm.x,
                y: pos_cm.y,
                z: pos_cm.z,
            })
        }
    }
}

impl<F: FieldProbe> fmt::Display for LorentzDynamics<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Lorentz dynamics of q = {:+} at p = {} GeV/c",
            self.charge, self.momentum
        )
    }
}

impl<F: FieldProbe> Dynamics for LorentzDynamics<F> {
    fn eom(&self, delta_s: f64, state_vec: &Vector6<f64>) -> Result<Vector6<f64>, DynamicsError> {
        let position = state_vec.fixed_rows::<3>(0).into_owned();
        let direction = state_vec.fixed_rows::<3>(3).into_owned();

        let d_direction = if self.charge == 0 {
            Vector3::zeros()
        } else {
            self.alpha * direction.cross(&self.field_kg(&position)?)
        };

        let d_x = Vector6::new(
            direction.x,
            direction.y,
            direction.z,
            d_direction.x,
            d_direction.y,
            d_direction.z,
        );

        if d_x.iter().all(|v| v.is_finite()) {
            Ok(d_x)
        } else {
            Err(DynamicsError::NonFiniteDerivative { delta_s })
        }
    }

    /// Rescales the direction to unity, which the integrator only preserves to its tolerance.
    fn finally(&self, next_state: Vector6<f64>) -> Result<Vector6<f64>, DynamicsError> {
        let direction = next_state.fixed_rows::<3>(3).into_owned();
        let norm = direction.norm();
        ensure!(norm > 0.0 && norm.is_finite(), DegenerateDirectionSnafu);
        let mut state = next_state;
        state.fixed_rows_mut::<3>(3).copy_from(&(direction / norm));
        Ok(state)
    }
}
