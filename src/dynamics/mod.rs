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


use crate::linalg::Vector6;
use snafu::Snafu;

/// Equations of motion of a charged track in a magnetic field, parameterized by path length.
pub mod lorentz;
pub use self::lorentz::*;

/// A trait for models with equations of motion that can be integrated along the path length.
///
/// The state vector is the position (internal length unit) followed by the unit direction.
/// Implementations must be pure functions of their inputs: the same dynamics are shared by
/// concurrent swims.
pub trait Dynamics: Send + Sync {
    /// Defines the equations of motion.
    ///
    /// - `delta_s`: Path length past the start of the current step, in meters.
    /// - `state_vec`: The state vector, which changes at each integration stage.
    fn eom(&self, delta_s: f64, state_vec: &Vector6<f64>) -> Result<Vector6<f64>, DynamicsError>;

    /// Performs final changes after each successful integration step.
    ///
    /// Also called before the first integration step to update the initial state if needed.
    fn finally(&self, next_state: Vector6<f64>) -> Result<Vector6<f64>, DynamicsError> {
        Ok(next_state)
    }
}

/// Dynamical model errors.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DynamicsError {
    /// The field probe returned a NaN or infinite component.
    #[snafu(display("field probe returned a non-finite field at ({x}, {y}, {z}) cm"))]
    NonFiniteField { x: f64, y: f64, z: f64 },
    #[snafu(display("equations of motion are not finite {delta_s} m into the step"))]
    NonFiniteDerivative { delta_s: f64 },
    #[snafu(display("direction vector vanished and cannot be normalized"))]
    DegenerateDirection,
}
