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

use crate::linalg::{Rotation3, Vector3, Vector6};
use crate::units::LengthUnit;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// The swim state: position `(x, y, z)` followed by the unit direction of motion `(tx, ty, tz)`.
///
/// The position is in whatever length unit the owner of the state works in: meters inside the
/// integrator, the swimmer's external unit in a [`crate::SwimResult`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StateVector(Vector6<f64>);

impl StateVector {
    pub fn new(x: f64, y: f64, z: f64, tx: f64, ty: f64, tz: f64) -> Self {
        Self(Vector6::new(x, y, z, tx, ty, tz))
    }

    pub fn from_parts(position: &Vector3<f64>, direction: &Vector3<f64>) -> Self {
        Self::new(
            position.x,
            position.y,
            position.z,
            direction.x,
            direction.y,
            direction.z,
        )
    }

    pub fn from_vector(vector: Vector6<f64>) -> Self {
        Self(vector)
    }

    /// Return this state as a vector for the propagation
    pub fn as_vector(&self) -> &Vector6<f64> {
        &self.0
    }

    pub fn position(&self) -> Vector3<f64> {
        self.0.fixed_rows::<3>(0).into_owned()
    }

    pub fn direction(&self) -> Vector3<f64> {
        self.0.fixed_rows::<3>(3).into_owned()
    }

    pub fn x(&self) -> f64 {
        self.0[0]
    }

    pub fn y(&self) -> f64 {
        self.0[1]
    }

    pub fn z(&self) -> f64 {
        self.0[2]
    }

    /// Cylindrical radius of the position.
    pub fn rho(&self) -> f64 {
        self.0[0].hypot(self.0[1])
    }

    /// Spherical radius of the position.
    pub fn radius(&self) -> f64 {
        self.position().norm()
    }

    /// Norm of the direction, which should be unity to floating precision.
    pub fn direction_norm(&self) -> f64 {
        self.direction().norm()
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Returns a copy of this state with the position multiplied by `factor` (unit change).
    pub fn scaled(&self, factor: f64) -> Self {
        Self::from_parts(&(self.position() * factor), &self.direction())
    }

    /// Returns this state in another frame, `rotation` mapping the current frame into that one.
    pub fn rotated(&self, rotation: &Rotation3<f64>) -> Self {
        Self::from_parts(&(rotation * self.position()), &(rotation * self.direction()))
    }

    /// Returns a copy of this state with the direction rescaled to unity.
    pub fn normalized(&self) -> Self {
        let dir = self.direction();
        let norm = dir.norm();
        if norm > 0.0 && norm.is_finite() {
            Self::from_parts(&self.position(), &(dir / norm))
        } else {
            *self
        }
    }
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{:.6}, {:.6}, {:.6}] along [{:.6}, {:.6}, {:.6}]",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl fmt::LowerExp for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{:e}, {:e}, {:e}] along [{:e}, {:e}, {:e}]",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

/// Initial conditions of a swim: the charge, the vertex (in the swimmer's external length unit),
/// the momentum magnitude in GeV/c and the polar and azimuthal angles in degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    /// Charge in units of the elementary charge
    pub charge: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Momentum magnitude in GeV/c
    pub momentum: f64,
    /// Polar angle in degrees
    pub theta_deg: f64,
    /// Azimuthal angle in degrees
    pub phi_deg: f64,
}

impl InitialConditions {
    pub fn new(
        charge: i32,
        x: f64,
        y: f64,
        z: f64,
        momentum: f64,
        theta_deg: f64,
        phi_deg: f64,
    ) -> Self {
        Self {
            charge,
            x,
            y,
            z,
            momentum,
            theta_deg,
            phi_deg,
        }
    }

    /// Builds the initial conditions from the Cartesian momentum components (GeV/c).
    pub fn from_momentum(charge: i32, x: f64, y: f64, z: f64, px: f64, py: f64, pz: f64) -> Self {
        let momentum = (px * px + py * py + pz * pz).sqrt();
        Self {
            charge,
            x,
            y,
            z,
            momentum,
            theta_deg: (pz / momentum).acos().to_degrees(),
            phi_deg: py.atan2(px).to_degrees(),
        }
    }

    /// Builds the initial conditions from the track slopes `tx = px/pz` and `ty = py/pz`.
    ///
    /// `direction` is +1 to swim along the track and -1 to swim it backward, in which case the
    /// momentum and the charge are both reversed.
    #[allow(clippy::too_many_arguments)]
    pub fn from_slopes(
        direction: i32,
        charge: i32,
        x: f64,
        y: f64,
        z: f64,
        slope_x: f64,
        slope_y: f64,
        momentum: f64,
    ) -> Self {
        let dir = f64::from(direction.signum());
        let pz = dir * momentum / (slope_x * slope_x + slope_y * slope_y + 1.0).sqrt();
        let mut me = Self::from_momentum(charge, x, y, z, slope_x * pz, slope_y * pz, pz);
        me.charge = direction.signum() * charge;
        me
    }

    /// Vertex position in the external length unit.
    pub fn vertex(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Unit direction of the momentum.
    pub fn direction(&self) -> Vector3<f64> {
        let (sin_theta, cos_theta) = self.theta_deg.to_radians().sin_cos();
        let (sin_phi, cos_phi) = self.phi_deg.to_radians().sin_cos();
        Vector3::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta)
    }

    /// Momentum vector in GeV/c.
    pub fn momentum_vector(&self) -> Vector3<f64> {
        self.momentum * self.direction()
    }

    /// The same track expressed in another frame, `rotation` mapping the current frame into that one.
    pub fn rotated(&self, rotation: &Rotation3<f64>) -> Self {
        let vertex = rotation * self.vertex();
        let direction = rotation * self.direction();
        Self {
            charge: self.charge,
            x: vertex.x,
            y: vertex.y,
            z: vertex.z,
            momentum: self.momentum,
            theta_deg: direction.z.clamp(-1.0, 1.0).acos().to_degrees(),
            phi_deg: direction.y.atan2(direction.x).to_degrees(),
        }
    }

    /// The starting state vector, with the vertex converted from `unit` into meters.
    pub fn state_vector(&self, unit: LengthUnit) -> StateVector {
        StateVector::from_parts(&(self.vertex() * unit.in_meters()), &self.direction())
    }

    /// Returns true if every input is a finite number.
    pub fn is_finite(&self) -> bool {
        [
            self.x,
            self.y,
            self.z,
            self.momentum,
            self.theta_deg,
            self.phi_deg,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

impl fmt::Display for InitialConditions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "q = {:+}, vertex = ({:.5}, {:.5}, {:.5}), p = {:.5} GeV/c, theta = {:.5} deg, phi = {:.5} deg",
            self.charge, self.x, self.y, self.z, self.momentum, self.theta_deg, self.phi_deg
        )
    }
}
