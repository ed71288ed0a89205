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


use crate::linalg::Vector3;
use std::fmt;
use std::sync::Arc;

/// A magnetic field probe.
///
/// The probe is queried at a position in **centimeters** and returns the field in **kilogauss**.
/// Implementations must be safe to share across threads because batch swims query the same
/// probe concurrently.
pub trait FieldProbe: Send + Sync {
    /// Field in kG at `(x, y, z)` given in cm.
    fn field(&self, x: f64, y: f64, z: f64) -> Vector3<f64>;

    /// Field in kG at the position vector given in cm.
    fn field_at(&self, position_cm: &Vector3<f64>) -> Vector3<f64> {
        self.field(position_cm.x, position_cm.y, position_cm.z)
    }
}

impl<F: FieldProbe + ?Sized> FieldProbe for &F {
    fn field(&self, x: f64, y: f64, z: f64) -> Vector3<f64> {
        (**self).field(x, y, z)
    }
}

impl<F: FieldProbe + ?Sized> FieldProbe for Arc<F> {
    fn field(&self, x: f64, y: f64, z: f64) -> Vector3<f64> {
        (**self).field(x, y, z)
    }
}

impl<F: FieldProbe + ?Sized> FieldProbe for Box<F> {
    fn field(&self, x: f64, y: f64, z: f64) -> Vector3<f64> {
        (**self).field(x, y, z)
    }
}

/// No field at all: tracks are straight lines.
#[derive(Copy, Clone, Debug, Default)]
pub struct ZeroField;

impl FieldProbe for ZeroField {
    fn field(&self, _x: f64, _y: f64, _z: f64) -> Vector3<f64> {
        Vector3::zeros()
    }
}

impl fmt::Display for ZeroField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "zero field")
    }
}

/// A field which is the same everywhere.
#[derive(Copy, Clone, Debug)]
pub struct UniformField {
    /// Field in kG
    pub b: Vector3<f64>,
}

impl UniformField {
    pub fn new(bx: f64, by: f64, bz: f64) -> Self {
        Self {
            b: Vector3::new(bx, by, bz),
        }
    }

    /// A uniform field along +z of `bz` kG.
    pub fn solenoidal(bz: f64) -> Self {
        Self::new(0.0, 0.0, bz)
    }
}

impl FieldProbe for UniformField {
    fn field(&self, _x: f64, _y: f64, _z: f64) -> Vector3<f64> {
        self.b
    }
}

impl fmt::Display for UniformField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "uniform field [{}, {}, {}] kG",
            self.b.x, self.b.y, self.b.z
        )
    }
}

/// An ideal solenoid centered on the origin with its axis along z: a uniform `bz` inside the
/// cylinder of radius `radius_cm` and half length `half_length_cm`, and nothing outside.
#[derive(Copy, Clone, Debug)]
pub struct SolenoidField {
    /// Field in kG inside the solenoid
    pub bz: f64,
    pub radius_cm: f64,
    pub half_length_cm: f64,
}

impl SolenoidField {
    pub fn new(bz: f64, radius_cm: f64, half_length_cm: f64) -> Self {
        Self {
            bz,
            radius_cm,
            half_length_cm,
        }
    }

    pub fn contains(&self, x: f64, y: f64, z: f64) -> bool {
        x.hypot(y) <= self.radius_cm && z.abs() <= self.half_length_cm
    }
}

impl FieldProbe for SolenoidField {
    fn field(&self, x: f64, y: f64, z: f64) -> Vector3<f64> {
        if self.contains(x, y, z) {
            Vector3::new(0.0, 0.0, self.bz)
        } else {
            Vector3::zeros()
        }
    }
}

impl fmt::Display for SolenoidField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "solenoid of {} kG (r = {} cm, |z| <= {} cm)",
            self.bz, self.radius_cm, self.half_length_cm
        )
    }
}

/// Wraps any closure of `(x, y, z)` in cm returning the field in kG.
#[derive(Clone)]
pub struct FnField<G>(pub G)
where
    G: Fn(f64, f64, f64) -> Vector3<f64> + Send + Sync;

impl<G> FieldProbe for FnField<G>
where
    G: Fn(f64, f64, f64) -> Vector3<f64> + Send + Sync,
{
    fn field(&self, x: f64, y: f64, z: f64) -> Vector3<f64> {
        (self.0)(x, y, z)
    }
}
