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

use crate::linalg::{Rotation3, Vector3};
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Azimuthal width of a detector sector, in degrees. Sector 1 is centered on the +x axis.
pub const SECTOR_WIDTH_DEG: f64 = 60.0;

/// Tilt of the sector frame about its y axis, in degrees.
pub const SECTOR_TILT_DEG: f64 = 25.0;

/// One of the six detector sectors, numbered from 1.
///
/// The tilted sector frame of a sector has its z axis in the sector midplane, tilted away from
/// the beamline by [`SECTOR_TILT_DEG`], and its y axis perpendicular to that midplane.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector(u8);

impl Sector {
    pub const COUNT: u8 = 6;

    /// Returns None unless `sector` is in 1 to 6.
    pub fn new(sector: u8) -> Option<Self> {
        (1..=Self::COUNT).contains(&sector).then_some(Self(sector))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Rotation from the tilted sector frame into the lab frame.
    pub fn rotation(self) -> Rotation3<f64> {
        let phi = f64::from(self.0 - 1) * SECTOR_WIDTH_DEG.to_radians();
        Rotation3::from_axis_angle(&Vector3::z_axis(), phi)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), SECTOR_TILT_DEG.to_radians())
    }

    /// Converts a vector from the tilted sector frame into the lab frame.
    pub fn to_lab(self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation() * v
    }

    /// Converts a lab frame vector into the tilted sector frame.
    pub fn from_lab(self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation().inverse() * v
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "sector {}", self.0)
    }
}
