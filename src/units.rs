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

use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Momentum (GeV/c) of a unit charge on a 1 m radius of curvature in a 1 T field.
pub const SPEED_OF_LIGHT_GEV_PER_TESLA_METER: f64 = 0.299_792_458;

/// Field probes return kilogauss, the curvature wants tesla.
pub const KILOGAUSS_TO_TESLA: f64 = 0.1;

/// Field probes are queried in centimeters while the integrator works in meters.
pub const CENTIMETERS_PER_METER: f64 = 100.0;

/// Curvature per unit charge, per kilogauss, per GeV/c, in 1/m.
pub const CURVATURE_PER_KILOGAUSS: f64 = SPEED_OF_LIGHT_GEV_PER_TESLA_METER * KILOGAUSS_TO_TESLA;

/// The external length unit of a swimmer. Internally, the integrator always works in meters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthUnit {
    Meter,
    #[default]
    Centimeter,
    Millimeter,
}

impl LengthUnit {
    /// Length of one of this unit, in meters.
    pub const fn in_meters(self) -> f64 {
        match self {
            Self::Meter => 1.0,
            Self::Centimeter => 0.01,
            Self::Millimeter => 0.001,
        }
    }

    /// Converts a length in this unit into meters.
    pub fn to_internal(self, value: f64) -> f64 {
        value * self.in_meters()
    }

    /// Converts a length in meters into this unit.
    pub fn from_internal(self, value_m: f64) -> f64 {
        value_m / self.in_meters()
    }

    /// Converts a field line integral accumulated in kG·m into T times this unit.
    pub fn field_integral_from_internal(self, bdl_kg_m: f64) -> f64 {
        self.from_internal(bdl_kg_m * KILOGAUSS_TO_TESLA)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Meter => "m",
            Self::Centimeter => "cm",
            Self::Millimeter => "mm",
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[test]
fn length_unit_conversions() {
    use approx::assert_relative_eq;

    assert_relative_eq!(LengthUnit::Centimeter.to_internal(250.0), 2.5);
    assert_relative_eq!(LengthUnit::Millimeter.from_internal(2.5), 2500.0);
    assert_relative_eq!(LengthUnit::Meter.to_internal(3.0), 3.0);
    // 1 kG·m is 10 T·cm
    assert_relative_eq!(
        LengthUnit::Centimeter.field_integral_from_internal(1.0),
        10.0,
        epsilon = 1e-12
    );
    assert_eq!(LengthUnit::default(), LengthUnit::Centimeter);
    assert_eq!(format!("{}", LengthUnit::Millimeter), "mm");
}
