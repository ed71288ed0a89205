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


use super::{Line, DEGENERATE_NORM};
use crate::linalg::Vector3;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// An infinite right circular cylinder around `axis`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    pub axis: Line,
    pub radius: f64,
}

impl Cylinder {
    pub fn new(axis: Line, radius: f64) -> Self {
        Self { axis, radius }
    }

    /// The cylinder whose axis goes through the two provided points.
    pub fn from_axis_points(p1: Vector3<f64>, p2: Vector3<f64>, radius: f64) -> Option<Self> {
        Line::through(p1, p2).map(|axis| Self::new(axis, radius))
    }

    /// A cylinder around the z axis, i.e. a surface of constant rho.
    pub fn around_z(radius: f64) -> Self {
        Self::new(Line::z_axis(), radius)
    }

    /// Distance to the axis minus the radius: negative inside, positive outside.
    pub fn signed_distance(&self, point: &Vector3<f64>) -> f64 {
        self.axis.distance(point) - self.radius
    }

    pub fn distance(&self, point: &Vector3<f64>) -> f64 {
        self.signed_distance(point).abs()
    }

    /// Path length along the ray from `origin` along the unit `dir` to the nearest intersection
    /// with this cylinder which is not behind the origin.
    ///
    /// Only the components perpendicular to the axis matter: with `w` the perpendicular offset of
    /// the origin and `d` the perpendicular part of the direction, this solves `|w + t d| = R`.
    pub fn ray_intersection(&self, origin: &Vector3<f64>, dir: &Vector3<f64>) -> Option<f64> {
        let w = self.axis.perpendicular(origin);
        let d = dir - dir.dot(&self.axis.dir) * self.axis.dir;

        let a = d.norm_squared();
        if a < DEGENERATE_NORM * DEGENERATE_NORM {
            // Moving parallel to the axis
            return None;
        }
        let b = 2.0 * w.dot(&d);
        let c = w.norm_squared() - self.radius * self.radius;

        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        // Numerically stable pair of roots
        let q = -0.5 * (b + b.signum() * sqrt_disc);
        let (mut t1, mut t2) = if q == 0.0 {
            let t = (-c / a).max(0.0).sqrt();
            (-t, t)
        } else {
            (q / a, c / q)
        };
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }

        if t1 >= 0.0 {
            Some(t1)
        } else if t2 >= 0.0 {
            Some(t2)
        } else {
            None
        }
    }

    /// The same cylinder with all lengths multiplied by `factor` (unit change).
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            axis: self.axis.scaled(factor),
            radius: self.radius * factor,
        }
    }
}

impl fmt::Display for Cylinder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "cylinder of radius {} around the {}", self.radius, self.axis)
    }
}
