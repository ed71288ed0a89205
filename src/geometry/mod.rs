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
use serde_derive::{Deserialize, Serialize};
use std::fmt;

mod cylinder;
pub use cylinder::*;
mod polyline;
pub use polyline::*;
mod sector;
pub use sector::*;

/// Below this norm, a vector is considered degenerate and cannot define a direction.
pub const DEGENERATE_NORM: f64 = 1e-12;

/// An infinite line through `origin` along the unit vector `dir`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub origin: Vector3<f64>,
    pub dir: Vector3<f64>,
}

impl Line {
    /// Builds a line from a point and a direction, which is normalized. Returns None if the
    /// direction is degenerate.
    pub fn new(origin: Vector3<f64>, dir: Vector3<f64>) -> Option<Self> {
        let norm = dir.norm();
        if norm < DEGENERATE_NORM || !norm.is_finite() || !origin.iter().all(|v| v.is_finite()) {
            None
        } else {
            Some(Self {
                origin,
                dir: dir / norm,
            })
        }
    }

    /// The line through two distinct points, oriented from `p1` to `p2`.
    pub fn through(p1: Vector3<f64>, p2: Vector3<f64>) -> Option<Self> {
        Self::new(p1, p2 - p1)
    }

    /// The z axis.
    pub fn z_axis() -> Self {
        Self {
            origin: Vector3::zeros(),
            dir: Vector3::z(),
        }
    }

    pub fn point_at(&self, t: f64) -> Vector3<f64> {
        self.origin + t * self.dir
    }

    /// Parameter of the point of this line closest to `point`.
    pub fn closest_t(&self, point: &Vector3<f64>) -> f64 {
        (point - self.origin).dot(&self.dir)
    }

    /// Component of `point - origin` perpendicular to this line.
    pub fn perpendicular(&self, point: &Vector3<f64>) -> Vector3<f64> {
        let delta = point - self.origin;
        delta - delta.dot(&self.dir) * self.dir
    }

    /// Distance from `point` to this line.
    pub fn distance(&self, point: &Vector3<f64>) -> f64 {
        self.perpendicular(point).norm()
    }

    /// Signed path length along the ray from `position` along the unit `direction` to its closest
    /// approach to this line. Zero if the ray is parallel to the line.
    pub fn approach_offset(&self, position: &Vector3<f64>, direction: &Vector3<f64>) -> f64 {
        let transverse_dir = direction - direction.dot(&self.dir) * self.dir;
        let transverse = transverse_dir.norm_squared();
        if transverse < DEGENERATE_NORM {
            0.0
        } else {
            -self.perpendicular(position).dot(&transverse_dir) / transverse
        }
    }

    /// The same line with its origin multiplied by `factor` (unit change).
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            origin: self.origin * factor,
            dir: self.dir,
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "line through ({}, {}, {}) along ({:.6}, {:.6}, {:.6})",
            self.origin.x, self.origin.y, self.origin.z, self.dir.x, self.dir.y, self.dir.z
        )
    }
}

/// A plane through `point` with unit `normal`. The normal defines the positive side.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub point: Vector3<f64>,
}

impl Plane {
    /// Builds a plane from a normal (normalized here) and a point on it. Returns None if the
    /// normal is degenerate.
    pub fn new(normal: Vector3<f64>, point: Vector3<f64>) -> Option<Self> {
        let norm = normal.norm();
        if norm < DEGENERATE_NORM || !norm.is_finite() || !point.iter().all(|v| v.is_finite()) {
            None
        } else {
            Some(Self {
                normal: normal / norm,
                point,
            })
        }
    }

    /// Signed distance of `point`, positive on the side the normal points to.
    pub fn signed_distance(&self, point: &Vector3<f64>) -> f64 {
        (point - self.point).dot(&self.normal)
    }

    pub fn distance(&self, point: &Vector3<f64>) -> f64 {
        self.signed_distance(point).abs()
    }

    /// Path length along the ray from `origin` along unit `dir` to this plane, if it is ahead.
    pub fn ray_intersection(&self, origin: &Vector3<f64>, dir: &Vector3<f64>) -> Option<f64> {
        let denom = dir.dot(&self.normal);
        if denom.abs() < DEGENERATE_NORM {
            return None;
        }
        let t = -self.signed_distance(origin) / denom;
        (t >= 0.0).then_some(t)
    }

    /// The same plane with its point multiplied by `factor` (unit change).
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            normal: self.normal,
            point: self.point * factor,
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "plane through ({}, {}, {}) with normal ({:.6}, {:.6}, {:.6})",
            self.point.x, self.point.y, self.point.z, self.normal.x, self.normal.y, self.normal.z
        )
    }
}
