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

use super::Line;
use crate::linalg::Vector3;
use crate::md::trajectory::Traj;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// The broken line through the successive positions of a trajectory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Vector3<f64>>,
}

impl Polyline {
    /// Returns None unless there are at least two finite points, not all identical.
    pub fn new(points: Vec<Vector3<f64>>) -> Option<Self> {
        let me = Self { points };
        me.is_well_formed().then_some(me)
    }

    /// The polyline through the positions of a trajectory, in the length unit of that trajectory.
    pub fn from_traj(traj: &Traj) -> Option<Self> {
        Self::new(traj.iter().map(|sample| sample.state.position()).collect())
    }

    pub fn is_well_formed(&self) -> bool {
        self.points.len() >= 2
            && self.points.iter().flatten().all(|v| v.is_finite())
            && self.segments().next().is_some()
    }

    /// The non degenerate segments, as lines from their start point with their length.
    fn segments(&self) -> impl Iterator<Item = (Line, f64)> + '_ {
        self.points.windows(2).filter_map(|pair| {
            Line::through(pair[0], pair[1]).map(|line| (line, (pair[1] - pair[0]).norm()))
        })
    }

    /// The point of this polyline closest to `point`, and the segment it lies on.
    pub fn closest(&self, point: &Vector3<f64>) -> Option<(Vector3<f64>, Line)> {
        self.segments()
            .map(|(line, length)| {
                let closest = line.point_at(line.closest_t(point).clamp(0.0, length));
                ((closest - point).norm_squared(), closest, line)
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, closest, line)| (closest, line))
    }

    /// Distance from `point` to this polyline, infinite if it has no segment.
    pub fn distance(&self, point: &Vector3<f64>) -> f64 {
        self.closest(point)
            .map_or(f64::INFINITY, |(closest, _)| (closest - point).norm())
    }

    /// The same polyline with all its points multiplied by `factor` (unit change).
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            points: self.points.iter().map(|p| p * factor).collect(),
        }
    }
}

impl fmt::Display for Polyline {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "polyline of {} points", self.points.len())
    }
}
