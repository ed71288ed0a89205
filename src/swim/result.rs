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
use crate::md::trajectory::Traj;
use crate::state::StateVector;
use crate::units::LengthUnit;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a swim. None of these are errors: faults are reported as [`crate::SwimError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwimStatus {
    /// The target was reached within the accuracy, or the full path length was travelled when
    /// swimming without a target.
    Success,
    /// The track did not cross the target within the maximum path length.
    TargetMissed,
    /// The crossing was bracketed, but the bracket collapsed before the accuracy was met. The
    /// result holds the closest point found.
    AccuracyNotAchieved,
    /// The initial conditions were rejected before any integration.
    Unphysical,
}

impl fmt::Display for SwimStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            Self::Success => "success",
            Self::TargetMissed => "target missed",
            Self::AccuracyNotAchieved => "accuracy not achieved",
            Self::Unphysical => "unphysical initial conditions",
        };
        write!(f, "{msg}")
    }
}

/// The result of a swim, in the external length unit of the swimmer.
#[derive(Clone, Debug, PartialEq)]
pub struct SwimResult {
    pub status: SwimStatus,
    /// Charge of the track, in e
    pub charge: i32,
    /// Final position
    pub position: Vector3<f64>,
    /// Final unit direction
    pub direction: Vector3<f64>,
    /// Final momentum, in GeV/c
    pub momentum: Vector3<f64>,
    /// Path length travelled
    pub path_length: f64,
    /// Line integral of the field transverse to the path, in tesla times the length unit
    pub field_integral: Option<f64>,
    /// Distance from the final position to the target, if there is a target
    pub distance_to_target: Option<f64>,
    /// Number of refinement passes used to localize the crossing
    pub refinements: usize,
    /// Number of accepted integration steps, including the discarded ones
    pub steps: usize,
    /// Distance to the target at the start of each crossing bracket
    pub refinement_residuals: Vec<f64>,
    /// The trajectory, if the swimmer keeps it
    pub trajectory: Option<Traj>,
    /// Length unit of every length in this result
    pub unit: LengthUnit,
}

impl SwimResult {
    pub fn is_success(&self) -> bool {
        self.status == SwimStatus::Success
    }

    /// Final state, in the external length unit.
    pub fn final_state(&self) -> StateVector {
        StateVector::from_parts(&self.position, &self.direction)
    }

    /// Final `[x, y, z, px, py, pz, s, ∫|t × B| ds]`, with a zero field integral if it was not computed.
    pub fn to_array8(&self) -> [f64; 8] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.momentum.x,
            self.momentum.y,
            self.momentum.z,
            self.path_length,
            self.field_integral.unwrap_or(0.0),
        ]
    }

    /// This result in another frame, `rotation` mapping the frame of the swim into that one.
    ///
    /// Lengths, distances and the field integral do not depend on the frame.
    pub fn rotated(&self, rotation: &Rotation3<f64>) -> Self {
        Self {
            position: rotation * self.position,
            direction: rotation * self.direction,
            momentum: rotation * self.momentum,
            trajectory: self.trajectory.as_ref().map(|traj| traj.rotated(rotation)),
            refinement_residuals: self.refinement_residuals.clone(),
            ..*self
        }
    }

    /// Polar and azimuthal angles of the final direction, in degrees.
    pub fn angles_deg(&self) -> (f64, f64) {
        (
            self.direction.z.clamp(-1.0, 1.0).acos().to_degrees(),
            self.direction.y.atan2(self.direction.x).to_degrees(),
        )
    }
}

impl fmt::Display for SwimResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let u = self.unit;
        write!(
            f,
            "{} at ({:.6}, {:.6}, {:.6}) {u} with p = ({:.6}, {:.6}, {:.6}) GeV/c after s = {:.6} {u} ({} steps, {} refinements)",
            self.status,
            self.position.x,
            self.position.y,
            self.position.z,
            self.momentum.x,
            self.momentum.y,
            self.momentum.z,
            self.path_length,
            self.steps,
            self.refinements
        )?;
        if let Some(bdl) = self.field_integral {
            write!(f, ", Bdl = {bdl:.6} T {u}")?;
        }
        if let Some(dist) = self.distance_to_target {
            write!(f, ", {dist:.3e} {u} from the target")?;
        }
        Ok(())
    }
}
