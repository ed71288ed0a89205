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


use super::{CrossingDirection, SwimEvent};
use crate::state::StateVector;
use std::fmt;

/// Phase of a swim toward a target.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SwimPhase {
    /// Integrating toward the target, no crossing seen yet
    Integrating,
    /// The last accepted step went past the target
    Crossed,
    /// Integrating within a bracket around the crossing
    Refining,
    /// The target was reached, or the bracket could not be refined any further
    Done,
    /// The maximum path length was reached without a crossing
    Exhausted,
}

impl fmt::Display for SwimPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Tracks the side of the target on which a swim currently is, and detects the crossings.
///
/// The reference side is recorded at the start of every integration segment. A sign change of
/// the event function which is not in the allowed direction replaces the reference side instead
/// of counting as a crossing.
pub struct BoundaryTracker<'a, E: SwimEvent + ?Sized> {
    pub event: &'a E,
    pub accuracy: f64,
    reference_sign: f64,
    phase: SwimPhase,
    refinements: usize,
}

/// Sign convention of the event function: zero is on the positive side.
fn side(value: f64) -> f64 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

impl<'a, E: SwimEvent + ?Sized> BoundaryTracker<'a, E> {
    /// Starts tracking from the initial state of a swim.
    pub fn new(event: &'a E, accuracy: f64, initial: &StateVector) -> Self {
        Self {
            event,
            accuracy,
            reference_sign: side(event.eval(initial)),
            phase: SwimPhase::Integrating,
            refinements: 0,
        }
    }

    pub fn phase(&self) -> SwimPhase {
        self.phase
    }

    /// Number of refinement segments started so far.
    pub fn refinements(&self) -> usize {
        self.refinements
    }

    /// Records the reference side at the start of a new integration segment. If a crossing was
    /// being handled, this segment is a refinement within the bracket.
    pub fn begin_segment(&mut self, state: &StateVector) {
        self.reference_sign = side(self.event.eval(state));
        if self.phase == SwimPhase::Crossed {
            self.refinements += 1;
            self.phase = SwimPhase::Refining;
        }
    }

    /// Observes an accepted state and returns true if it lies past the target.
    pub fn observe(&mut self, state: &StateVector) -> bool {
        let sign = side(self.event.eval(state));
        if sign == self.reference_sign {
            return false;
        }
        let allowed = match self.event.crossing_direction() {
            CrossingDirection::Any => true,
            CrossingDirection::Increasing => sign > 0.0,
            CrossingDirection::Decreasing => sign < 0.0,
        };
        if allowed {
            self.phase = SwimPhase::Crossed;
            true
        } else {
            trace!("{} crossed in the ignored direction", self.event);
            self.reference_sign = sign;
            false
        }
    }

    /// Returns true if the state is within the accuracy of the target.
    pub fn accuracy_reached(&self, state: &StateVector) -> bool {
        self.event.distance_to_target(state) < self.accuracy
    }

    pub fn distance(&self, state: &StateVector) -> f64 {
        self.event.distance_to_target(state)
    }

    pub fn finish(&mut self) {
        self.phase = SwimPhase::Done;
    }

    pub fn exhaust(&mut self) {
        self.phase = SwimPhase::Exhausted;
    }
}
