use super::{Direction, Vehicle};

/// Gap reported when there is nobody ahead.
pub const NO_LEADER_GAP: f32 = f32::INFINITY;

/// Vehicles of one direction, front-most first. Built fresh from current
/// positions whenever it is needed.
#[derive(Debug, Clone)]
pub struct Lane {
    pub direction: Direction,
    /// Indices into the vehicle list.
    pub members: Vec<usize>,
}

impl Lane {
    pub fn build(direction: Direction, vehicles: &[Vehicle]) -> Self {
        let mut members: Vec<usize> = vehicles
            .iter()
            .enumerate()
            .filter(|(_, v)| v.direction == direction)
            .map(|(i, _)| i)
            .collect();

        // Ties are broken by id so the order never depends on insertion history
        members.sort_by(|&a, &b| {
            let (va, vb) = (&vehicles[a], &vehicles[b]);
            vb.position.total_cmp(&va.position).then(va.id.cmp(&vb.id))
        });

        Self { direction, members }
    }

    pub fn build_all(vehicles: &[Vehicle]) -> Vec<Lane> {
        Direction::ALL
            .iter()
            .map(|&direction| Lane::build(direction, vehicles))
            .filter(|lane| !lane.is_empty())
            .collect()
    }

    /// Index of the vehicle directly ahead of the one at `rank`.
    pub fn leader_of(&self, rank: usize) -> Option<usize> {
        rank.checked_sub(1).map(|ahead| self.members[ahead])
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Front-to-back clearance once both half-footprints are taken off.
pub fn clearance(follower: &Vehicle, leader: &Vehicle) -> f32 {
    leader.rear() - follower.front()
}

/// Clearance to whatever is ahead, or [`NO_LEADER_GAP`] on an open lane.
pub fn gap_ahead(follower: &Vehicle, leader: Option<&Vehicle>) -> f32 {
    leader.map_or(NO_LEADER_GAP, |leader| clearance(follower, leader))
}
