/// Vehicles: everything that moves along a lane.
///
/// Logs are carriers the player can ride. A predator head looks like a
/// log but bites. Cars only ever hurt.

/// Half the player's footprint along x, in cells.
pub const PLAYER_HALF_WIDTH: f32 = 0.4;

/// How far past either edge a vehicle travels before wrapping. Shared by
/// every vehicle so a lane keeps its spacing forever.
pub const WRAP_MARGIN: f32 = 2.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VehicleKind {
    Car,
    Log,
    PredatorHead,
}

impl VehicleKind {
    /// Can the player attach to and ride this vehicle?
    pub fn is_carrier(self) -> bool {
        matches!(self, VehicleKind::Log)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct VehicleId(pub usize);

#[derive(Clone, Debug)]
pub struct Vehicle {
    pub id: VehicleId,
    pub kind: VehicleKind,
    pub row: i32,
    /// Center x in world units; 0 is the middle of the board.
    pub x: f32,
    pub len: f32,
    /// World units per second along x.
    pub velocity: f32,
}

impl Vehicle {
    pub fn new(id: VehicleId, kind: VehicleKind, row: i32, x: f32, len: f32, velocity: f32) -> Self {
        Vehicle { id, kind, row, x, len, velocity }
    }

    /// Move by `velocity * dt` and wrap once past either edge.
    pub fn advance(&mut self, dt: f32, world_width: f32) {
        self.x += self.velocity * dt;
        let limit = world_width / 2.0 + WRAP_MARGIN;
        let span = 2.0 * limit;
        if self.x > limit {
            self.x -= span;
        } else if self.x < -limit {
            self.x += span;
        }
    }

    pub fn left(&self) -> f32 { self.x - self.len / 2.0 }
    pub fn right(&self) -> f32 { self.x + self.len / 2.0 }

    /// Does a player standing at `(px, row)` touch this vehicle?
    pub fn overlaps(&self, px: f32, row: i32) -> bool {
        row == self.row
            && px + PLAYER_HALF_WIDTH > self.left()
            && px - PLAYER_HALF_WIDTH < self.right()
    }
}
