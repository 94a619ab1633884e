/// WorldState: the complete snapshot of a running game.
///
/// ## Board vs. session
///
///   - `Board`      — lanes, width, and the vehicles moving along them.
///                    It is the `Field` the player queries each tick.
///   - `WorldState` — board + player + phase + camera. It receives the
///                    player's flow signals as the `GameSession`.
///
/// Keeping the board in its own struct lets the player borrow it while
/// the player itself is borrowed mutably.
///
/// ## Traffic
///
/// Rows are populated lazily. A row's vehicles appear the first time the
/// player advances within `LOOKAHEAD` rows of it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::{BoardConfig, ConfigError, GameConfig};
use crate::domain::lane::{LaneMap, RowClassifier, RowKind};
use crate::domain::player::{Field, Player};
use crate::domain::vehicle::{Vehicle, VehicleId, VehicleKind, WRAP_MARGIN};
use crate::sim::event::{GameSession, PlayerEvent};

/// Rows above the player that already carry traffic.
pub const LOOKAHEAD: i32 = 4;

/// Chance that a water row hides a predator at the front of one log.
const PREDATOR_CHANCE: f64 = 0.3;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    Victory,
    GameOver,
}

/// Camera: which rows are on screen.
///
/// `bottom` is the lowest visible row, `view_rows` how many fit.
/// Set from terminal size during `render()`.
#[derive(Clone, Debug)]
pub struct Camera {
    pub bottom: i32,
    pub view_rows: usize,
}

impl Camera {
    pub fn new() -> Self {
        Camera { bottom: 0, view_rows: 0 }
    }

    /// Dead-zone follow: only scroll when the target nears the top or
    /// bottom fifth of the view.
    pub fn follow(&mut self, target_row: i32, row_count: usize) {
        if self.view_rows == 0 { return; }
        let view = self.view_rows as i32;
        let rows = row_count as i32;

        if rows <= view {
            self.bottom = 0;
            return;
        }

        let margin = view / 5;
        if target_row < self.bottom + margin {
            self.bottom = target_row - margin;
        } else if target_row > self.bottom + view - margin - 1 {
            self.bottom = target_row - view + margin + 1;
        }
        self.bottom = self.bottom.max(0).min(rows - view);
    }

    /// Jump straight back to the start rows.
    pub fn snap_to_start(&mut self) {
        self.bottom = 0;
    }

    /// Screen line for a world row, top line first. `None` if off screen.
    pub fn row_to_view(&self, row: i32) -> Option<usize> {
        let offset = row - self.bottom;
        if offset >= 0 && offset < self.view_rows as i32 {
            Some(self.view_rows - 1 - offset as usize)
        } else {
            None
        }
    }
}

pub struct Board {
    pub lanes: LaneMap,
    pub width: f32,
    pub vehicles: Vec<Vehicle>,
    populated: Vec<bool>,
    next_id: usize,
    seed: u64,
    rng: StdRng,
}

impl Board {
    pub fn new(cfg: &BoardConfig) -> Result<Self, ConfigError> {
        let lanes = LaneMap::parse(&cfg.lanes)?;
        if cfg.width < 3.0 {
            return Err(ConfigError::InvalidLanes(format!(
                "board width {} leaves no room to stand", cfg.width
            )));
        }
        let seed = cfg.seed.unwrap_or_else(rand::random);
        let rows = lanes.len();
        let mut board = Board {
            lanes,
            width: cfg.width,
            vehicles: vec![],
            populated: vec![false; rows],
            next_id: 0,
            seed,
            rng: StdRng::seed_from_u64(seed),
        };
        board.reset_traffic();
        Ok(board)
    }

    /// Clear all vehicles and repopulate the start rows from the seed.
    pub fn reset_traffic(&mut self) {
        self.vehicles.clear();
        self.populated.iter_mut().for_each(|p| *p = false);
        self.next_id = 0;
        self.rng = StdRng::seed_from_u64(self.seed);
        self.populate_through(LOOKAHEAD);
    }

    /// Make sure every row up to `row` has its traffic.
    pub fn populate_through(&mut self, row: i32) {
        let last = row.min(self.lanes.total_rows());
        for r in 0..=last {
            if !self.is_populated(r) {
                self.populated[r as usize] = true;
                self.populate_row(r);
            }
        }
    }

    pub fn is_populated(&self, row: i32) -> bool {
        row >= 0 && self.populated.get(row as usize).copied().unwrap_or(false)
    }

    fn populate_row(&mut self, row: i32) {
        let kind = match self.lanes.kind_of(row) {
            Some(k) if k.has_traffic() => k,
            _ => return,
        };
        let dir: f32 = if row % 2 == 0 { -1.0 } else { 1.0 };

        let (count, len_range, speed_range) = match kind {
            RowKind::Road => (self.rng.gen_range(2..=3), 1.0..2.0, 1.5..4.0),
            _ => (self.rng.gen_range(2..=3), 2.5..4.0, 1.0..2.5),
        };
        let base_speed: f32 = self.rng.gen_range(speed_range);
        let speed = base_speed * dir;
        let span = self.width + 2.0 * WRAP_MARGIN;
        let gap = span / count as f32;

        let mut logs = vec![];
        for i in 0..count {
            let len: f32 = self.rng.gen_range(len_range.clone());
            let jitter: f32 = self.rng.gen_range(0.0..gap * 0.3);
            let x = -span / 2.0 + i as f32 * gap + jitter;
            let vkind = if kind == RowKind::Road { VehicleKind::Car } else { VehicleKind::Log };
            let id = self.spawn(vkind, row, x, len, speed);
            if vkind.is_carrier() {
                logs.push((x, len));
            }
            debug!(row, ?vkind, ?id, x, len, speed, "spawned vehicle");
        }

        // A predator rides the leading end of one log.
        if !logs.is_empty() && self.rng.gen_bool(PREDATOR_CHANCE) {
            let (x, len) = logs[self.rng.gen_range(0..logs.len())];
            let head_x = x + dir * (len / 2.0 - 0.5);
            self.spawn(VehicleKind::PredatorHead, row, head_x, 1.0, speed);
        }
    }

    fn spawn(&mut self, kind: VehicleKind, row: i32, x: f32, len: f32, velocity: f32) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id += 1;
        self.vehicles.push(Vehicle::new(id, kind, row, x, len, velocity));
        id
    }

    pub fn advance(&mut self, dt: f32) {
        let width = self.width;
        for v in self.vehicles.iter_mut() {
            v.advance(dt, width);
        }
    }

    /// Vehicles the player's footprint touches, in id order.
    pub fn touching(&self, x: f32, row: i32) -> Vec<(VehicleId, VehicleKind)> {
        let mut hits: Vec<_> = self.vehicles.iter()
            .filter(|v| v.overlaps(x, row))
            .map(|v| (v.id, v.kind))
            .collect();
        hits.sort_by_key(|(id, _)| *id);
        hits
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }
}

impl RowClassifier for Board {
    #[inline]
    fn kind_of(&self, row: i32) -> Option<RowKind> {
        self.lanes.kind_of(row)
    }
}

impl Field for Board {
    fn total_rows(&self) -> i32 {
        self.lanes.total_rows()
    }

    fn world_width(&self) -> f32 {
        self.width
    }

    fn carrier_velocity(&self, id: VehicleId) -> Option<f32> {
        self.vehicle(id).map(|v| v.velocity)
    }
}

pub struct WorldState {
    pub board: Board,
    pub player: Player,

    // ── Triggers ──
    /// Vehicles the player touched at the end of the last tick.
    pub touching: Vec<VehicleId>,

    // ── Meta ──
    pub phase: Phase,
    pub paused: bool,
    pub tick: u64,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
    pub camera: Camera,
}

// ── Construction ──

impl WorldState {
    pub fn new(config: &GameConfig) -> Result<Self, ConfigError> {
        let board = Board::new(&config.board)?;
        let player = Player::new(config.player.clone(), StdRng::from_entropy());
        Ok(WorldState {
            board,
            player,
            touching: vec![],
            phase: Phase::Title,
            paused: false,
            tick: 0,
            message: String::new(),
            message_timer: 0,
            camera: Camera::new(),
        })
    }

    /// Start a fresh run from the bottom row.
    pub fn start_run(&mut self, events: &mut Vec<PlayerEvent>) {
        self.board.reset_traffic();
        self.player.reset(events);
        self.player.begin();
        self.touching.clear();
        self.camera.snap_to_start();
        self.paused = false;
        self.tick = 0;
        self.phase = Phase::Playing;
        self.set_message("Cross to the far bank!", 90);
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Count down the banner message, one tick at a time.
    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 { self.message.clear(); }
        }
    }
}

impl GameSession for WorldState {
    fn on_row_advance(&mut self, row: i32, dir: i32) {
        if dir > 0 {
            self.board.populate_through(row + LOOKAHEAD);
        }
    }

    fn on_respawn(&mut self) {
        self.camera.snap_to_start();
    }

    fn on_victory(&mut self) {
        self.phase = Phase::Victory;
        self.set_message("SAFE ACROSS!", 0);
    }

    fn on_game_over(&mut self) {
        self.phase = Phase::GameOver;
        self.set_message("OUT OF LIVES", 0);
    }
}
