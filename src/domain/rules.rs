/// Game rules as pure functions: death classification, movement guard,
/// scoring arithmetic, and the death cue table.
///
/// Nothing here touches player state. The controller asks, these answer.

use super::lane::RowKind;

/// Upper bound (exclusive) of the random bonus added to each new row.
pub const ROW_BONUS_MAX: u32 = 25;

/// A downward move is refused at or below this height.
pub const MIN_Y_FOR_DOWN: f32 = 0.5;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeathType {
    Collision,
    Drowning,
    /// Part of the death vocabulary; leaving the board is classified by
    /// row kind instead, so no rule produces it.
    #[allow(dead_code)]
    Offscreen,
    Chomp,
    Time,
}

/// Sound cue identifiers. The presentation layer owns the actual sounds.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cue {
    Hop,
    DeathCollision,
    DeathDrowning,
    Chomp,
    Victory,
    GameOver,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDir {
    /// Unit step as (dx, dy). Up is +y.
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Up => (0, 1),
            MoveDir::Down => (0, -1),
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, MoveDir::Up | MoveDir::Down)
    }
}

/// Row used by the drowning check: nearest row.
#[inline]
pub fn landing_row(y: f32) -> i32 {
    y.round() as i32
}

/// Row used by the offscreen check: truncated toward zero.
#[inline]
pub fn occupied_row(y: f32) -> i32 {
    y.trunc() as i32
}

/// Is a move in `dir` allowed from height `y`?
pub fn move_allowed(y: f32, dir: MoveDir) -> bool {
    let (_, dy) = dir.delta();
    y > MIN_Y_FOR_DOWN || dy >= 0
}

/// Water without a carrier drowns.
pub fn drowning(kind: RowKind, has_carrier: bool) -> Option<DeathType> {
    if kind.needs_carrier() && !has_carrier {
        Some(DeathType::Drowning)
    } else {
        None
    }
}

#[inline]
pub fn is_offscreen(x: f32, world_width: f32) -> bool {
    x.abs() > world_width / 2.0 - 1.0
}

/// How leaving the board kills, by the kind of row it happens on.
/// Anything that is not water counts as a collision.
pub fn offscreen_death(kind: RowKind) -> DeathType {
    match kind {
        RowKind::Road => DeathType::Collision,
        RowKind::Water => DeathType::Drowning,
        _ => DeathType::Collision,
    }
}

/// Death cue per death type. Unlisted types share the collision cue.
pub fn death_cue(death: DeathType) -> Cue {
    match death {
        DeathType::Collision => Cue::DeathCollision,
        DeathType::Drowning => Cue::DeathDrowning,
        DeathType::Chomp => Cue::Chomp,
        _ => Cue::DeathCollision,
    }
}

/// Points for climbing from `highest` to `y`, before the random bonus.
/// Saturates at `u32::MAX`.
pub fn climb_points(highest: f32, y: f32, points_per_step: u32) -> u32 {
    let rows = (y - highest).round().max(0.0) as u32;
    rows.saturating_mul(points_per_step)
}

/// Bonus for finishing with lives to spare. Saturates at `u32::MAX`.
pub fn victory_bonus(lives_remaining: i32, points_per_step: u32, total_rows: i32) -> u32 {
    let lives = lives_remaining.max(0) as u32;
    lives
        .saturating_mul(points_per_step)
        .saturating_mul(total_rows.max(0) as u32)
}
