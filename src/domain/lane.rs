/// Row kinds and the lane table.
/// Row semantics are queried via methods so the rules stay centralized here.

use tracing::warn;

use crate::config::ConfigError;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RowKind {
    Road,
    Water,
    Safe,
    Finish,
    Unknown, // unrecognized lane marker; treated like Road by the offscreen rule
}

impl RowKind {
    pub fn from_char(c: char) -> RowKind {
        match c {
            'R' | 'r' => RowKind::Road,
            'W' | 'w' => RowKind::Water,
            'S' | 's' => RowKind::Safe,
            'F' | 'f' => RowKind::Finish,
            _ => RowKind::Unknown,
        }
    }

    /// Standing here without a carrier drowns the player.
    pub fn needs_carrier(self) -> bool {
        matches!(self, RowKind::Water)
    }

    /// Does traffic run along this row?
    pub fn has_traffic(self) -> bool {
        matches!(self, RowKind::Road | RowKind::Water)
    }
}

/// Terrain lookup by row index.
///
/// `None` means the row has no classification at all. Callers that need
/// an answer treat that as a broken board, not as a game event.
pub trait RowClassifier {
    fn kind_of(&self, row: i32) -> Option<RowKind>;
}

/// Indexed row table, bottom row first.
#[derive(Clone, Debug)]
pub struct LaneMap {
    rows: Vec<RowKind>,
}

impl LaneMap {
    /// Parse a lane string, one character per row from the start row up.
    pub fn parse(layout: &str) -> Result<LaneMap, ConfigError> {
        let layout = layout.trim();
        if layout.chars().count() < 2 {
            return Err(ConfigError::InvalidLanes(format!(
                "need at least a start row and a finish row, got {:?}",
                layout
            )));
        }
        let rows: Vec<RowKind> = layout
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let kind = RowKind::from_char(c);
                if kind == RowKind::Unknown {
                    warn!(row = i, marker = %c, "unrecognized lane marker");
                }
                kind
            })
            .collect();
        Ok(LaneMap { rows })
    }

    /// Index of the top row. Reaching it ends the run.
    pub fn total_rows(&self) -> i32 {
        self.rows.len() as i32 - 1
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, RowKind)> + '_ {
        self.rows.iter().enumerate().map(|(i, k)| (i as i32, *k))
    }
}

impl RowClassifier for LaneMap {
    #[inline]
    fn kind_of(&self, row: i32) -> Option<RowKind> {
        if row < 0 { return None; }
        self.rows.get(row as usize).copied()
    }
}
