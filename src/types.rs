use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

impl Tile {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Tile) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn offset(self, dir: Direction) -> Tile {
        let (dx, dy) = dir.delta();
        Tile::new(self.x + dx, self.y + dy)
    }

    pub fn offset_by(self, dir: Direction, steps: i32) -> Tile {
        let (dx, dy) = dir.delta();
        Tile::new(self.x + dx * steps, self.y + dy * steps)
    }

    pub fn is_adjacent(self, other: Tile) -> bool {
        self.manhattan(other) == 1
    }
}

impl From<(i32, i32)> for Tile {
    fn from((x, y): (i32, i32)) -> Self {
        Tile::new(x, y)
    }
}

impl From<Tile> for (i32, i32) {
    fn from(tile: Tile) -> Self {
        (tile.x, tile.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostArchetype {
    Aggressive,
    Ambush,
    Cooperative,
    Predictive,
}

impl GhostArchetype {
    pub const ALL: [GhostArchetype; 4] = [
        GhostArchetype::Aggressive,
        GhostArchetype::Ambush,
        GhostArchetype::Cooperative,
        GhostArchetype::Predictive,
    ];

    pub fn color(self) -> GhostColor {
        match self {
            GhostArchetype::Aggressive => GhostColor::Red,
            GhostArchetype::Ambush => GhostColor::Pink,
            GhostArchetype::Cooperative => GhostColor::Cyan,
            GhostArchetype::Predictive => GhostColor::Orange,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostColor {
    Red,
    Pink,
    Cyan,
    Orange,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostState {
    RespawnHold,
    PostRespawnChase,
    Chase,
    Frightened,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_direction: Option<Direction>,
    #[serde(default)]
    pub is_corner: bool,
    #[serde(default)]
    pub score: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Playing,
    Paused,
    LevelComplete,
    GameOver,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub archetype: GhostArchetype,
    pub color: GhostColor,
    pub x: i32,
    pub y: i32,
    pub state: GhostState,
    #[serde(rename = "pathLen")]
    pub path_len: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub score: i32,
    pub lives: i32,
    #[serde(rename = "poweredUp")]
    pub powered_up: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "nowMs")]
    pub now_ms: u64,
    pub status: SessionStatus,
    #[serde(rename = "learningPhase")]
    pub learning_phase: usize,
    #[serde(rename = "pelletsRemaining")]
    pub pellets_remaining: usize,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    GhostEaten {
        archetype: GhostArchetype,
        score: i32,
    },
    PlayerHit {
        archetype: GhostArchetype,
        #[serde(rename = "livesLeft")]
        lives_left: i32,
    },
    PowerUp,
    LevelComplete,
    GameOver,
}
