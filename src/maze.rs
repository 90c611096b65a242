use std::collections::BTreeSet;

use crate::constants::{DEFAULT_MAP, DEFAULT_PLAYER_SPAWN, PELLET_SCORE, POWER_PELLET_SCORE};
use crate::types::{Direction, Tile};

pub trait GridOracle {
    fn width(&self) -> i32;
    fn height(&self) -> i32;

    /// Out-of-bounds tiles count as walls.
    fn is_wall(&self, tile: Tile) -> bool;

    fn in_bounds(&self, tile: Tile) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.width() && tile.y < self.height()
    }

    fn is_valid_move(&self, tile: Tile) -> bool {
        self.in_bounds(tile) && !self.is_wall(tile)
    }

    fn valid_adjacent_tiles(&self, tile: Tile) -> Vec<Tile> {
        Direction::ALL
            .iter()
            .map(|dir| tile.offset(*dir))
            .filter(|next| self.is_valid_move(*next))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileKind {
    Empty,
    Wall,
    Pellet,
    PowerPellet,
    GhostSpawn,
    PlayerSpawn,
}

impl TileKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Wall),
            2 => Some(Self::Pellet),
            3 => Some(Self::PowerPellet),
            4 => Some(Self::GhostSpawn),
            5 => Some(Self::PlayerSpawn),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Maze {
    width: i32,
    height: i32,
    pristine: Vec<Vec<TileKind>>,
    tiles: Vec<Vec<TileKind>>,
    pellets_remaining: usize,
    ghost_spawn_points: Vec<Tile>,
    player_spawn: Tile,
}

impl Maze {
    pub fn from_kinds(rows: Vec<Vec<TileKind>>) -> Self {
        let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
        let pristine: Vec<Vec<TileKind>> = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, TileKind::Wall);
                row
            })
            .collect();
        let mut maze = Self {
            width: width as i32,
            height: pristine.len() as i32,
            tiles: pristine.clone(),
            pristine,
            pellets_remaining: 0,
            ghost_spawn_points: Vec::new(),
            player_spawn: DEFAULT_PLAYER_SPAWN,
        };
        maze.reset();
        maze
    }

    pub fn from_codes<R: AsRef<[u8]>>(rows: &[R]) -> Self {
        Self::from_kinds(
            rows.iter()
                .map(|row| {
                    row.as_ref()
                        .iter()
                        .map(|code| TileKind::from_code(*code).unwrap_or(TileKind::Wall))
                        .collect()
                })
                .collect(),
        )
    }

    pub fn parse(text: &str) -> Self {
        let rows: Vec<Vec<u8>> = text
            .lines()
            .map(|line| {
                line.split_whitespace()
                    .map(|token| token.parse::<u8>().unwrap_or(1))
                    .collect::<Vec<u8>>()
            })
            .filter(|row| !row.is_empty())
            .collect();
        Self::from_codes(&rows)
    }

    pub fn default_map() -> Self {
        Self::from_codes(&DEFAULT_MAP)
    }

    pub fn open(width: usize, height: usize) -> Self {
        Self::from_kinds(vec![vec![TileKind::Empty; width]; height])
    }

    pub fn reset(&mut self) {
        self.tiles = self.pristine.clone();
        self.pellets_remaining = 0;
        self.ghost_spawn_points.clear();
        let mut player_spawn = None;
        for (y, row) in self.tiles.iter().enumerate() {
            for (x, kind) in row.iter().enumerate() {
                let tile = Tile::new(x as i32, y as i32);
                match kind {
                    TileKind::Pellet | TileKind::PowerPellet => self.pellets_remaining += 1,
                    TileKind::GhostSpawn => self.ghost_spawn_points.push(tile),
                    TileKind::PlayerSpawn if player_spawn.is_none() => player_spawn = Some(tile),
                    _ => {}
                }
            }
        }
        self.player_spawn = player_spawn.unwrap_or(DEFAULT_PLAYER_SPAWN);
    }

    pub fn kind_at(&self, tile: Tile) -> Option<TileKind> {
        if !self.in_bounds(tile) {
            return None;
        }
        self.tiles
            .get(tile.y as usize)
            .and_then(|row| row.get(tile.x as usize))
            .copied()
    }

    pub fn set_kind(&mut self, tile: Tile, kind: TileKind) {
        if let Some(cell) = self
            .tiles
            .get_mut(tile.y as usize)
            .and_then(|row| row.get_mut(tile.x as usize))
        {
            *cell = kind;
        }
    }

    pub fn collect_pellet(&mut self, tile: Tile) -> i32 {
        let score = match self.kind_at(tile) {
            Some(TileKind::Pellet) => PELLET_SCORE,
            Some(TileKind::PowerPellet) => POWER_PELLET_SCORE,
            _ => return 0,
        };
        self.set_kind(tile, TileKind::Empty);
        self.pellets_remaining = self.pellets_remaining.saturating_sub(1);
        score
    }

    pub fn pellets_remaining(&self) -> usize {
        self.pellets_remaining
    }

    pub fn all_pellets_collected(&self) -> bool {
        self.pellets_remaining == 0
    }

    pub fn pellet_positions(&self) -> Vec<Tile> {
        let mut out = Vec::new();
        for (y, row) in self.tiles.iter().enumerate() {
            for (x, kind) in row.iter().enumerate() {
                if matches!(kind, TileKind::Pellet | TileKind::PowerPellet) {
                    out.push(Tile::new(x as i32, y as i32));
                }
            }
        }
        out
    }

    pub fn power_pellet_positions(&self) -> BTreeSet<Tile> {
        self.pellet_positions()
            .into_iter()
            .filter(|tile| self.kind_at(*tile) == Some(TileKind::PowerPellet))
            .collect()
    }

    pub fn ghost_spawn_points(&self) -> &[Tile] {
        &self.ghost_spawn_points
    }

    pub fn player_spawn(&self) -> Tile {
        self.player_spawn
    }
}

impl GridOracle for Maze {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn is_wall(&self, tile: Tile) -> bool {
        match self.kind_at(tile) {
            Some(kind) => kind == TileKind::Wall,
            None => true,
        }
    }
}
