use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::constants::{PATH_CACHE_CAPACITY, PELLET_SAFE_DISTANCE};
use crate::maze::GridOracle;
use crate::types::{Direction, Tile};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PathKey {
    start: Tile,
    goal: Tile,
    avoid: Vec<Tile>,
}

impl PathKey {
    fn new(start: Tile, goal: Tile, avoid: &HashSet<Tile>) -> Self {
        let mut avoid: Vec<Tile> = avoid.iter().copied().collect();
        avoid.sort();
        Self { start, goal, avoid }
    }
}

#[derive(Clone, Debug)]
pub struct PathFinder {
    cache: HashMap<PathKey, Vec<Tile>>,
    capacity: usize,
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathFinder {
    pub fn new() -> Self {
        Self::with_capacity(PATH_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: HashMap::new(),
            capacity,
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Must be called whenever traversability of the grid changes.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// The path runs from the tile after `start` up to and including `goal`.
    /// Empty means unreachable, except `start == goal` which yields `[start]`.
    pub fn find_path<G: GridOracle + ?Sized>(
        &mut self,
        grid: &G,
        start: Tile,
        goal: Tile,
        avoid: &HashSet<Tile>,
    ) -> Vec<Tile> {
        let key = PathKey::new(start, goal, avoid);
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }
        if start == goal {
            return vec![start];
        }

        let path = a_star(grid, start, goal, avoid);
        if !path.is_empty() && self.cache.len() < self.capacity {
            self.cache.insert(key, path.clone());
        }
        path
    }

    pub fn find_path_avoiding_agents<G: GridOracle + ?Sized>(
        &mut self,
        grid: &G,
        start: Tile,
        goal: Tile,
        agent_positions: &[Tile],
        safety_radius: i32,
    ) -> Vec<Tile> {
        let mut avoid = HashSet::new();
        for agent in agent_positions {
            for dx in -safety_radius..=safety_radius {
                for dy in -safety_radius..=safety_radius {
                    let tile = Tile::new(agent.x + dx, agent.y + dy);
                    if grid.is_valid_move(tile) {
                        avoid.insert(tile);
                    }
                }
            }
        }
        self.find_path(grid, start, goal, &avoid)
    }

    pub fn find_escape_route<G: GridOracle + ?Sized>(
        &mut self,
        grid: &G,
        player_pos: Tile,
        agent_positions: &[Tile],
        max_hops: usize,
    ) -> Vec<Tile> {
        let mut best = player_pos;
        let mut best_distance = 0;
        let mut visited = HashSet::from([player_pos]);
        let mut queue = VecDeque::from([(player_pos, 0usize)]);

        while let Some((current, hops)) = queue.pop_front() {
            if let Some(distance) = nearest_distance(current, agent_positions) {
                if distance > best_distance {
                    best_distance = distance;
                    best = current;
                }
            }
            if hops >= max_hops {
                continue;
            }
            for next in grid.valid_adjacent_tiles(current) {
                if visited.insert(next) {
                    queue.push_back((next, hops + 1));
                }
            }
        }

        debug!(?player_pos, ?best, best_distance, "escape target chosen");
        self.find_path(grid, player_pos, best, &HashSet::new())
    }

    pub fn find_pellet_path<G: GridOracle + ?Sized>(
        &mut self,
        grid: &G,
        start: Tile,
        pellet_positions: &[Tile],
        agent_positions: &[Tile],
    ) -> Vec<Tile> {
        let mut best: Option<(f32, Tile)> = None;
        for pellet in pellet_positions {
            let safety = nearest_distance(*pellet, agent_positions).unwrap_or(PELLET_SAFE_DISTANCE);
            let score = safety as f32 - start.manhattan(*pellet) as f32 * 0.5;
            if best.map(|(best_score, _)| score > best_score).unwrap_or(true) {
                best = Some((score, *pellet));
            }
        }
        match best {
            Some((_, pellet)) => self.find_path(grid, start, pellet, &HashSet::new()),
            None => Vec::new(),
        }
    }
}

pub fn direction_between(from: Tile, to: Tile) -> Option<Direction> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx > 0 {
        Some(Direction::Right)
    } else if dx < 0 {
        Some(Direction::Left)
    } else if dy > 0 {
        Some(Direction::Down)
    } else if dy < 0 {
        Some(Direction::Up)
    } else {
        None
    }
}

pub fn is_well_formed_path<G: GridOracle + ?Sized>(grid: &G, from: Tile, path: &[Tile]) -> bool {
    let mut previous = from;
    for tile in path {
        if !previous.is_adjacent(*tile) || !grid.is_valid_move(*tile) {
            return false;
        }
        previous = *tile;
    }
    true
}

fn nearest_distance(tile: Tile, agents: &[Tile]) -> Option<i32> {
    agents.iter().map(|agent| tile.manhattan(*agent)).min()
}

fn a_star<G: GridOracle + ?Sized>(
    grid: &G,
    start: Tile,
    goal: Tile,
    avoid: &HashSet<Tile>,
) -> Vec<Tile> {
    // (f, discovery sequence) keeps equal-f ties in discovery order.
    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<Tile, Tile> = HashMap::new();
    let mut g_score: HashMap<Tile, i32> = HashMap::from([(start, 0)]);
    let mut closed: HashSet<Tile> = HashSet::new();
    let mut sequence = 0u64;
    open_set.push(Reverse((start.manhattan(goal), sequence, start)));

    while let Some(Reverse((_, _, current))) = open_set.pop() {
        if !closed.insert(current) {
            continue;
        }
        if current == goal {
            return reconstruct_path(&came_from, start, goal);
        }

        let current_g = g_score.get(&current).copied().unwrap_or(i32::MAX);
        for neighbor in grid.valid_adjacent_tiles(current) {
            if closed.contains(&neighbor) || avoid.contains(&neighbor) {
                continue;
            }
            let tentative_g = current_g + 1;
            if tentative_g < g_score.get(&neighbor).copied().unwrap_or(i32::MAX) {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative_g);
                sequence += 1;
                open_set.push(Reverse((
                    tentative_g + neighbor.manhattan(goal),
                    sequence,
                    neighbor,
                )));
            }
        }
    }

    Vec::new()
}

fn reconstruct_path(came_from: &HashMap<Tile, Tile>, start: Tile, goal: Tile) -> Vec<Tile> {
    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        path.push(current);
        match came_from.get(&current) {
            Some(previous) => current = *previous,
            None => break,
        }
    }
    path.reverse();
    path
}
