use crate::maze::GridOracle;
use crate::player::PlayerStatus;
use crate::types::{GhostArchetype, Tile};

const AMBUSH_LOOKAHEAD: i32 = 2;
const COOPERATIVE_SOLO_OFFSET: i32 = 2;

pub fn chase_target(
    archetype: GhostArchetype,
    player: &dyn PlayerStatus,
    maze: &dyn GridOracle,
    siblings: &[Tile],
) -> Tile {
    let player_pos = player.position();
    let candidate = match archetype {
        GhostArchetype::Aggressive | GhostArchetype::Predictive => return player_pos,
        GhostArchetype::Ambush => match player.facing_direction() {
            Some(dir) => player_pos.offset_by(dir, AMBUSH_LOOKAHEAD),
            None => return player_pos,
        },
        GhostArchetype::Cooperative => flank_tile(player_pos, siblings),
    };
    if maze.is_valid_move(candidate) {
        candidate
    } else {
        player_pos
    }
}

fn flank_tile(player_pos: Tile, siblings: &[Tile]) -> Tile {
    if siblings.is_empty() {
        return Tile::new(
            player_pos.x - COOPERATIVE_SOLO_OFFSET,
            player_pos.y - COOPERATIVE_SOLO_OFFSET,
        );
    }
    let count = siblings.len() as f32;
    let avg_x = siblings.iter().map(|s| s.x as f32).sum::<f32>() / count;
    let avg_y = siblings.iter().map(|s| s.y as f32).sum::<f32>() / count;
    // truncates toward zero, then nudges one tile past the midpoint
    Tile::new(
        ((player_pos.x as f32 + avg_x) / 2.0) as i32 + 1,
        ((player_pos.y as f32 + avg_y) / 2.0) as i32 + 1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::{Maze, TileKind};
    use crate::player::PlayerSnapshot;
    use crate::types::Direction;

    fn player(x: i32, y: i32, facing: Option<Direction>) -> PlayerSnapshot {
        PlayerSnapshot {
            position: Tile::new(x, y),
            powered_up: false,
            facing,
        }
    }

    #[test]
    fn aggressive_and_predictive_target_the_player() {
        let maze = Maze::open(10, 10);
        let p = player(4, 4, Some(Direction::Left));
        for archetype in [GhostArchetype::Aggressive, GhostArchetype::Predictive] {
            assert_eq!(chase_target(archetype, &p, &maze, &[]), Tile::new(4, 4));
        }
    }

    #[test]
    fn ambush_projects_two_tiles_ahead() {
        let maze = Maze::open(10, 10);
        let p = player(4, 4, Some(Direction::Right));
        assert_eq!(
            chase_target(GhostArchetype::Ambush, &p, &maze, &[]),
            Tile::new(6, 4)
        );
        let up = player(4, 4, Some(Direction::Up));
        assert_eq!(
            chase_target(GhostArchetype::Ambush, &up, &maze, &[]),
            Tile::new(4, 2)
        );
    }

    #[test]
    fn ambush_falls_back_on_wall_edge_or_no_facing() {
        let mut maze = Maze::open(10, 10);
        maze.set_kind(Tile::new(6, 4), TileKind::Wall);
        let p = player(4, 4, Some(Direction::Right));
        assert_eq!(
            chase_target(GhostArchetype::Ambush, &p, &maze, &[]),
            Tile::new(4, 4)
        );

        let edge = player(1, 1, Some(Direction::Left));
        assert_eq!(
            chase_target(GhostArchetype::Ambush, &edge, &maze, &[]),
            Tile::new(1, 1)
        );

        let idle = player(4, 4, None);
        assert_eq!(
            chase_target(GhostArchetype::Ambush, &idle, &maze, &[]),
            Tile::new(4, 4)
        );
    }

    #[test]
    fn cooperative_flanks_past_the_sibling_midpoint() {
        let maze = Maze::open(20, 20);
        let p = player(10, 10, None);
        let siblings = [Tile::new(2, 2), Tile::new(4, 4)];
        // avg (3,3), midpoint (6.5,6.5) -> (6,6) + 1
        assert_eq!(
            chase_target(GhostArchetype::Cooperative, &p, &maze, &siblings),
            Tile::new(7, 7)
        );
    }

    #[test]
    fn cooperative_without_siblings_offsets_up_left() {
        let maze = Maze::open(20, 20);
        let p = player(10, 10, None);
        assert_eq!(
            chase_target(GhostArchetype::Cooperative, &p, &maze, &[]),
            Tile::new(8, 8)
        );
        let corner = player(1, 1, None);
        assert_eq!(
            chase_target(GhostArchetype::Cooperative, &corner, &maze, &[]),
            Tile::new(1, 1)
        );
    }

    #[test]
    fn cooperative_rejects_wall_targets() {
        let mut maze = Maze::open(20, 20);
        maze.set_kind(Tile::new(7, 7), TileKind::Wall);
        let p = player(10, 10, None);
        let siblings = [Tile::new(2, 2), Tile::new(4, 4)];
        assert_eq!(
            chase_target(GhostArchetype::Cooperative, &p, &maze, &siblings),
            Tile::new(10, 10)
        );
    }
}
