use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::components::{Dir, Pos};
use crate::error::MazeError;

/// Smallest odd dimension the carver accepts; anything less leaves no interior.
pub const MIN_DIMENSION: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Open,
    Goal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    width: usize,
    height: usize,
    grid: Vec<Vec<Tile>>,
}

/// Cell where every run begins; the generator always carves from here.
pub const START: Pos = Pos::new(1, 1);

/// Carves a perfect maze with a recursive backtracker on a step-2 lattice.
///
/// Even dimensions are decremented to the next odd value before carving, so
/// corridors are one cell wide and every open cell hangs off a single tree
/// rooted at [`START`]. The cells right and below the start are forced open
/// afterwards to give the player a safe pocket.
pub fn generate(width: usize, height: usize, rng: &mut impl Rng) -> Result<Maze, MazeError> {
    let width = force_odd(width);
    let height = force_odd(height);
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return Err(MazeError::InvalidDimensions { width, height });
    }

    let mut grid = vec![vec![Tile::Wall; width]; height];
    carve_from(&mut grid, width, height, START, rng);

    grid[START.y][START.x] = Tile::Open;
    grid[START.y][START.x + 1] = Tile::Open;
    grid[START.y + 1][START.x] = Tile::Open;

    Ok(Maze {
        width,
        height,
        grid,
    })
}

fn force_odd(n: usize) -> usize {
    if n % 2 == 0 {
        n.saturating_sub(1)
    } else {
        n
    }
}

struct Frame {
    pos: Pos,
    dirs: [Dir; 4],
    next: usize,
}

fn open_frame(grid: &mut [Vec<Tile>], pos: Pos, rng: &mut impl Rng) -> Frame {
    grid[pos.y][pos.x] = Tile::Open;
    let mut dirs = Dir::ALL;
    dirs.shuffle(rng);
    Frame { pos, dirs, next: 0 }
}

// Explicit stack instead of call recursion: a large terminal can ask for a
// lattice deep enough to blow the thread stack.
fn carve_from(grid: &mut [Vec<Tile>], width: usize, height: usize, start: Pos, rng: &mut impl Rng) {
    let mut stack = vec![open_frame(grid, start, rng)];
    while let Some(frame) = stack.last_mut() {
        if frame.next >= frame.dirs.len() {
            stack.pop();
            continue;
        }
        let dir = frame.dirs[frame.next];
        frame.next += 1;
        let pos = frame.pos;

        let (dx, dy) = dir.delta();
        let nx = pos.x as isize + dx * 2;
        let ny = pos.y as isize + dy * 2;
        if nx <= 0 || ny <= 0 || nx >= width as isize - 1 || ny >= height as isize - 1 {
            continue;
        }
        let (nx, ny) = (nx as usize, ny as usize);
        if grid[ny][nx] != Tile::Wall {
            continue;
        }

        let wall_x = (pos.x + nx) / 2;
        let wall_y = (pos.y + ny) / 2;
        grid[wall_y][wall_x] = Tile::Open;
        let next = open_frame(grid, Pos::new(nx, ny), rng);
        stack.push(next);
    }
}

impl Maze {
    /// Builds a maze from text rows: `#` is a wall, `G` a goal, anything else open.
    pub fn from_ascii(rows: &[&str]) -> Result<Maze, MazeError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if width == 0 || rows.iter().any(|r| r.chars().count() != width) {
            return Err(MazeError::InvalidDimensions { width, height });
        }
        let grid = rows
            .iter()
            .map(|row| {
                row.chars()
                    .map(|c| match c {
                        '#' => Tile::Wall,
                        'G' => Tile::Goal,
                        _ => Tile::Open,
                    })
                    .collect()
            })
            .collect();
        Ok(Maze {
            width,
            height,
            grid,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile(&self, pos: Pos) -> Option<Tile> {
        self.grid.get(pos.y).and_then(|row| row.get(pos.x)).copied()
    }

    /// In bounds and not a wall.
    pub fn is_open(&self, pos: Pos) -> bool {
        matches!(self.tile(pos), Some(Tile::Open | Tile::Goal))
    }

    pub fn is_goal(&self, pos: Pos) -> bool {
        self.tile(pos) == Some(Tile::Goal)
    }

    pub fn open_cells(&self) -> Vec<Pos> {
        let mut cells = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.grid[y][x] != Tile::Wall {
                    cells.push(Pos { x, y });
                }
            }
        }
        cells
    }

    /// BFS step counts from `start` over open cells; `None` marks walls and unreachable cells.
    pub fn distances_from(&self, start: Pos) -> Vec<Vec<Option<u32>>> {
        let mut dist = vec![vec![None; self.width]; self.height];
        if !self.is_open(start) {
            return dist;
        }
        let mut q = VecDeque::new();
        dist[start.y][start.x] = Some(0);
        q.push_back(start);

        while let Some(pos) = q.pop_front() {
            let base = dist[pos.y][pos.x].unwrap_or(0);
            for dir in Dir::ALL {
                let Some(next) = pos.step(dir) else {
                    continue;
                };
                if !self.is_open(next) || dist[next.y][next.x].is_some() {
                    continue;
                }
                dist[next.y][next.x] = Some(base + 1);
                q.push_back(next);
            }
        }
        dist
    }

    pub fn reachable_from(&self, start: Pos) -> Vec<Vec<bool>> {
        self.distances_from(start)
            .into_iter()
            .map(|row| row.into_iter().map(|d| d.is_some()).collect())
            .collect()
    }

    /// Marks the open cell farthest from `from` as the goal and returns it.
    pub fn place_goal_farthest(&mut self, from: Pos) -> Option<Pos> {
        let dist = self.distances_from(from);
        let mut best: Option<(Pos, u32)> = None;
        for (y, row) in dist.iter().enumerate() {
            for (x, d) in row.iter().enumerate() {
                if let Some(d) = *d {
                    if best.map_or(true, |(_, bd)| d > bd) {
                        best = Some((Pos { x, y }, d));
                    }
                }
            }
        }
        let (goal, _) = best.filter(|(p, _)| *p != from)?;
        self.grid[goal.y][goal.x] = Tile::Goal;
        Some(goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn all_open_reachable(maze: &Maze) -> bool {
        let reach = maze.reachable_from(START);
        maze.open_cells().iter().all(|p| reach[p.y][p.x])
    }

    #[test]
    fn every_open_cell_is_reachable_from_start() {
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let w = 5 + (seed as usize % 30);
            let h = 5 + (seed as usize * 7 % 25);
            let maze = generate(w, h, &mut rng).unwrap();
            assert!(all_open_reachable(&maze), "seed {seed} left a disconnected cell");
        }
    }

    #[test]
    fn even_dimensions_are_decremented() {
        let mut rng = StdRng::seed_from_u64(7);
        let maze = generate(22, 12, &mut rng).unwrap();
        assert_eq!((maze.width(), maze.height()), (21, 11));

        let maze = generate(21, 11, &mut rng).unwrap();
        assert_eq!((maze.width(), maze.height()), (21, 11));
    }

    #[test]
    fn too_small_dimensions_are_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            generate(6, 4, &mut rng),
            Err(MazeError::InvalidDimensions {
                width: 5,
                height: 3
            })
        );
        assert!(generate(4, 9, &mut rng).is_err());
        assert!(generate(5, 5, &mut rng).is_ok());
    }

    #[test]
    fn border_stays_solid_and_start_pocket_is_open() {
        let mut rng = StdRng::seed_from_u64(99);
        let maze = generate(31, 21, &mut rng).unwrap();
        for x in 0..maze.width() {
            assert_eq!(maze.tile(Pos::new(x, 0)), Some(Tile::Wall));
            assert_eq!(maze.tile(Pos::new(x, maze.height() - 1)), Some(Tile::Wall));
        }
        for y in 0..maze.height() {
            assert_eq!(maze.tile(Pos::new(0, y)), Some(Tile::Wall));
            assert_eq!(maze.tile(Pos::new(maze.width() - 1, y)), Some(Tile::Wall));
        }
        assert!(maze.is_open(Pos::new(1, 1)));
        assert!(maze.is_open(Pos::new(2, 1)));
        assert!(maze.is_open(Pos::new(1, 2)));
    }

    #[test]
    fn every_lattice_cell_is_carved() {
        let mut rng = StdRng::seed_from_u64(3);
        let maze = generate(15, 9, &mut rng).unwrap();
        for y in (1..maze.height()).step_by(2) {
            for x in (1..maze.width()).step_by(2) {
                assert!(maze.is_open(Pos::new(x, y)), "({x},{y}) left as wall");
            }
        }
    }

    #[test]
    fn same_seed_same_maze() {
        let a = generate(25, 15, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = generate(25, 15, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn goal_lands_on_the_farthest_cell() {
        let mut maze = Maze::from_ascii(&["#######", "#.....#", "#######"]).unwrap();
        let goal = maze.place_goal_farthest(Pos::new(1, 1)).unwrap();
        assert_eq!(goal, Pos::new(5, 1));
        assert!(maze.is_goal(goal));
        assert!(maze.is_open(goal));
    }

    #[test]
    fn ragged_ascii_is_rejected() {
        assert!(Maze::from_ascii(&["###", "##"]).is_err());
        assert!(Maze::from_ascii(&[]).is_err());
    }
}
