//! Bird and pipe motion.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::GameConfig;
use crate::geometry::Rect;

// ── Bird ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bird {
    pub x: f64,
    pub y: f64,
    pub vy: f64,
    pub w: f64,
    pub h: f64,
}

impl Bird {
    pub fn new(cfg: &GameConfig) -> Self {
        Self {
            x: cfg.bird_x,
            y: cfg.bird_y,
            vy: 0.0,
            w: cfg.bird_w,
            h: cfg.bird_h,
        }
    }

    pub fn reset(&mut self, cfg: &GameConfig) {
        *self = Bird::new(cfg);
    }

    /// Absolute impulse: the previous velocity is discarded.
    pub fn flap(&mut self, cfg: &GameConfig) {
        self.vy = -cfg.flap_strength;
    }

    pub fn fall(&mut self, cfg: &GameConfig) {
        self.vy += cfg.gravity;
        self.y += self.vy;
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.x, self.y, self.w, self.h)
    }
}

// ── Pipes ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeSide {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pipe {
    pub rect: Rect,
    pub side: PipeSide,
}

/// Builds the bottom and top pipe of one obstacle, bottom first.
///
/// The bottom pipe hangs from `anchor`; the top pipe ends `pipe_gap` above it.
pub fn pipe_pair(cfg: &GameConfig, anchor: f64) -> [Pipe; 2] {
    let x = cfg.pipe_spawn_x;
    [
        Pipe {
            rect: Rect::from_midtop(x, anchor, cfg.pipe_w, cfg.pipe_h),
            side: PipeSide::Bottom,
        },
        Pipe {
            rect: Rect::from_midbottom(x, anchor - cfg.pipe_gap, cfg.pipe_w, cfg.pipe_h),
            side: PipeSide::Top,
        },
    ]
}

/// Moves every pipe left by one tick and drops those that have fully left
/// the screen.
pub fn advance_pipes(pipes: &mut Vec<Pipe>, speed: f64) {
    for p in pipes.iter_mut() {
        p.rect.x -= speed;
    }
    pipes.retain(|p| p.rect.right() >= 0.0);
}

/// Picks pipe anchors uniformly from the configured candidates.
pub struct PipeSpawner {
    rng: StdRng,
}

impl PipeSpawner {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    pub fn next_anchor(&mut self, cfg: &GameConfig) -> f64 {
        let i = self.rng.random_range(0..cfg.pipe_anchors.len());
        cfg.pipe_anchors[i]
    }
}
