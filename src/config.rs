//! Tunables for the simulation.
//!
//! Everything is expressed in a 576x1024 design space; [`GameConfig::for_world`]
//! rescales positions and speeds for a differently sized world.

use std::time::Duration;

// ── Design space ────────────────────────────────────────────────────────────

pub const BASE_WIDTH: f64 = 576.0;
pub const BASE_HEIGHT: f64 = 1024.0;

pub const FPS: u32 = 120;
pub const GRAVITY: f64 = 0.25;
pub const FLAP_STRENGTH: f64 = 8.0;
pub const PIPE_SPAWN_PERIOD: Duration = Duration::from_millis(1200);
pub const WING_PERIOD: Duration = Duration::from_millis(200);
pub const PIPE_GAP: f64 = 300.0;
pub const PIPE_SPEED: f64 = 4.0;

pub const BIRD_X: f64 = 100.0;
pub const BIRD_Y: f64 = 512.0;
pub const BIRD_W: f64 = 68.0;
pub const BIRD_H: f64 = 48.0;

pub const PIPE_W: f64 = 104.0;
pub const PIPE_H: f64 = 640.0;
pub const PIPE_SPAWN_X: f64 = 700.0;
pub const PIPE_ANCHORS: [f64; 3] = [400.0, 600.0, 800.0];

pub const FLOOR_Y: f64 = 900.0;
pub const CEILING_Y: f64 = -100.0;

/// How long the debug overlay keeps showing the last logged event.
pub const DEBUG_OVERLAY_MS: u64 = 1000;

// ── Runtime config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameConfig {
    pub width: f64,
    pub height: f64,
    pub gravity: f64,
    pub flap_strength: f64,
    pub pipe_gap: f64,
    pub pipe_speed: f64,
    pub bird_x: f64,
    pub bird_y: f64,
    pub bird_w: f64,
    pub bird_h: f64,
    pub pipe_w: f64,
    pub pipe_h: f64,
    pub pipe_spawn_x: f64,
    pub pipe_anchors: [f64; 3],
    pub floor_y: f64,
    pub ceiling_y: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: BASE_WIDTH,
            height: BASE_HEIGHT,
            gravity: GRAVITY,
            flap_strength: FLAP_STRENGTH,
            pipe_gap: PIPE_GAP,
            pipe_speed: PIPE_SPEED,
            bird_x: BIRD_X,
            bird_y: BIRD_Y,
            bird_w: BIRD_W,
            bird_h: BIRD_H,
            pipe_w: PIPE_W,
            pipe_h: PIPE_H,
            pipe_spawn_x: PIPE_SPAWN_X,
            pipe_anchors: PIPE_ANCHORS,
            floor_y: FLOOR_Y,
            ceiling_y: CEILING_Y,
        }
    }
}

impl GameConfig {
    /// Scales the design-space layout to a `width` x `height` world.
    ///
    /// Horizontal positions and pipe speed follow the width, vertical ones
    /// the height. Sprite sizes follow the height so they keep their
    /// proportions. Gravity, flap strength and the pipe gap are per-tick
    /// constants and are left alone.
    pub fn for_world(width: f64, height: f64) -> Self {
        let sx = width / BASE_WIDTH;
        let sy = height / BASE_HEIGHT;
        Self {
            width,
            height,
            gravity: GRAVITY,
            flap_strength: FLAP_STRENGTH,
            pipe_gap: PIPE_GAP,
            pipe_speed: PIPE_SPEED * sx,
            bird_x: BIRD_X * sx,
            bird_y: BIRD_Y * sy,
            bird_w: BIRD_W * sy,
            bird_h: BIRD_H * sy,
            pipe_w: PIPE_W * sy,
            pipe_h: PIPE_H * sy,
            pipe_spawn_x: PIPE_SPAWN_X * sx,
            pipe_anchors: PIPE_ANCHORS.map(|a| a * sy),
            floor_y: FLOOR_Y * sy,
            ceiling_y: CEILING_Y * sy,
        }
    }
}

/// Parses a `WIDTHxHEIGHT` world size.
pub fn parse_world(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w: f64 = w.trim().parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
    let h: f64 = h.trim().parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
    if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
        return Err(format!("world size must be positive, got {w}x{h}"));
    }
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_world_matches_default() {
        assert_eq!(GameConfig::for_world(BASE_WIDTH, BASE_HEIGHT), GameConfig::default());
    }

    #[test]
    fn pipe_speed_follows_width() {
        let cfg = GameConfig::for_world(BASE_WIDTH * 2.0, BASE_HEIGHT);
        assert_eq!(cfg.pipe_speed, PIPE_SPEED * 2.0);
        assert_eq!(cfg.floor_y, FLOOR_Y);
        assert_eq!(cfg.gravity, GRAVITY);
    }

    #[test]
    fn world_parsing() {
        assert_eq!(parse_world("1152x2048"), Ok((1152.0, 2048.0)));
        assert!(parse_world("1152").is_err());
        assert!(parse_world("0x10").is_err());
    }
}
