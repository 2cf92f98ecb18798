use crossterm::{
    cursor, queue,
    style::{self, Color as CColor},
};
use std::io::{self, Write};

use crate::game::GameState;
use crate::geometry::Rect;
use crate::physics::PipeSide;

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    const fn lerp(a: Rgb, b: Rgb, t_256: u16) -> Rgb {
        let t = t_256 as i32;
        Rgb(
            (a.0 as i32 + (b.0 as i32 - a.0 as i32) * t / 256) as u8,
            (a.1 as i32 + (b.1 as i32 - a.1 as i32) * t / 256) as u8,
            (a.2 as i32 + (b.2 as i32 - a.2 as i32) * t / 256) as u8,
        )
    }

    fn term(self) -> CColor {
        CColor::Rgb {
            r: self.0,
            g: self.1,
            b: self.2,
        }
    }
}

const SKY_TOP: Rgb = Rgb(70, 180, 200);
const SKY_BOT: Rgb = Rgb(190, 232, 245);
const GRASS: Rgb = Rgb(84, 168, 55);
const GRASS_LIGHT: Rgb = Rgb(110, 200, 70);
const DIRT: Rgb = Rgb(210, 185, 110);
const DIRT_DARK: Rgb = Rgb(185, 160, 90);
const PIPE_L: Rgb = Rgb(74, 122, 26);
const PIPE_M: Rgb = Rgb(100, 170, 40);
const PIPE_R: Rgb = Rgb(115, 191, 46);
const PIPE_HI: Rgb = Rgb(145, 215, 62);
const CAP_DARK: Rgb = Rgb(60, 100, 20);
const BIRD_Y: Rgb = Rgb(245, 200, 66);
const BIRD_HI: Rgb = Rgb(255, 225, 100);
const BIRD_WING: Rgb = Rgb(215, 165, 35);
const BIRD_EYE: Rgb = Rgb(255, 255, 255);
const BIRD_PUPIL: Rgb = Rgb(20, 20, 20);
const BIRD_BEAK: Rgb = Rgb(225, 75, 35);
const BIRD_BEAK_HI: Rgb = Rgb(240, 110, 50);
const HILL_FAR: Rgb = Rgb(120, 195, 75);
const HILL_NEAR: Rgb = Rgb(95, 175, 55);
const WHITE: Rgb = Rgb(255, 255, 255);
const SHADOW: Rgb = Rgb(30, 30, 30);
const OVERLAY_FG: Rgb = Rgb(255, 255, 0);

// ── Pixel buffer with half-block rendering ──────────────────────────────────

pub struct PixelBuf {
    w: usize,
    h: usize, // pixel height = terminal rows * 2
    px: Vec<Rgb>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![SKY_TOP; w * h],
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.resize(w * h, SKY_TOP);
    }

    pub fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    /// Fills the part of the rectangle that lies inside the buffer.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.w as i32);
        let y1 = (y + h).min(self.h as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                self.px[py as usize * self.w + px as usize] = c;
            }
        }
    }

    fn render(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        let mut prev_fg = Rgb(0, 0, 0);
        let mut prev_bg = Rgb(0, 0, 0);
        let mut need_fg = true;
        let mut need_bg = true;

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);

                if top == bot {
                    if need_bg || prev_bg != top {
                        queue!(out, style::SetBackgroundColor(top.term()))?;
                        prev_bg = top;
                        need_bg = false;
                    }
                    queue!(out, style::Print(' '))?;
                } else {
                    if need_fg || prev_fg != top {
                        queue!(out, style::SetForegroundColor(top.term()))?;
                        prev_fg = top;
                        need_fg = false;
                    }
                    if need_bg || prev_bg != bot {
                        queue!(out, style::SetBackgroundColor(bot.term()))?;
                        prev_bg = bot;
                        need_bg = false;
                    }
                    queue!(out, style::Print('\u{2580}'))?; // ▀
                }
            }
            if row + 1 < rows {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                need_fg = true;
                need_bg = true;
            }
        }
        queue!(out, style::ResetColor)
    }
}

// ── 3x5 bitmap digits ──────────────────────────────────────────────────────

#[rustfmt::skip]
const DIGITS: [[u8; 15]; 10] = [
    [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // 0
    [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1], // 1
    [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1], // 2
    [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1], // 3
    [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1], // 4
    [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1], // 5
    [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1], // 6
    [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0], // 7
    [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1], // 8
    [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1], // 9
];

fn draw_digit(buf: &mut PixelBuf, x: i32, y: i32, d: u8, fg: Rgb) {
    let glyph = &DIGITS[d as usize];
    for row in 0..5 {
        for col in 0..3 {
            if glyph[row * 3 + col] == 1 {
                let px = x + col as i32;
                let py = y + row as i32;
                buf.set(px + 1, py + 1, SHADOW);
                buf.set(px, py, fg);
            }
        }
    }
}

/// Width in pixels of `n` drawn with [`draw_number`].
fn number_width(n: u32) -> i32 {
    n.to_string().len() as i32 * 4 - 1 // 3px per digit + 1px spacing
}

fn draw_number(buf: &mut PixelBuf, cx: i32, y: i32, n: u32, fg: Rgb) {
    let start_x = cx - number_width(n) / 2;
    for (i, ch) in n.to_string().bytes().enumerate() {
        draw_digit(buf, start_x + i as i32 * 4, y, ch - b'0', fg);
    }
}

fn pipe_shade(x: i32, total_w: i32) -> Rgb {
    if total_w <= 1 {
        return PIPE_M;
    }
    let t = (x.clamp(0, total_w - 1) as f64 / (total_w - 1) as f64 * 256.0) as u16;
    if t < 64 {
        Rgb::lerp(PIPE_L, PIPE_M, (t * 4).min(256))
    } else if t < 100 {
        Rgb::lerp(PIPE_M, PIPE_HI, ((t - 64) * 7).min(256))
    } else if t < 160 {
        Rgb::lerp(PIPE_HI, PIPE_R, ((t - 100) * 4).min(256))
    } else {
        Rgb::lerp(PIPE_R, PIPE_L, ((t - 160) * 3).min(256))
    }
}

// ── Scene ───────────────────────────────────────────────────────────────────

/// World-to-pixel mapping for the current buffer size.
#[derive(Debug, Clone, Copy)]
struct View {
    sx: f64,
    sy: f64,
}

impl View {
    fn x(&self, x: f64) -> i32 {
        (x * self.sx).floor() as i32
    }

    fn y(&self, y: f64) -> i32 {
        (y * self.sy).floor() as i32
    }

    /// Pixel rectangle `(x, y, w, h)` covering a world rectangle.
    fn rect(&self, r: &Rect) -> (i32, i32, i32, i32) {
        let x0 = self.x(r.left());
        let y0 = self.y(r.top());
        let x1 = (r.right() * self.sx).ceil() as i32;
        let y1 = (r.bottom() * self.sy).ceil() as i32;
        (x0, y0, (x1 - x0).max(1), (y1 - y0).max(1))
    }
}

pub struct Renderer {
    buf: PixelBuf,
    ground_x: f64,
}

impl Renderer {
    /// `cols` x `rows` terminal cells; each cell holds two vertical pixels.
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            buf: PixelBuf::new(cols as usize, rows as usize * 2),
            ground_x: 0.0,
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.buf.resize(cols as usize, rows as usize * 2);
    }

    fn view(&self, state: &GameState) -> View {
        View {
            sx: self.buf.w as f64 / state.config.width,
            sy: self.buf.h as f64 / state.config.height,
        }
    }

    /// Pixels per world unit of bird height, so sprite details keep proportions.
    fn bird_scale(&self, state: &GameState) -> f64 {
        (state.config.bird_h * self.view(state).sy / 4.0).max(0.5)
    }

    /// Draws one frame. `wing_frame` cycles 0..3 on the wing timer.
    pub fn draw(&mut self, state: &GameState, wing_frame: u8) {
        let view = self.view(state);
        // The ground keeps scrolling whether or not an attempt is running.
        self.ground_x += view.sx;
        if self.ground_x > 1e6 {
            self.ground_x = 0.0;
        }

        self.draw_sky(state, view);
        self.draw_hills(state, view);
        self.draw_pipes(state, view);
        self.draw_ground(state, view);
        self.draw_bird(state, view, wing_frame);

        let session = &state.session;
        if session.active {
            let cx = self.buf.w as i32 / 2;
            draw_number(&mut self.buf, cx, 4, state.score(), WHITE);
        } else if session.attempt_id == 0 {
            self.draw_title();
        } else {
            self.draw_game_over(state);
        }
    }

    fn sky_h(&self, state: &GameState, view: View) -> i32 {
        view.y(state.config.floor_y).clamp(0, self.buf.h as i32)
    }

    fn draw_sky(&mut self, state: &GameState, view: View) {
        let sky_h = self.sky_h(state, view).max(1) as u32;
        for y in 0..self.buf.h as i32 {
            let t = ((y.max(0) as u32).min(sky_h) * 256 / sky_h) as u16;
            let c = Rgb::lerp(SKY_TOP, SKY_BOT, t);
            self.buf.fill_rect(0, y, self.buf.w as i32, 1, c);
        }
    }

    fn draw_hills(&mut self, state: &GameState, view: View) {
        let base = self.sky_h(state, view);
        let scale = self.buf.h as f64 / 48.0;
        // Far hills
        for x in 0..self.buf.w as i32 {
            let fx = (x as f64 + self.ground_x * 0.2) * 0.04;
            let h = (fx.sin() * 6.0 + (fx * 1.7).sin() * 3.0) * scale;
            let top = base - h as i32 - (4.0 * scale) as i32;
            self.buf.fill_rect(x, top, 1, base - top, HILL_FAR);
        }
        // Near hills
        for x in 0..self.buf.w as i32 {
            let fx = (x as f64 + self.ground_x * 0.4) * 0.06;
            let h = (fx.sin() * 4.0 + (fx * 2.3).sin() * 2.0) * scale;
            let top = base - h as i32 - (2.0 * scale) as i32;
            self.buf.fill_rect(x, top, 1, base - top, HILL_NEAR);
        }
    }

    fn draw_ground(&mut self, state: &GameState, view: View) {
        let gy = self.sky_h(state, view);
        let w = self.buf.w as i32;
        // Grass strip
        for x in 0..w {
            let alt = ((x as f64 + self.ground_x) as i32 / 3) % 2 == 0;
            self.buf.set(x, gy, if alt { GRASS } else { GRASS_LIGHT });
            self.buf.set(x, gy + 1, GRASS);
        }
        // Dirt
        for y in (gy + 2)..self.buf.h as i32 {
            for x in 0..w {
                let stripe = ((x as f64 + self.ground_x * 0.8) as i32 + (y - gy) * 2) % 12 < 6;
                self.buf.set(x, y, if stripe { DIRT } else { DIRT_DARK });
            }
        }
    }

    fn draw_pipes(&mut self, state: &GameState, view: View) {
        let scale = self.buf.h as f64 / 48.0;
        let cap_extra = (scale).max(1.0) as i32;
        let cap_h = (2.0 * scale).max(1.0) as i32;

        for pipe in &state.pipes {
            let (px, py, pw, ph) = view.rect(&pipe.rect);
            let (body_y, body_h, cap_y) = match pipe.side {
                // The cap sits at the mouth of the pipe, facing the gap.
                PipeSide::Top => (py, ph - cap_h, py + ph - cap_h),
                PipeSide::Bottom => (py + cap_h, ph - cap_h, py),
            };

            for x in 0..pw {
                self.buf.fill_rect(px + x, body_y, 1, body_h, pipe_shade(x, pw));
            }
            for x in -cap_extra..(pw + cap_extra) {
                let c = pipe_shade(x + cap_extra, pw + cap_extra * 2);
                self.buf.fill_rect(px + x, cap_y, 1, cap_h, c);
                // Cap edge darkening
                self.buf.set(px + x, cap_y, CAP_DARK);
                self.buf.set(px + x, cap_y + cap_h - 1, CAP_DARK);
            }
        }
    }

    fn draw_bird(&mut self, state: &GameState, view: View, wing_frame: u8) {
        let bird = &state.bird;
        let cx = view.x(bird.x);
        let cy = view.y(bird.y);
        let s = self.bird_scale(state);
        let buf = &mut self.buf;

        // Nose up while rising, down while falling.
        let tilt = (bird.vy / state.config.flap_strength.max(1.0)).clamp(-1.0, 1.0).round() as i32;

        // Body core
        let bw = (3.0 * s).max(2.0) as i32;
        let bh = (2.0 * s).max(2.0) as i32;
        buf.fill_rect(cx - bw, cy - bh, bw * 2 + 1, bh * 2, BIRD_Y);

        // Highlight (top of body)
        buf.fill_rect(cx - bw + 1, cy - bh, bw * 2 - 2, 1i32.max((s * 0.8) as i32), BIRD_HI);

        // Wing: down, mid, up
        let wing_y_off = wing_frame as i32 % 3 - 1;
        let wing_h = (1.5 * s).max(1.0) as i32;
        let wing_w = (2.0 * s).max(1.0) as i32;
        buf.fill_rect(cx - bw + 1, cy - wing_y_off + tilt, wing_w, wing_h, BIRD_WING);

        // Eye
        let ex = cx + bw - (1.5 * s) as i32;
        let ey = cy - bh + (1.0 * s).max(1.0) as i32;
        let eye_r = (0.8 * s).max(1.0) as i32;
        buf.fill_rect(ex, ey, eye_r + 1, eye_r + 1, BIRD_EYE);
        buf.set(ex + eye_r, ey + eye_r, BIRD_PUPIL);
        if s >= 1.5 {
            buf.set(ex + eye_r - 1, ey + eye_r, BIRD_PUPIL);
        }

        // Beak
        let beak_x = cx + bw;
        let beak_y = cy - (0.5 * s) as i32 + tilt;
        let beak_w = (2.5 * s).max(2.0) as i32;
        let beak_h = (1.5 * s).max(1.0) as i32;
        buf.fill_rect(beak_x, beak_y, beak_w, beak_h / 2 + 1, BIRD_BEAK_HI);
        buf.fill_rect(beak_x, beak_y + beak_h / 2 + 1, beak_w, beak_h / 2, BIRD_BEAK);

        // Tail
        let tail_w = (1.5 * s).max(1.0) as i32;
        buf.fill_rect(cx - bw - tail_w, cy - 1 - tilt, tail_w, 2, BIRD_WING);
    }

    fn draw_title(&mut self) {
        let scale = (self.buf.h as f64 / 48.0).max(0.5);
        let cx = self.buf.w as i32 / 2;
        let cy = self.buf.h as i32 / 4;
        // "FLAPPY" in big blocky letters
        let char_w = (4.0 * scale).max(2.0) as i32;
        let char_h = (6.0 * scale).max(3.0) as i32;
        let sx = cx - 6 * char_w / 2;
        for i in 0..6 {
            let bx = sx + i * char_w;
            self.buf.fill_rect(bx, cy, char_w - 1, char_h, BIRD_Y);
            self.buf.fill_rect(bx, cy, char_w - 1, 1, BIRD_HI);
        }

        // "SPACE TO FLAP" as a row of blocks
        let sub_y = cy + char_h + 4;
        let msg = "SPACE TO FLAP";
        let msg_x = cx - msg.len() as i32 * 2;
        for (i, ch) in msg.chars().enumerate() {
            if ch != ' ' {
                self.buf.fill_rect(msg_x + i as i32 * 4, sub_y, 3, 3, WHITE);
            }
        }
    }

    fn draw_game_over(&mut self, state: &GameState) {
        let scale = (self.buf.h as f64 / 48.0).max(0.5);
        let cx = self.buf.w as i32 / 2;
        let cy = self.buf.h as i32 / 2;
        let panel_w = (40.0 * scale).max(30.0) as i32;
        let panel_h = (20.0 * scale).max(16.0) as i32;

        // Dark overlay
        for y in 0..self.buf.h {
            for x in 0..self.buf.w {
                let c = self.buf.get(x, y);
                self.buf.set(x as i32, y as i32, Rgb(c.0 / 2, c.1 / 2, c.2 / 2));
            }
        }

        // Panel background
        let px = cx - panel_w / 2;
        let py = cy - panel_h / 2;
        self.buf.fill_rect(px - 1, py - 1, panel_w + 2, panel_h + 2, SHADOW);
        self.buf.fill_rect(px, py, panel_w, panel_h, DIRT);
        self.buf.fill_rect(px + 1, py + 1, panel_w - 2, panel_h - 2, Rgb(220, 195, 120));

        draw_number(&mut self.buf, cx, py + 4, state.score(), WHITE);
        draw_number(&mut self.buf, cx, py + 12, state.high_score(), BIRD_Y);
    }

    /// Writes the frame to the terminal, with an optional text line in the
    /// top-left corner.
    pub fn present(&self, out: &mut impl Write, overlay: Option<&str>) -> io::Result<()> {
        self.buf.render(out)?;
        if let Some(text) = overlay {
            let max = self.buf.w.saturating_sub(2);
            let text: String = text.chars().take(max).collect();
            queue!(
                out,
                cursor::MoveTo(1, 1),
                style::SetForegroundColor(OVERLAY_FG.term()),
                style::SetBackgroundColor(CColor::Black),
                style::Print(text),
                style::ResetColor
            )?;
        }
        out.flush()
    }
}
