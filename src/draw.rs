//! Software renderer drawing a `GameState` into an RGBA frame buffer.

use crate::entity::{EntityKind, Rect};
use crate::game::GameState;
use crate::perceptron::Features;

type Rgba = (u8, u8, u8, u8);

const BACKGROUND: Rgba = (247, 247, 247, 255);
const MIDGROUND: Rgba = (218, 218, 218, 255);
const FOREGROUND: Rgba = (83, 83, 83, 255);
const FLYER: Rgba = (120, 120, 150, 255);
const HITBOX: Rgba = (255, 0, 0, 255);
const BANNER: Rgba = (200, 60, 60, 255);

/// Extra lines shown in the corner overlay.
#[derive(Debug, Clone, Default)]
pub struct Hud {
    pub deaths: Option<u32>,
    pub weights: Option<Features>,
}

pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self { frame, width, height }
    }

    pub fn clear(&mut self, col: Rgba) {
        for px in self.frame.chunks_exact_mut(4) {
            px.copy_from_slice(&[col.0, col.1, col.2, col.3]);
        }
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, col: Rgba) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        let Some(px) = self.frame.get_mut(idx..idx + 4) else {
            return;
        };
        let a = col.3 as u16;
        let ia = 255 - a;
        for (dst, src) in px.iter_mut().zip([col.0, col.1, col.2]) {
            *dst = ((src as u16 * a + *dst as u16 * ia) / 255) as u8;
        }
        px[3] = 255;
    }

    pub fn fill_rect(&mut self, rect: &Rect, col: Rgba) {
        let (x0, y0) = (rect.left.round() as i32, rect.top().round() as i32);
        let (x1, y1) = (rect.right().round() as i32, rect.bottom.round() as i32);
        for y in y0.max(0)..y1.min(self.height as i32) {
            for x in x0.max(0)..x1.min(self.width as i32) {
                self.blend_pixel(x, y, col);
            }
        }
    }

    pub fn stroke_rect(&mut self, rect: &Rect, col: Rgba) {
        let (x0, y0) = (rect.left.round() as i32, rect.top().round() as i32);
        let (x1, y1) = (rect.right().round() as i32 - 1, rect.bottom.round() as i32 - 1);
        if x1 < x0 || y1 < y0 {
            return;
        }
        for x in x0..=x1 {
            self.blend_pixel(x, y0, col);
            self.blend_pixel(x, y1, col);
        }
        for y in y0..=y1 {
            self.blend_pixel(x0, y, col);
            self.blend_pixel(x1, y, col);
        }
    }

    pub fn hline(&mut self, y: i32, col: Rgba) {
        for x in 0..self.width as i32 {
            self.blend_pixel(x, y, col);
        }
    }

    /// Draw `text` in the 5x7 bitmap font; returns the pen position after it.
    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, scale: i32, col: Rgba) -> i32 {
        let mut cx = x;
        for ch in text.chars() {
            if let Some(rows) = glyph_5x7(ch) {
                for (ry, row) in rows.iter().enumerate() {
                    for rx in 0..5 {
                        if (row >> (4 - rx)) & 1 == 1 {
                            for sy in 0..scale {
                                for sx in 0..scale {
                                    self.blend_pixel(cx + rx * scale + sx, y + ry as i32 * scale + sy, col);
                                }
                            }
                        }
                    }
                }
            }
            cx += 6 * scale;
        }
        cx
    }

    pub fn text_width(text: &str, scale: i32) -> i32 {
        text.chars().count() as i32 * 6 * scale
    }
}

pub fn draw_scene(canvas: &mut Canvas<'_>, state: &GameState, hud: &Hud) {
    canvas.clear(BACKGROUND);

    let ground = state.ground_level.round() as i32;
    canvas.hline(ground, MIDGROUND);
    canvas.hline(ground + 1, MIDGROUND);

    canvas.fill_rect(&state.runner.rect, FOREGROUND);
    for obstacle in state.active_obstacles() {
        let col = if obstacle.kind == EntityKind::Flying { FLYER } else { FOREGROUND };
        canvas.fill_rect(&obstacle.rect, col);
    }

    if state.show_hitboxes {
        canvas.hline(ground, HITBOX);
        canvas.stroke_rect(&state.runner.hitbox(), HITBOX);
        for obstacle in state.active_obstacles() {
            canvas.stroke_rect(&obstacle.hitbox(), HITBOX);
        }
    }

    draw_hud(canvas, state, hud);

    if !state.playing {
        let msg = "GAME OVER";
        let x = (canvas.width as i32 - Canvas::text_width(msg, 3)) / 2;
        canvas.draw_text(msg, x, canvas.height as i32 / 3, 3, BANNER);
    }
}

fn draw_hud(canvas: &mut Canvas<'_>, state: &GameState, hud: &Hud) {
    let mut y = 6;
    canvas.draw_text(&format!("SCORE: {}", state.score), 6, y, 2, FOREGROUND);
    y += 18;
    canvas.draw_text(&format!("SPEED: {:.1}", state.game_speed), 6, y, 1, FOREGROUND);
    y += 10;
    if let Some(deaths) = hud.deaths {
        canvas.draw_text(&format!("DEATHS: {deaths}"), 6, y, 1, FOREGROUND);
        y += 10;
    }
    if let Some(w) = hud.weights {
        let line = w.iter().map(|v| format!("{v:.4}")).collect::<Vec<_>>().join(" ");
        canvas.draw_text(&format!("W: {line}"), 6, y, 1, FOREGROUND);
        y += 10;
    }
    if state.paused_for_learning {
        canvas.draw_text("LEARNING PAUSED", 6, y, 1, BANNER);
    }
}

fn glyph_5x7(ch: char) -> Option<[u8; 7]> {
    Some(match ch.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b11110, 0b10001, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
        'H' => [0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001, 0b10001],
        'I' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b11111],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b11011, 0b10001],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ':' => [0b00000, 0b00100, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        _ => return None,
    })
}
