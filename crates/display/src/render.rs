use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use pipeline::{LogEntry, PlayerView, Snapshot, BTN_A, BTN_B, BTN_C, BTN_D};

use crate::text::{draw_text, text_width, write_pixel, LINE_ADVANCE};

const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];
const TEXT_PRIMARY_COLOR: [u8; 4] = [244, 248, 252, 255];
const TEXT_DIM_COLOR: [u8; 4] = [176, 198, 220, 255];
const PAD_OUTLINE_COLOR: [u8; 4] = [52, 58, 70, 255];
const TRAJECTORY_COLOR: [u8; 4] = [230, 70, 230, 255];
const CURRENT_DOT_COLOR: [u8; 4] = [235, 64, 52, 255];
const PANEL_PADDING: i32 = 18;
const PAD_HALF_SIZE: i32 = 60;
const PAD_OFFSET_SCALE: i32 = 40;
const PAD_BOTTOM_MARGIN: i32 = 150;
const CURRENT_DOT_RADIUS: i32 = 6;
const BUTTON_RADIUS: i32 = 10;
const BUTTON_SPACING: i32 = 30;

/// Count value at which a run is shown as the saturation marker.
const RUN_COUNT_SATURATED: u16 = 1000;
const RUN_COUNT_SATURATED_TEXT: &str = "LOT";

const BUTTON_MASKS: [u8; 4] = [BTN_A, BTN_B, BTN_C, BTN_D];
const BUTTON_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];
const BUTTON_COLORS: [[u8; 4]; 4] = [
    [230, 60, 60, 255],
    [240, 200, 60, 255],
    [120, 220, 80, 255],
    [110, 190, 240, 255],
];

/// Short label per 4-bit direction index; opposite held directions cancel to
/// the neutral dot, matching the offsets below.
const DIRECTION_LABELS: [&str; 16] = [
    ".", "UP", "DN", ".", "LT", "UL", "DL", "LT", "RT", "UR", "DR", "RT", ".", "UP", "DN", ".",
];

/// Unit pad offset per direction index, screen coordinates (y grows down).
const DIRECTION_OFFSETS: [(i32, i32); 16] = [
    (0, 0),
    (0, -1),
    (0, 1),
    (0, 0),
    (-1, 0),
    (-1, -1),
    (-1, 1),
    (-1, 0),
    (1, 0),
    (1, -1),
    (1, 1),
    (1, 0),
    (0, 0),
    (0, -1),
    (0, 1),
    (0, 0),
];

pub struct Renderer {
    window: &'static Window,
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
}

impl Renderer {
    pub fn new(window: &'static Window) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(window, size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            width: size.width,
            height: size.height,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(self.window, width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn build_pixels(window: &'static Window, width: u32, height: u32) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn render(&mut self, snapshot: &Snapshot, fps: f32) -> Result<(), Error> {
        let (width, height) = (self.width, self.height);
        let frame = self.pixels.frame_mut();

        for pixel in frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&CLEAR_COLOR);
        }

        let width_i32 = width as i32;
        let height_i32 = height as i32;

        draw_player_panel(
            frame,
            width,
            height,
            &snapshot.players[0],
            "P1",
            PanelSide::Left,
        );
        draw_player_panel(
            frame,
            width,
            height,
            &snapshot.players[1],
            "P2",
            PanelSide::Right,
        );

        let pad_y = height_i32 - PAD_BOTTOM_MARGIN;
        draw_stick_pad(frame, width, height, &snapshot.players[0], width_i32 / 4, pad_y);
        draw_stick_pad(
            frame,
            width,
            height,
            &snapshot.players[1],
            width_i32 * 3 / 4,
            pad_y,
        );

        if snapshot.show_debug {
            let line = format!("FPS:{:03}", (fps.max(0.0) as u32).min(999));
            let x = (width_i32 - text_width(&line)) / 2;
            draw_text(frame, width, height, x, PANEL_PADDING, &line, TEXT_DIM_COLOR);
        }

        self.pixels.render()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanelSide {
    Left,
    Right,
}

fn draw_player_panel(
    frame: &mut [u8],
    width: u32,
    height: u32,
    view: &PlayerView,
    header: &str,
    side: PanelSide,
) {
    let line_x = |line: &str| match side {
        PanelSide::Left => PANEL_PADDING,
        PanelSide::Right => width as i32 - PANEL_PADDING - text_width(line),
    };

    let mut y = PANEL_PADDING;
    draw_text(frame, width, height, line_x(header), y, header, TEXT_DIM_COLOR);
    y += LINE_ADVANCE;

    if !view.visible {
        return;
    }

    for entry in &view.history {
        let line = format_log_line(entry);
        draw_text(frame, width, height, line_x(&line), y, &line, TEXT_PRIMARY_COLOR);
        y += LINE_ADVANCE;
    }
}

fn draw_stick_pad(
    frame: &mut [u8],
    width: u32,
    height: u32,
    view: &PlayerView,
    center_x: i32,
    center_y: i32,
) {
    draw_rect_outline(
        frame,
        width,
        height,
        center_x - PAD_HALF_SIZE,
        center_y - PAD_HALF_SIZE,
        PAD_HALF_SIZE * 2,
        PAD_HALF_SIZE * 2,
        PAD_OUTLINE_COLOR,
    );

    let buttons_y = center_y + PAD_HALF_SIZE + BUTTON_RADIUS + 12;
    let buttons_left = center_x - BUTTON_SPACING * 3 / 2;
    let held_buttons = if view.visible {
        view.history.first().map(|entry| entry.button_index).unwrap_or(0)
    } else {
        0
    };
    for (slot, (mask, label)) in BUTTON_MASKS.iter().zip(BUTTON_LABELS).enumerate() {
        let button_x = buttons_left + slot as i32 * BUTTON_SPACING;
        let color = if held_buttons & mask != 0 {
            BUTTON_COLORS[slot]
        } else {
            dim_color(BUTTON_COLORS[slot])
        };
        draw_filled_circle(frame, width, height, button_x, buttons_y, BUTTON_RADIUS, color);
        draw_text(
            frame,
            width,
            height,
            button_x - 4,
            buttons_y + BUTTON_RADIUS + 6,
            &label.to_string(),
            TEXT_DIM_COLOR,
        );
    }

    if !view.visible {
        return;
    }

    // Oldest to newest so newer segments paint over faded older ones.
    let len = view.trajectory.len();
    for i in (1..len).rev() {
        let from = pad_point(center_x, center_y, view.trajectory[i]);
        let to = pad_point(center_x, center_y, view.trajectory[i - 1]);
        let fade = (len - i) as f32 / len as f32;
        draw_line(frame, width, height, from, to, fade_color(TRAJECTORY_COLOR, fade));
    }

    if let Some(&current) = view.trajectory.first() {
        let (x, y) = pad_point(center_x, center_y, current);
        draw_filled_circle(frame, width, height, x, y, CURRENT_DOT_RADIUS, CURRENT_DOT_COLOR);
    }
}

fn format_log_line(entry: &LogEntry) -> String {
    format!(
        "{} {} {}",
        format_run_count(entry),
        DIRECTION_LABELS[(entry.direction_index & 0xF) as usize],
        buttons_text(entry.button_index)
    )
}

fn format_run_count(entry: &LogEntry) -> String {
    if entry.is_capped(RUN_COUNT_SATURATED) {
        RUN_COUNT_SATURATED_TEXT.to_string()
    } else {
        format!("{:03}", entry.run_length)
    }
}

fn buttons_text(button_index: u8) -> String {
    let mut text = String::new();
    for (mask, label) in BUTTON_MASKS.iter().zip(BUTTON_LABELS) {
        if button_index & mask != 0 {
            text.push(label);
        }
    }
    if text.is_empty() {
        text.push('.');
    }
    text
}

fn pad_point(center_x: i32, center_y: i32, direction_index: u8) -> (i32, i32) {
    let (dx, dy) = DIRECTION_OFFSETS[(direction_index & 0xF) as usize];
    (
        center_x + dx * PAD_OFFSET_SCALE,
        center_y + dy * PAD_OFFSET_SCALE,
    )
}

fn dim_color(color: [u8; 4]) -> [u8; 4] {
    [color[0] / 4, color[1] / 4, color[2] / 4, 255]
}

fn fade_color(color: [u8; 4], fade: f32) -> [u8; 4] {
    let fade = fade.clamp(0.0, 1.0);
    [
        (color[0] as f32 * fade) as u8,
        (color[1] as f32 * fade) as u8,
        (color[2] as f32 * fade) as u8,
        255,
    ]
}

#[allow(clippy::too_many_arguments)]
fn draw_rect_outline(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    if rect_width <= 1 || rect_height <= 1 {
        return;
    }
    draw_filled_rect(frame, width, height, x, y, rect_width, 1, color);
    draw_filled_rect(frame, width, height, x, y + rect_height - 1, rect_width, 1, color);
    draw_filled_rect(frame, width, height, x, y, 1, rect_height, color);
    draw_filled_rect(frame, width, height, x + rect_width - 1, y, 1, rect_height, color);
}

#[allow(clippy::too_many_arguments)]
fn draw_filled_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = (x + rect_width).min(width as i32);
    let end_y = (y + rect_height).min(height as i32);
    if end_x <= start_x || end_y <= start_y {
        return;
    }

    let width_usize = width as usize;
    for py in start_y..end_y {
        for px in start_x..end_x {
            write_pixel(frame, width_usize, px as usize, py as usize, color);
        }
    }
}

fn draw_filled_circle(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center_x: i32,
    center_y: i32,
    radius: i32,
    color: [u8; 4],
) {
    let width_i32 = width as i32;
    let height_i32 = height as i32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let px = center_x + dx;
            let py = center_y + dy;
            if px < 0 || px >= width_i32 || py < 0 || py >= height_i32 {
                continue;
            }
            write_pixel(frame, width as usize, px as usize, py as usize, color);
        }
    }
}

fn draw_line(
    frame: &mut [u8],
    width: u32,
    height: u32,
    from: (i32, i32),
    to: (i32, i32),
    color: [u8; 4],
) {
    let (mut x, mut y) = from;
    let (x1, y1) = to;
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let step_x = if x < x1 { 1 } else { -1 };
    let step_y = if y < y1 { 1 } else { -1 };
    let mut error = dx + dy;

    let width_i32 = width as i32;
    let height_i32 = height as i32;
    loop {
        if x >= 0 && x < width_i32 && y >= 0 && y < height_i32 {
            write_pixel(frame, width as usize, x as usize, y as usize, color);
        }
        if x == x1 && y == y1 {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += step_x;
        }
        if doubled <= dx {
            error += dx;
            y += step_y;
        }
    }
}
