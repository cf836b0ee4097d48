//! Tiny 3x5 bitmap font for panel labels and counters. Uppercase letters,
//! digits and a little punctuation; anything else draws as a blank cell.

pub(crate) const GLYPH_WIDTH: i32 = 3;
pub(crate) const GLYPH_HEIGHT: i32 = 5;
pub(crate) const TEXT_SCALE: i32 = 3;
pub(crate) const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;
pub(crate) const LINE_ADVANCE: i32 = (GLYPH_HEIGHT + 2) * TEXT_SCALE;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Glyph {
    pub rows: [u8; GLYPH_HEIGHT as usize],
}

const SPACE_GLYPH: Glyph = Glyph {
    rows: [0, 0, 0, 0, 0],
};

/// Pixel width of a string at the current scale, without the trailing gap.
pub(crate) fn text_width(text: &str) -> i32 {
    let chars = text.chars().count() as i32;
    if chars == 0 {
        0
    } else {
        chars * GLYPH_ADVANCE - TEXT_SCALE
    }
}

pub(crate) fn draw_text(
    frame: &mut [u8],
    width: u32,
    height: u32,
    mut x: i32,
    y: i32,
    text: &str,
    color: [u8; 4],
) {
    for ch in text.chars() {
        draw_glyph(frame, width, height, x, y, glyph_for(ch), color);
        x += GLYPH_ADVANCE;
    }
}

fn draw_glyph(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    glyph: Glyph,
    color: [u8; 4],
) {
    if width == 0 || height == 0 {
        return;
    }
    let width_i32 = width as i32;
    let height_i32 = height as i32;

    for (row_index, row_bits) in glyph.rows.iter().enumerate() {
        let glyph_y = y + row_index as i32 * TEXT_SCALE;
        for col in 0..GLYPH_WIDTH {
            if (row_bits & (1 << (GLYPH_WIDTH - 1 - col))) == 0 {
                continue;
            }
            let glyph_x = x + col * TEXT_SCALE;
            for sy in 0..TEXT_SCALE {
                let pixel_y = glyph_y + sy;
                if pixel_y < 0 || pixel_y >= height_i32 {
                    continue;
                }
                for sx in 0..TEXT_SCALE {
                    let pixel_x = glyph_x + sx;
                    if pixel_x < 0 || pixel_x >= width_i32 {
                        continue;
                    }
                    write_pixel(frame, width as usize, pixel_x as usize, pixel_y as usize, color);
                }
            }
        }
    }
}

pub(crate) fn write_pixel(frame: &mut [u8], width: usize, x: usize, y: usize, color: [u8; 4]) {
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

fn glyph_for(ch: char) -> Glyph {
    match ch {
        '0' => Glyph {
            rows: [0b111, 0b101, 0b101, 0b101, 0b111],
        },
        '1' => Glyph {
            rows: [0b010, 0b110, 0b010, 0b010, 0b111],
        },
        '2' => Glyph {
            rows: [0b111, 0b001, 0b111, 0b100, 0b111],
        },
        '3' => Glyph {
            rows: [0b111, 0b001, 0b111, 0b001, 0b111],
        },
        '4' => Glyph {
            rows: [0b101, 0b101, 0b111, 0b001, 0b001],
        },
        '5' => Glyph {
            rows: [0b111, 0b100, 0b111, 0b001, 0b111],
        },
        '6' => Glyph {
            rows: [0b111, 0b100, 0b111, 0b101, 0b111],
        },
        '7' => Glyph {
            rows: [0b111, 0b001, 0b010, 0b010, 0b010],
        },
        '8' => Glyph {
            rows: [0b111, 0b101, 0b111, 0b101, 0b111],
        },
        '9' => Glyph {
            rows: [0b111, 0b101, 0b111, 0b001, 0b111],
        },
        'A' => Glyph {
            rows: [0b010, 0b101, 0b111, 0b101, 0b101],
        },
        'B' => Glyph {
            rows: [0b110, 0b101, 0b110, 0b101, 0b110],
        },
        'C' => Glyph {
            rows: [0b111, 0b100, 0b100, 0b100, 0b111],
        },
        'D' => Glyph {
            rows: [0b110, 0b101, 0b101, 0b101, 0b110],
        },
        'E' => Glyph {
            rows: [0b111, 0b100, 0b110, 0b100, 0b111],
        },
        'F' => Glyph {
            rows: [0b111, 0b100, 0b110, 0b100, 0b100],
        },
        'G' => Glyph {
            rows: [0b111, 0b100, 0b101, 0b101, 0b111],
        },
        'H' => Glyph {
            rows: [0b101, 0b101, 0b111, 0b101, 0b101],
        },
        'I' => Glyph {
            rows: [0b111, 0b010, 0b010, 0b010, 0b111],
        },
        'L' => Glyph {
            rows: [0b100, 0b100, 0b100, 0b100, 0b111],
        },
        'N' => Glyph {
            rows: [0b101, 0b111, 0b111, 0b111, 0b101],
        },
        'O' => Glyph {
            rows: [0b111, 0b101, 0b101, 0b101, 0b111],
        },
        'P' => Glyph {
            rows: [0b110, 0b101, 0b110, 0b100, 0b100],
        },
        'R' => Glyph {
            rows: [0b110, 0b101, 0b110, 0b101, 0b101],
        },
        'S' => Glyph {
            rows: [0b111, 0b100, 0b111, 0b001, 0b111],
        },
        'T' => Glyph {
            rows: [0b111, 0b010, 0b010, 0b010, 0b010],
        },
        'U' => Glyph {
            rows: [0b101, 0b101, 0b101, 0b101, 0b111],
        },
        'X' => Glyph {
            rows: [0b101, 0b101, 0b010, 0b101, 0b101],
        },
        '.' => Glyph {
            rows: [0b000, 0b000, 0b000, 0b000, 0b010],
        },
        ':' => Glyph {
            rows: [0b000, 0b010, 0b000, 0b010, 0b000],
        },
        '-' => Glyph {
            rows: [0b000, 0b000, 0b111, 0b000, 0b000],
        },
        _ => SPACE_GLYPH,
    }
}
