use framehost::{BYTES_PER_PIXEL, PixelBuffer};

/// Fills the visible area with a blue ramp along x and a green ramp along y,
/// both shifted by the offsets and wrapping every 256 pixels.
pub fn render_weird_gradient(buffer: &mut PixelBuffer, blue_offset: i32, green_offset: i32) {
    for (y, row) in buffer.rows_mut().enumerate() {
        let green = wrap_channel((y as i32).wrapping_add(green_offset));
        for (x, pixel) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            let blue = wrap_channel((x as i32).wrapping_add(blue_offset));
            pixel.copy_from_slice(&pack(blue, green).to_le_bytes());
        }
    }
}

pub fn wrap_channel(value: i32) -> u8 {
    value.rem_euclid(256) as u8
}

/// `0x0000GGBB`; red and alpha stay zero.
pub fn pack(blue: u8, green: u8) -> u32 {
    ((green as u32) << 8) | blue as u32
}
