//! Fixed-length pixel buffer.
//!
//! The buffer stores colors exactly as the caller set them. Brightness is
//! only applied on readout through `scaled()`, so dimming and undimming a
//! band never loses color precision.
//!
//! ## Rust concepts
//! - `Box<[T]>` for a heap slice whose length can't change
//! - `slice::rotate_right` / `copy_within` for in-place moves
//! - `Result` for recoverable index errors

use crate::Color;
use crate::error::BandError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    // A boxed slice rather than a Vec: there is no way to push or truncate,
    // so the length fixed at creation is the length forever.
    pixels: Box<[Color]>,
}

impl PixelBuffer {
    /// Create an all-black buffer of `len` pixels.
    pub fn new(len: usize) -> Self {
        Self {
            pixels: vec![Color::BLACK; len].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// The stored (unscaled) colors.
    pub fn as_slice(&self) -> &[Color] {
        &self.pixels
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Set one pixel. An index past the end is an error and leaves the
    /// buffer untouched.
    pub fn set_pixel(&mut self, index: usize, color: Color) -> Result<(), BandError> {
        let len = self.pixels.len();
        let slot = self
            .pixels
            .get_mut(index)
            .ok_or(BandError::IndexOutOfRange { index, len })?;
        *slot = color;
        Ok(())
    }

    /// Spread the hue wheel evenly across the band, starting at red.
    pub fn rainbow(&mut self) {
        let len = self.pixels.len();
        for (i, pixel) in self.pixels.iter_mut().enumerate() {
            let hue = (i * 360 / len) as u16;
            *pixel = Color::from_hue(hue);
        }
    }

    /// Move every color `offset` slots toward higher indices (negative:
    /// toward lower). Colors pushed off the end are dropped and the vacated
    /// slots turn black.
    pub fn shift(&mut self, offset: i32) {
        let len = self.pixels.len();
        let n = offset.unsigned_abs() as usize;
        if n >= len {
            self.pixels.fill(Color::BLACK);
            return;
        }
        if offset > 0 {
            self.pixels.copy_within(0..len - n, n);
            self.pixels[..n].fill(Color::BLACK);
        } else if offset < 0 {
            self.pixels.copy_within(n.., 0);
            self.pixels[len - n..].fill(Color::BLACK);
        }
    }

    /// Like `shift`, but colors leaving one end come back in at the other.
    pub fn rotate(&mut self, offset: i32) {
        let len = self.pixels.len();
        if len == 0 {
            return;
        }
        let n = offset.unsigned_abs() as usize % len;
        if offset >= 0 {
            self.pixels.rotate_right(n);
        } else {
            self.pixels.rotate_left(n);
        }
    }

    /// Brightness-scaled copy of the buffer, ready to hand to a device.
    pub fn scaled(&self, brightness: u8) -> Vec<Color> {
        self.pixels
            .iter()
            .map(|c| c.apply_brightness(brightness))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const RED: Color = Color::new(255, 0, 0);
    const GREEN: Color = Color::new(0, 255, 0);
    const BLUE: Color = Color::new(0, 0, 255);

    /// Buffer holding `[RED, GREEN, BLUE, BLACK, ...]`.
    fn rgb_buffer(len: usize) -> PixelBuffer {
        let mut buf = PixelBuffer::new(len);
        for (i, c) in [RED, GREEN, BLUE].into_iter().enumerate().take(len) {
            buf.set_pixel(i, c).unwrap();
        }
        buf
    }

    #[test]
    fn new_buffer_is_black() {
        let buf = PixelBuffer::new(4);
        assert_eq!(buf.len(), 4);
        assert!(buf.as_slice().iter().all(|&c| c == Color::BLACK));
    }

    #[test]
    fn fill_sets_every_pixel() {
        let mut buf = PixelBuffer::new(3);
        buf.fill(GREEN);
        assert_eq!(buf.as_slice(), &[GREEN, GREEN, GREEN]);
    }

    #[test]
    fn set_pixel_out_of_range_errors_and_keeps_buffer() {
        let mut buf = rgb_buffer(3);
        let before = buf.clone();

        let err = buf.set_pixel(3, Color::new(9, 9, 9)).unwrap_err();

        assert!(matches!(err, BandError::IndexOutOfRange { index: 3, len: 3 }));
        assert_eq!(buf, before);
    }

    #[test]
    fn set_pixel_then_scaled_full_brightness_roundtrips() {
        let mut buf = PixelBuffer::new(5);
        let colors = [
            Color::from_packed(0x123456),
            Color::from_packed(0xFFFFFF),
            Color::from_packed(0x000001),
            Color::from_packed(0x80FF00),
            Color::from_packed(0x7F7F7F),
        ];
        for (i, c) in colors.iter().enumerate() {
            buf.set_pixel(i, *c).unwrap();
        }
        assert_eq!(buf.scaled(255), colors.to_vec());
    }

    #[test]
    fn scaled_does_not_touch_stored_colors() {
        let mut buf = PixelBuffer::new(2);
        buf.fill(RED);
        let dimmed = buf.scaled(40);
        assert_eq!(dimmed, vec![Color::new(40, 0, 0); 2]);
        assert_eq!(buf.as_slice(), &[RED, RED]);
    }

    #[test]
    fn rainbow_is_deterministic_and_distinct() {
        let mut a = PixelBuffer::new(6);
        let mut b = PixelBuffer::new(6);
        a.rainbow();
        b.rainbow();
        assert_eq!(a, b);

        let expected: Vec<Color> = [0, 60, 120, 180, 240, 300]
            .into_iter()
            .map(Color::from_hue)
            .collect();
        assert_eq!(a.as_slice(), expected.as_slice());
    }

    #[test]
    fn rainbow_on_empty_buffer_is_noop() {
        let mut buf = PixelBuffer::new(0);
        buf.rainbow();
        assert!(buf.is_empty());
    }

    #[rstest]
    #[case(1, vec![Color::BLACK, RED, GREEN, BLUE, Color::BLACK])]
    #[case(2, vec![Color::BLACK, Color::BLACK, RED, GREEN, BLUE])]
    #[case(-1, vec![GREEN, BLUE, Color::BLACK, Color::BLACK, Color::BLACK])]
    #[case(0, vec![RED, GREEN, BLUE, Color::BLACK, Color::BLACK])]
    fn test_shift(#[case] offset: i32, #[case] expected: Vec<Color>) {
        let mut buf = rgb_buffer(5);
        buf.shift(offset);
        assert_eq!(buf.as_slice(), expected.as_slice());
    }

    #[rstest]
    #[case(3)]
    #[case(4)]
    #[case(100)]
    #[case(-3)]
    fn shift_past_length_clears(#[case] offset: i32) {
        let mut buf = rgb_buffer(3);
        buf.shift(offset);
        assert_eq!(buf, PixelBuffer::new(3));
    }

    #[rstest]
    #[case(1, vec![Color::BLACK, RED, GREEN, BLUE])]
    #[case(-1, vec![GREEN, BLUE, Color::BLACK, RED])]
    #[case(5, vec![Color::BLACK, RED, GREEN, BLUE])]
    fn test_rotate(#[case] offset: i32, #[case] expected: Vec<Color>) {
        let mut buf = rgb_buffer(4);
        buf.rotate(offset);
        assert_eq!(buf.as_slice(), expected.as_slice());
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(7)]
    #[case(-3)]
    fn rotate_len_times_is_identity(#[case] offset: i32) {
        let mut buf = PixelBuffer::new(7);
        buf.rainbow();
        let original = buf.clone();
        for _ in 0..buf.len() {
            buf.rotate(offset);
        }
        assert_eq!(buf, original);
    }

    #[test]
    fn rotate_and_shift_on_empty_buffer_are_noops() {
        let mut buf = PixelBuffer::new(0);
        buf.rotate(3);
        buf.shift(3);
        assert!(buf.is_empty());
    }
}
