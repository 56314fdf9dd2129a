//! Pixel addressing for the page-organized 1bpp framebuffer.
//!
//! The panel is split into horizontal pages of 8 rows. Each page holds one
//! byte per column, and bit `b` of that byte (LSB first) is row
//! `page * 8 + b`.

/// Panel size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    pub width: usize,
    pub height: usize,
}

impl DisplayGeometry {
    /// 128 x 64 SSD1306-class panel.
    pub const DEFAULT: Self = Self {
        width: 128,
        height: 64,
    };

    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of 8-row pages.
    pub fn pages(&self) -> usize {
        self.height / 8
    }

    /// Payload size of one full frame.
    pub fn frame_len(&self) -> usize {
        self.pages() * self.width
    }
}

impl Default for DisplayGeometry {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Read-only pixel view over a frame payload.
///
/// Short payloads are tolerated: pixels past the end read as off.
#[derive(Debug, Clone, Copy)]
pub struct Framebuffer<'a> {
    geometry: DisplayGeometry,
    data: &'a [u8],
}

impl<'a> Framebuffer<'a> {
    pub fn new(geometry: DisplayGeometry, data: &'a [u8]) -> Self {
        Self { geometry, data }
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    /// Whether pixel `(x, y)` is lit. Out-of-range coordinates are off.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= self.geometry.width || y >= self.geometry.height {
            return false;
        }
        let idx = (y / 8) * self.geometry.width + x;
        match self.data.get(idx) {
            Some(byte) => (byte >> (y % 8)) & 1 == 1,
            None => false,
        }
    }

    /// Row-major pixel rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = Vec<bool>> + '_ {
        (0..self.geometry.height).map(move |y| {
            (0..self.geometry.width)
                .map(|x| self.pixel(x, y))
                .collect()
        })
    }

    /// Count of lit pixels.
    pub fn lit_pixels(&self) -> usize {
        self.data
            .iter()
            .take(self.geometry.frame_len())
            .map(|byte| byte.count_ones() as usize)
            .sum()
    }

    /// Whether the payload covers the whole panel exactly.
    pub fn is_complete(&self) -> bool {
        self.data.len() == self.geometry.frame_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry() {
        let g = DisplayGeometry::default();
        assert_eq!(g.pages(), 8);
        assert_eq!(g.frame_len(), 1024);
    }

    #[test]
    fn bit_order_within_page() {
        let g = DisplayGeometry::new(4, 16);
        let mut data = vec![0u8; g.frame_len()];
        data[1] = 0b0000_0001; // page 0, column 1, row 0
        data[4 + 2] = 0b1000_0000; // page 1, column 2, row 15
        let fb = Framebuffer::new(g, &data);

        assert!(fb.pixel(1, 0));
        assert!(!fb.pixel(1, 1));
        assert!(fb.pixel(2, 15));
        assert!(!fb.pixel(2, 8));
        assert_eq!(fb.lit_pixels(), 2);
        assert!(fb.is_complete());
    }

    #[test]
    fn short_payload_reads_as_off() {
        let g = DisplayGeometry::default();
        let data = [0xFFu8; 10];
        let fb = Framebuffer::new(g, &data);
        assert!(fb.pixel(9, 7));
        assert!(!fb.pixel(10, 0));
        assert!(!fb.pixel(0, 8));
        assert!(!fb.is_complete());
    }

    #[test]
    fn out_of_range_is_off() {
        let data = [0xFFu8; 1024];
        let fb = Framebuffer::new(DisplayGeometry::default(), &data);
        assert!(!fb.pixel(128, 0));
        assert!(!fb.pixel(0, 64));
    }

    #[test]
    fn rows_follow_page_layout() {
        let g = DisplayGeometry::new(2, 8);
        let data = [0b0000_0101u8, 0b0000_0010];
        let rows: Vec<Vec<bool>> = Framebuffer::new(g, &data).rows().collect();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0], vec![true, false]);
        assert_eq!(rows[1], vec![false, true]);
        assert_eq!(rows[2], vec![true, false]);
        assert_eq!(rows[3], vec![false, false]);
    }
}
