/// Read access to a row-major image.
pub trait ImageView {
    type Pixel: Copy;

    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Pixels of row `y`, exactly `width()` elements.
    fn row(&self, y: usize) -> &[Self::Pixel];

    fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Write access to a row-major image.
pub trait ImageViewMut: ImageView {
    fn row_mut(&mut self, y: usize) -> &mut [Self::Pixel];
}
