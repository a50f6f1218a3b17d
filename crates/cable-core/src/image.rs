use crate::Error;

/// Binary image, `true` marks a foreground pixel.
pub type Mask = Image<bool>;

#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Image<T> {
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, Error> {
        let expected = width.checked_mul(height).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;

        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get_mut(y * self.width + x)
    }

    pub fn as_view(&self) -> ImageView<'_, T> {
        ImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

impl<T: Clone> Image<T> {
    pub fn new_fill(width: usize, height: usize, value: T) -> Self {
        let len = width.checked_mul(height).expect("image size overflow");
        Self {
            width,
            height,
            data: vec![value; len],
        }
    }
}

impl Mask {
    /// Binarizes 8-bit luma data with the rule `value > 0`.
    pub fn from_luma(width: usize, height: usize, luma: &[u8]) -> Result<Self, Error> {
        Self::from_vec(width, height, luma.iter().map(|&v| v > 0).collect())
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Signed lookup; anything outside the mask reads as background.
    pub fn is_set(&self, x: isize, y: isize) -> bool {
        self.as_view().is_set(x, y)
    }

    /// Writes `value` if `(x, y)` is inside the mask; returns whether it was.
    pub fn set(&mut self, x: isize, y: isize, value: bool) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        match self.get_mut(x as usize, y as usize) {
            Some(px) => {
                *px = value;
                true
            }
            None => false,
        }
    }

    pub fn to_luma(&self) -> Vec<u8> {
        self.data.iter().map(|&v| if v { 255 } else { 0 }).collect()
    }
}

/// Borrowed, row-major view of an image.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a, T> {
    width: usize,
    height: usize,
    data: &'a [T],
}

impl<'a, T> ImageView<'a, T> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn row(&self, y: usize) -> &'a [T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }
}

impl<T: Clone> ImageView<'_, T> {
    /// Copies the view into a contiguous owned image.
    pub fn to_image(&self) -> Image<T> {
        let mut data = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            data.extend_from_slice(self.row(y));
        }
        Image {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

impl ImageView<'_, bool> {
    pub fn is_set(&self, x: isize, y: isize) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        self.get(x as usize, y as usize).copied().unwrap_or(false)
    }
}
