use crate::geom::Point2f;
use crate::image::{Image, ImageView};

/// An image grown by a constant border of `pad` pixels on every side.
#[derive(Debug, Clone, PartialEq)]
pub struct Padded<T> {
    pub image: Image<T>,
    pub pad: usize,
}

impl<T> Padded<T> {
    /// Maps an unpadded pixel index into the padded buffer.
    pub fn to_padded(&self, x: usize, y: usize) -> (usize, usize) {
        (x + self.pad, y + self.pad)
    }

    pub fn point_to_padded(&self, p: Point2f) -> Point2f {
        Point2f::new(p.x + self.pad as f32, p.y + self.pad as f32)
    }

    pub fn point_from_padded(&self, p: Point2f) -> Point2f {
        Point2f::new(p.x - self.pad as f32, p.y - self.pad as f32)
    }
}

pub fn pad_constant<T: Clone>(src: &ImageView<'_, T>, pad: usize, value: T) -> Padded<T> {
    let width = src.width() + 2 * pad;
    let height = src.height() + 2 * pad;

    let mut data = Vec::with_capacity(width * height);
    for _ in 0..pad {
        data.extend(std::iter::repeat_n(value.clone(), width));
    }
    for y in 0..src.height() {
        data.extend(std::iter::repeat_n(value.clone(), pad));
        data.extend_from_slice(src.row(y));
        data.extend(std::iter::repeat_n(value.clone(), pad));
    }
    for _ in 0..pad {
        data.extend(std::iter::repeat_n(value.clone(), width));
    }

    let image = Image::from_vec(width, height, data).expect("padded buffer matches its size");
    Padded { image, pad }
}

#[cfg(test)]
mod tests {
    use super::pad_constant;
    use crate::{Image, Point2f};

    #[test]
    fn constant_border_surrounds_source() {
        let src = Image::from_vec(2, 1, vec![true, false]).expect("valid image");
        let padded = pad_constant(&src.as_view(), 1, false);

        assert_eq!(padded.image.width(), 4);
        assert_eq!(padded.image.height(), 3);
        assert_eq!(padded.image.data().iter().filter(|&&v| v).count(), 1);
        assert_eq!(padded.image.get(1, 1), Some(&true));
        assert_eq!(padded.to_padded(1, 0), (2, 1));
    }

    #[test]
    fn point_mapping_round_trips() {
        let src = Image::new_fill(3, 3, 0u8);
        let padded = pad_constant(&src.as_view(), 4, 9);
        assert_eq!(padded.image.get(0, 0), Some(&9));
        assert_eq!(padded.image.get(4, 4), Some(&0));

        let p = Point2f::new(1.5, 2.0);
        assert_eq!(padded.point_from_padded(padded.point_to_padded(p)), p);
    }
}
