use std::ops::Mul;

/// Minimum and maximum extents of a rectangular region.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox<T> {
    /// Minimum extent in the x direction-- the left side of a region.
    pub x_min: T,
    /// Minimum extent in the y direction. In the y-up coordinate system
    /// used by fonts, this is the bottom of the region.
    pub y_min: T,
    /// Maximum extent in the x direction-- the right side of a region.
    pub x_max: T,
    /// Maximum extent in the y direction.
    pub y_max: T,
}

impl<T> BoundingBox<T>
where
    T: Mul<Output = T> + Copy,
{
    /// Return a `BoundingBox` scaled by a scale factor of the same type
    /// as the stored bounds.
    pub fn scale(&self, factor: T) -> Self {
        Self {
            x_min: self.x_min * factor,
            y_min: self.y_min * factor,
            x_max: self.x_max * factor,
            y_max: self.y_max * factor,
        }
    }
}

impl<T: Copy> BoundingBox<T> {
    /// Maps each extent through `f`.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> BoundingBox<U> {
        BoundingBox {
            x_min: f(self.x_min),
            y_min: f(self.y_min),
            x_max: f(self.x_max),
            y_max: f(self.y_max),
        }
    }
}

impl<T: PartialOrd> BoundingBox<T> {
    /// Returns true if the box has a negative extent on either axis.
    pub fn is_inverted(&self) -> bool {
        self.x_min > self.x_max || self.y_min > self.y_max
    }
}

#[cfg(test)]
mod tests {
    use super::BoundingBox;

    #[test]
    fn map_and_scale() {
        let bbox = BoundingBox {
            x_min: -1,
            y_min: -2,
            x_max: 3,
            y_max: 4,
        };
        assert_eq!(bbox.scale(2).x_max, 6);
        assert_eq!(bbox.map(|v| v as i64 * 10).y_min, -20);
        assert!(!bbox.is_inverted());
        assert!(BoundingBox { x_min: 1, ..bbox }.x_min > 0);
        assert!(BoundingBox { x_max: -5, ..bbox }.is_inverted());
    }
}
