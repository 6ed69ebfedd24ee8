use std::fmt;
use std::ops::Sub;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point2D<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: Copy + Sub<Output = T>> Interval<T> {
    pub fn range(&self) -> T {
        self.max - self.min
    }
}

impl<T: Copy + PartialOrd> Interval<T> {
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn overlaps(&self, other: &Interval<T>) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

impl Interval<f64> {
    /// Smallest interval holding every value, `None` if there are none
    pub fn enclosing<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Self::new(v, v)),
            Some(Interval { min, max }) => Some(Self::new(min.min(v), max.max(v))),
        })
    }
}

/// Axis aligned rectangle. For geographic regions `x` is longitude and `y` is latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region<T> {
    pub x: Interval<T>,
    pub y: Interval<T>,
}

impl<T> Region<T> {
    pub fn new(min_x: T, min_y: T, max_x: T, max_y: T) -> Self {
        Self {
            x: Interval::new(min_x, max_x),
            y: Interval::new(min_y, max_y),
        }
    }

    pub fn x(&self) -> &Interval<T> {
        &self.x
    }

    pub fn y(&self) -> &Interval<T> {
        &self.y
    }
}

impl<T: Copy> Region<T> {
    pub fn as_tuple(&self) -> (T, T, T, T) {
        (self.x.min, self.y.min, self.x.max, self.y.max)
    }

    pub fn x_min(&self) -> T {
        self.x.min
    }

    pub fn y_min(&self) -> T {
        self.y.min
    }

    pub fn x_max(&self) -> T {
        self.x.max
    }

    pub fn y_max(&self) -> T {
        self.y.max
    }
}

impl<T: Copy + PartialOrd> Region<T> {
    pub fn intersects(&self, other: &Region<T>) -> bool {
        self.x.overlaps(&other.x) && self.y.overlaps(&other.y)
    }

    pub fn contains(&self, point: Point2D<T>) -> bool {
        self.x.contains(point.x) && self.y.contains(point.y)
    }
}

impl<T: Copy + Sub<Output = T> + Default + PartialEq> Region<T> {
    pub fn is_empty(&self) -> bool {
        self.x.range() == T::default() || self.y.range() == T::default()
    }
}

impl<T: fmt::Display> fmt::Display for Region<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Region(x: {}..{}, y: {}..{})",
            self.x.min, self.x.max, self.y.min, self.y.max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_regions_intersect() {
        let a = Region::new(0.0, 0.0, 2.0, 2.0);
        let b = Region::new(1.0, 1.0, 3.0, 3.0);
        let c = Region::new(2.5, 2.5, 3.0, 3.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn enclosing_interval() {
        let interval = Interval::enclosing([3.0, -1.0, 2.0]).unwrap();
        assert_eq!(interval, Interval::new(-1.0, 3.0));
        assert!(Interval::enclosing(Vec::<f64>::new()).is_none());
    }

    #[test]
    fn empty_pixel_region() {
        assert!(Region::new(3_u32, 0, 3, 10).is_empty());
        assert!(!Region::new(0_u32, 0, 3, 10).is_empty());
    }
}
