use std::ops::Sub;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range<N> {
    pub min: N,
    pub max: N,
}

impl<N> Range<N> {
    pub fn new(min: N, max: N) -> Self {
        Self { min, max }
    }

    pub fn into_range(self) -> std::ops::Range<N> {
        self.min..self.max
    }
}

impl<N: Sub<Output = N> + Copy> Range<N> {
    pub fn width(&self) -> N {
        self.max - self.min
    }
}

impl<N: PartialOrd + Copy> Range<N> {
    /// Smallest range containing both `self` and `other`.
    pub fn max(self, other: Self) -> Self {
        Self {
            min: if other.min < self.min { other.min } else { self.min },
            max: if other.max > self.max { other.max } else { self.max },
        }
    }
}

impl Range<f64> {
    /// Grows a zero-width range so it can be used as a chart axis.
    pub fn widen_degenerate(self) -> Self {
        if self.width() > 0.0 {
            return self;
        }
        let pad = if self.min == 0.0 { 1.0 } else { self.min.abs() * 0.05 };
        Self::new(self.min - pad, self.max + pad)
    }

    /// Adds `fraction` of the width on both sides.
    pub fn pad(self, fraction: f64) -> Self {
        let pad = self.width() * fraction;
        Self::new(self.min - pad, self.max + pad)
    }
}
