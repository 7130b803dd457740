use std::ops::Index;

use ndarray::Array1;

use super::range::Range;

/// A column of samples together with the range of its finite values.
#[derive(Debug, Clone)]
pub struct Series {
    data: Array1<f64>,
    range: Option<Range<f64>>,
}

impl Series {
    pub fn new(data: Array1<f64>) -> Self {
        let range = finite_range(data.iter().copied());
        Self { data, range }
    }

    pub fn from_vec(data: Vec<f64>) -> Self {
        Self::new(Array1::from_vec(data))
    }

    /// `None` if the series has no finite values.
    pub fn range(&self) -> Option<Range<f64>> {
        self.range
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }
}

impl FromIterator<f64> for Series {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Index<usize> for Series {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

#[derive(Debug, Clone)]
pub struct TimeSeries {
    pub time: Series,
    pub values: Series,
}

impl TimeSeries {
    pub fn new(time: Series, values: Series) -> Self {
        assert_eq!(time.len(), values.len());
        Self { time, values }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.time.iter().zip(self.values.iter())
    }

    /// Bounds of the finite points as `(x, y)`.
    pub fn bounds(&self) -> Option<(Range<f64>, Range<f64>)> {
        self.time.range().zip(self.values.range())
    }
}

fn finite_range(data: impl Iterator<Item = f64>) -> Option<Range<f64>> {
    data.filter(|x| x.is_finite())
        .fold(None, |range: Option<Range<f64>>, x| match range {
            None => Some(Range::new(x, x)),
            Some(r) => Some(r.max(Range::new(x, x))),
        })
}
