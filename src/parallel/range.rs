//! Index ranges and their partitioning into grains.
//!
//! Every [`Partition::split`] result is a set of disjoint sub-ranges whose
//! union is exactly the original range. Callers rely on this to write into
//! shared output buffers without locks.

use std::fmt;
use std::ops::Range;

/// A 1D/2D/3D index range that can be split into disjoint blocks.
pub trait Partition: Clone + Send + Sync + fmt::Debug {
    /// Number of index points covered.
    fn size(&self) -> usize;

    /// Split into blocks at most `grain` long along each dimension.
    /// `grain` below 1 is treated as 1.
    fn split(&self, grain: usize) -> Vec<Self>;

    /// Grain used when none has been set explicitly.
    fn default_grain(&self, threads: usize) -> usize;
}

/// Consecutive chunks of `range`, each at most `grain` long.
fn chunks(range: &Range<usize>, grain: usize) -> Vec<Range<usize>> {
    let grain = grain.max(1);
    (range.start..range.end)
        .step_by(grain)
        .map(|start| start..(start + grain).min(range.end))
        .collect()
}

fn extent(range: &Range<usize>) -> usize {
    range.end.saturating_sub(range.start)
}

impl Partition for Range<usize> {
    fn size(&self) -> usize {
        extent(self)
    }

    fn split(&self, grain: usize) -> Vec<Self> {
        chunks(self, grain)
    }

    fn default_grain(&self, threads: usize) -> usize {
        extent(self).div_ceil(threads.max(1) * 4).max(1)
    }
}

/// Half-open 2D block `[x.start, x.end) × [y.start, y.end)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range2D {
    pub x: Range<usize>,
    pub y: Range<usize>,
}

impl Range2D {
    pub fn new(x: Range<usize>, y: Range<usize>) -> Self {
        Self { x, y }
    }

    /// Full range over a `[nx, ny]` grid.
    pub fn from_dims(dims: [usize; 2]) -> Self {
        Self::new(0..dims[0], 0..dims[1])
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.x.contains(&x) && self.y.contains(&y)
    }
}

impl Partition for Range2D {
    fn size(&self) -> usize {
        extent(&self.x) * extent(&self.y)
    }

    fn split(&self, grain: usize) -> Vec<Self> {
        let xs = chunks(&self.x, grain);
        chunks(&self.y, grain)
            .into_iter()
            .flat_map(|y| xs.iter().map(move |x| Range2D::new(x.clone(), y.clone())))
            .collect()
    }

    fn default_grain(&self, threads: usize) -> usize {
        let longest = extent(&self.x).max(extent(&self.y));
        longest.div_ceil(threads.max(1)).max(1)
    }
}

/// Half-open 3D block; the callable of a 3D algorithm receives one of these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range3D {
    pub x: Range<usize>,
    pub y: Range<usize>,
    pub z: Range<usize>,
}

impl Range3D {
    pub fn new(x: Range<usize>, y: Range<usize>, z: Range<usize>) -> Self {
        Self { x, y, z }
    }

    /// Full range over a `[nx, ny, nz]` grid.
    pub fn from_dims(dims: [usize; 3]) -> Self {
        Self::new(0..dims[0], 0..dims[1], 0..dims[2])
    }

    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        self.x.contains(&x) && self.y.contains(&y) && self.z.contains(&z)
    }

    /// Whether this block lies inside a `[nx, ny, nz]` grid.
    pub fn fits(&self, dims: [usize; 3]) -> bool {
        self.x.end <= dims[0] && self.y.end <= dims[1] && self.z.end <= dims[2]
    }

    /// Iterate `(x, y, z)` in x-fastest order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.z.clone().flat_map(move |z| {
            self.y
                .clone()
                .flat_map(move |y| self.x.clone().map(move |x| (x, y, z)))
        })
    }
}

impl From<Range2D> for Range3D {
    fn from(range: Range2D) -> Self {
        Range3D::new(range.x, range.y, 0..1)
    }
}

impl Partition for Range3D {
    fn size(&self) -> usize {
        extent(&self.x) * extent(&self.y) * extent(&self.z)
    }

    fn split(&self, grain: usize) -> Vec<Self> {
        let xs = chunks(&self.x, grain);
        let ys = chunks(&self.y, grain);
        let mut blocks = Vec::with_capacity(xs.len() * ys.len());
        for z in chunks(&self.z, grain) {
            for y in &ys {
                for x in &xs {
                    blocks.push(Range3D::new(x.clone(), y.clone(), z.clone()));
                }
            }
        }
        blocks
    }

    fn default_grain(&self, threads: usize) -> usize {
        let longest = extent(&self.x).max(extent(&self.y)).max(extent(&self.z));
        longest.div_ceil(threads.max(1)).max(1)
    }
}
