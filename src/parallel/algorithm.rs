//! Range-partitioned parallel execution.
//!
//! A [`ParallelDataAlgorithm`] runs a user callable over an index range,
//! either once over the whole range (sequential) or once per grain-sized
//! sub-range on a rayon pool (parallel). Both paths go through
//! [`ParallelDataAlgorithm::partitions`], so the disjoint-cover guarantee of
//! [`Partition::split`] is the only thing callers have to trust.

use crate::data::error::{DataError, DataResult};
use crate::parallel::pool::ParallelContext;
use crate::parallel::range::{Partition, Range2D, Range3D};
use rayon::prelude::*;
use std::marker::PhantomData;
use std::ops::Range;

/// Splits a range into grains and dispatches a callable over them.
#[derive(Debug, Clone)]
pub struct ParallelDataAlgorithm<R: Partition> {
    range: R,
    grain: Option<usize>,
    context: ParallelContext,
}

pub type ParallelData2DAlgorithm = ParallelDataAlgorithm<Range2D>;
pub type ParallelData3DAlgorithm = ParallelDataAlgorithm<Range3D>;

impl<R: Partition> ParallelDataAlgorithm<R> {
    /// Parallel algorithm over `range` on the global pool.
    pub fn new(range: R) -> Self {
        Self::with_context(range, ParallelContext::default())
    }

    pub fn with_context(range: R, context: ParallelContext) -> Self {
        Self {
            range,
            grain: context.grain(),
            context,
        }
    }

    pub fn range(&self) -> &R {
        &self.range
    }

    pub fn set_range(&mut self, range: R) {
        self.range = range;
    }

    /// Set the grain; values below 1 are clamped to 1.
    pub fn set_grain(&mut self, grain: usize) {
        self.grain = Some(grain.max(1));
    }

    /// Effective grain (explicit, or derived from the pool size).
    pub fn grain(&self) -> usize {
        match self.grain {
            Some(grain) => grain.max(1),
            None => self
                .range
                .default_grain(self.context.current_num_threads()),
        }
    }

    pub fn parallelization_enabled(&self) -> bool {
        self.context.is_enabled()
    }

    pub fn set_parallelization_enabled(&mut self, enabled: bool) {
        self.context.set_enabled(enabled);
    }

    /// Run on a dedicated pool of at most `threads` workers.
    pub fn set_max_threads(&mut self, threads: usize) {
        self.context.set_max_threads(threads);
    }

    pub fn context(&self) -> &ParallelContext {
        &self.context
    }

    /// The sub-ranges the callable will be invoked with.
    pub fn partitions(&self) -> Vec<R> {
        if self.parallelization_enabled() {
            self.range.split(self.grain())
        } else {
            vec![self.range.clone()]
        }
    }

    /// Invoke `f` for every partition and wait for all of them.
    ///
    /// Panics in `f` propagate to the caller once the join completes.
    pub fn execute<F>(&self, f: F)
    where
        F: Fn(R) + Send + Sync,
    {
        if !self.parallelization_enabled() {
            f(self.range.clone());
            return;
        }
        let partitions = self.partitions();
        tracing::trace!(
            "Dispatching {} partitions (grain {})",
            partitions.len(),
            self.grain()
        );
        self.context
            .install(|| partitions.into_par_iter().for_each(|part| f(part)));
    }

    /// Like [`execute`](Self::execute) for fallible callables.
    ///
    /// The first error is returned. Partitions not yet started are skipped;
    /// partitions already running finish normally.
    pub fn try_execute<F, E>(&self, f: F) -> Result<(), E>
    where
        F: Fn(R) -> Result<(), E> + Send + Sync,
        E: Send,
    {
        if !self.parallelization_enabled() {
            return f(self.range.clone());
        }
        let partitions = self.partitions();
        self.context
            .install(|| partitions.into_par_iter().try_for_each(|part| f(part)))
    }
}

impl ParallelDataAlgorithm<Range<usize>> {
    /// Run `f` over disjoint mutable chunks of a tuple-major buffer.
    ///
    /// `data` holds `components` values per tuple; the chunk passed with a
    /// tuple range covers exactly those tuples.
    pub fn execute_chunks<T, F>(&self, data: &mut [T], components: usize, f: F) -> DataResult<()>
    where
        T: Send,
        F: Fn(Range<usize>, &mut [T]) + Send + Sync,
    {
        let components = components.max(1);
        let range = self.range.clone();
        let needed = match range.end.checked_mul(components) {
            Some(needed) if needed <= data.len() => needed,
            _ => {
                return Err(DataError::IndexOutOfRange {
                    index: range.end,
                    size: data.len() / components,
                })
            }
        };
        let first = range.start.min(range.end) * components;
        let window = &mut data[first..needed];
        if !self.parallelization_enabled() {
            f(range, window);
            return Ok(());
        }
        let grain = self.grain();
        self.context.install(|| {
            window
                .par_chunks_mut(grain.saturating_mul(components))
                .enumerate()
                .for_each(|(i, chunk)| {
                    let start = range.start + i * grain;
                    f(start..start + chunk.len() / components, chunk)
                })
        });
        Ok(())
    }
}

impl ParallelDataAlgorithm<Range3D> {
    /// Run `f` once per block with a writer restricted to that block of a
    /// shared `[nx, ny, nz]` output grid holding `components` values per
    /// voxel.
    pub fn execute_blocks<T, F>(
        &self,
        data: &mut [T],
        dims: [usize; 3],
        components: usize,
        f: F,
    ) -> DataResult<()>
    where
        T: Send,
        F: Fn(&mut BlockWriter<'_, T>) + Send + Sync,
    {
        let shared = SharedGrid::new(data, dims, components)?;
        if !self.range.fits(dims) {
            return Err(DataError::ShapeMismatch(format!(
                "range {:?} exceeds grid {:?}",
                self.range, dims
            )));
        }
        self.execute(|block| f(&mut shared.writer(block)));
        Ok(())
    }
}

impl ParallelDataAlgorithm<Range2D> {
    /// 2D counterpart of [`ParallelData3DAlgorithm::execute_blocks`] over an
    /// `[nx, ny]` grid.
    pub fn execute_blocks<T, F>(
        &self,
        data: &mut [T],
        dims: [usize; 2],
        components: usize,
        f: F,
    ) -> DataResult<()>
    where
        T: Send,
        F: Fn(&mut BlockWriter<'_, T>) + Send + Sync,
    {
        let grid = [dims[0], dims[1], 1];
        let shared = SharedGrid::new(data, grid, components)?;
        if !Range3D::from(self.range.clone()).fits(grid) {
            return Err(DataError::ShapeMismatch(format!(
                "range {:?} exceeds grid {:?}",
                self.range, dims
            )));
        }
        self.execute(|block| f(&mut shared.writer(block.into())));
        Ok(())
    }
}

/// Output grid shared between workers. Only hands out block-restricted
/// writers.
struct SharedGrid<'a, T> {
    ptr: *mut T,
    len: usize,
    dims: [usize; 3],
    components: usize,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: writers created from a SharedGrid only touch voxels inside their
// own block, and the blocks produced by `Partition::split` are disjoint.
unsafe impl<T: Send> Send for SharedGrid<'_, T> {}
unsafe impl<T: Send> Sync for SharedGrid<'_, T> {}

impl<'a, T> SharedGrid<'a, T> {
    fn new(data: &'a mut [T], dims: [usize; 3], components: usize) -> DataResult<Self> {
        let components = components.max(1);
        let expected = dims
            .iter()
            .try_fold(components, |acc, &d| acc.checked_mul(d));
        if expected != Some(data.len()) {
            return Err(DataError::ShapeMismatch(format!(
                "buffer of {} values does not match grid {:?} x {} components",
                data.len(),
                dims,
                components
            )));
        }
        Ok(Self {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            dims,
            components,
            _marker: PhantomData,
        })
    }

    fn writer(&self, block: Range3D) -> BlockWriter<'_, T> {
        BlockWriter {
            ptr: self.ptr,
            len: self.len,
            dims: self.dims,
            components: self.components,
            block,
            _marker: PhantomData,
        }
    }
}

/// Write access to one block of a shared output grid.
///
/// Every access asserts that the voxel lies inside [`block`](Self::block).
pub struct BlockWriter<'a, T> {
    ptr: *mut T,
    len: usize,
    dims: [usize; 3],
    components: usize,
    block: Range3D,
    _marker: PhantomData<&'a mut [T]>,
}

impl<T> BlockWriter<'_, T> {
    pub fn block(&self) -> &Range3D {
        &self.block
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Flat voxel index, x fastest.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.dims[1] + y) * self.dims[0] + x
    }

    /// Mutable components of voxel `(x, y, z)`.
    #[inline]
    pub fn tuple_mut(&mut self, x: usize, y: usize, z: usize) -> &mut [T] {
        assert!(
            self.block.contains(x, y, z),
            "voxel ({}, {}, {}) outside block {:?}",
            x,
            y,
            z,
            self.block
        );
        let start = self.index(x, y, z) * self.components;
        assert!(start + self.components <= self.len);
        // SAFETY: in bounds per the asserts above; the voxel belongs to this
        // writer's block, which no other writer overlaps.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.add(start), self.components) }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, component: usize, value: T) {
        self.tuple_mut(x, y, z)[component] = value;
    }
}
