//! Row-band parallel evaluation of per-pixel kernels.
//!
//! The destination is split into contiguous row bands, one per worker.
//! Every band except the last runs on a scoped worker thread, the last on
//! the calling thread, and all workers are joined before the layer returns.
//! Each cell is written exactly once, so the output does not depend on the
//! number of threads.

use std::io;
use std::ops::Range;
use std::thread;

use tracing::warn;

use crate::buffer::{LayerInputs, MapBufferInfo};
use crate::kernel::PixelKernel;

/// Everything one executor call needs.
pub struct CommandDesc<'a, K> {
    pub info: MapBufferInfo,
    pub inputs: LayerInputs<'a>,
    pub kernel: K,
    pub destination: &'a mut [f32],
}

impl<'a, K: PixelKernel> CommandDesc<'a, K> {
    pub fn new(
        info: MapBufferInfo,
        inputs: LayerInputs<'a>,
        kernel: K,
        destination: &'a mut [f32],
    ) -> Self {
        Self {
            info,
            inputs,
            kernel,
            destination,
        }
    }

    fn validate(&self) {
        let len = self.info.len();
        assert_eq!(
            self.destination.len(),
            len,
            "destination holds {} cells, buffer needs {len}",
            self.destination.len()
        );
        for (name, input) in [("prev", self.inputs.prev), ("current", self.inputs.current)] {
            if let Some(input) = input {
                assert_eq!(
                    input.len(),
                    len,
                    "{name} input holds {} cells, buffer needs {len}",
                    input.len()
                );
            }
        }
    }
}

/// Dispatches kernels over row bands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerExecutor {
    threads: usize,
}

impl Default for LayerExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerExecutor {
    /// One band per available hardware thread.
    pub fn new() -> Self {
        Self::with_threads(num_cpus::get())
    }

    /// Uses `threads` bands; zero is treated as one.
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
        }
    }

    /// Evaluates everything on the calling thread.
    pub fn sequential() -> Self {
        Self::with_threads(1)
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Evaluates the kernel over the whole buffer using row bands.
    ///
    /// # Panics
    ///
    /// Panics if the destination or an input does not match the buffer size,
    /// or if the kernel panics on any thread.
    pub fn run<K: PixelKernel>(&self, desc: CommandDesc<'_, K>) {
        self.run_with_permits(desc, |_band| Ok(()));
    }

    /// [`LayerExecutor::run`] with `permit` consulted before each worker
    /// spawn. A refused permit is handled exactly like a failed spawn.
    pub(crate) fn run_with_permits<K: PixelKernel>(
        &self,
        desc: CommandDesc<'_, K>,
        mut permit: impl FnMut(usize) -> io::Result<()>,
    ) {
        desc.validate();
        let CommandDesc {
            info,
            inputs,
            kernel,
            destination,
        } = desc;

        let bands = self.threads.min(info.resolution_y);
        if bands <= 1 {
            fill_rows(&info, &inputs, &kernel, 0, destination);
            return;
        }

        let rows_per_band = info.resolution_y.div_ceil(bands);
        let band_len = rows_per_band * info.resolution_x;
        let kernel = &kernel;

        let stranded = thread::scope(|scope| {
            let mut stranded: Option<Range<usize>> = None;
            let mut chunks = destination.chunks_mut(band_len).enumerate().peekable();
            while let Some((band, rows)) = chunks.next() {
                let first_row = band * rows_per_band;
                if chunks.peek().is_none() || stranded.is_some() {
                    fill_rows(&info, &inputs, kernel, first_row, rows);
                    continue;
                }
                let spawned = permit(band).and_then(|()| {
                    thread::Builder::new()
                        .name(format!("layer-worker-{band}"))
                        .spawn_scoped(scope, move || {
                            fill_rows(&info, &inputs, kernel, first_row, rows)
                        })
                });
                if let Err(err) = spawned {
                    warn!(
                        band,
                        error = %err,
                        "failed to spawn layer worker, continuing on the calling thread"
                    );
                    let last_row = (first_row + rows_per_band).min(info.resolution_y);
                    stranded = Some(first_row..last_row);
                }
            }
            stranded
        });

        // The band whose spawn failed was moved into the lost closure; redo it
        // now that the scope has released the destination.
        if let Some(rows) = stranded {
            let cells = rows.start * info.resolution_x..rows.end * info.resolution_x;
            fill_rows(&info, &inputs, kernel, rows.start, &mut destination[cells]);
        }
    }

    /// Evaluates the kernel row by row on the calling thread. Produces the
    /// same output as [`LayerExecutor::run`].
    pub fn run_sequential<K: PixelKernel>(&self, desc: CommandDesc<'_, K>) {
        desc.validate();
        fill_rows(&desc.info, &desc.inputs, &desc.kernel, 0, desc.destination);
    }
}

fn fill_rows<K: PixelKernel>(
    info: &MapBufferInfo,
    inputs: &LayerInputs<'_>,
    kernel: &K,
    first_row: usize,
    rows: &mut [f32],
) {
    for (offset, row) in rows.chunks_mut(info.resolution_x).enumerate() {
        let y = first_row + offset;
        for (x, cell) in row.iter_mut().enumerate() {
            *cell = kernel.evaluate(info, x, y, inputs);
        }
    }
}
