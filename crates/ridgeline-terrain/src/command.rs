//! The layer interface the pipeline drives.

use crate::buffer::{LayerInputs, MapBufferInfo};
use crate::executor::{CommandDesc, LayerExecutor};
use crate::kernel::Kernel;

/// One layer of a heightmap pipeline.
///
/// Expensive preparation (building a spanning tree, seeding a noise table)
/// happens when the command is constructed; [`Command::prepare`] only turns
/// the command into a kernel for one buffer.
pub trait Command: Send + Sync {
    /// Human-readable layer type, as written in layer scripts.
    fn name(&self) -> &'static str;

    /// Builds the per-pixel kernel for a buffer of the given shape.
    fn prepare(&self, info: &MapBufferInfo, inputs: LayerInputs<'_>) -> Kernel<'_>;

    /// Evaluates the layer into `destination` using `executor`.
    fn execute(
        &self,
        executor: &LayerExecutor,
        info: &MapBufferInfo,
        prev: Option<&[f32]>,
        current: Option<&[f32]>,
        destination: &mut [f32],
    ) {
        let inputs = LayerInputs::new(prev, current);
        let kernel = self.prepare(info, inputs);
        executor.run(CommandDesc::new(*info, inputs, kernel, destination));
    }
}
