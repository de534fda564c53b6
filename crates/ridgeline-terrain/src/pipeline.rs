//! Ordered layer commands evaluated through three rotating scratch buffers.

use std::time::Instant;

use tracing::{debug, info};

use crate::buffer::MapBufferInfo;
use crate::command::Command;
use crate::executor::LayerExecutor;
use crate::filter;

/// A heightmap recipe: world extent plus the commands producing it.
///
/// Command `i` sees the result of command `i - 1` as `current` and of command
/// `i - 2` as `prev`. The last command writes straight into the caller's
/// buffer.
pub struct Pipeline {
    world_size_x: f32,
    world_size_y: f32,
    pixels_per_world_unit: f32,
    commands: Vec<Box<dyn Command>>,
    executor: LayerExecutor,
}

impl Pipeline {
    /// # Panics
    ///
    /// Panics on a non-positive world size or pixel density.
    pub fn new(world_size_x: f32, world_size_y: f32, pixels_per_world_unit: f32) -> Self {
        assert!(
            world_size_x > 0.0 && world_size_y > 0.0,
            "world size must be positive, got {world_size_x}x{world_size_y}"
        );
        assert!(
            pixels_per_world_unit > 0.0,
            "pixels per world unit must be positive, got {pixels_per_world_unit}"
        );
        Self {
            world_size_x,
            world_size_y,
            pixels_per_world_unit,
            commands: Vec::new(),
            executor: LayerExecutor::new(),
        }
    }

    /// Replaces the executor used for every layer.
    pub fn with_executor(mut self, executor: LayerExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn executor(&self) -> &LayerExecutor {
        &self.executor
    }

    /// Appends a command after all existing ones.
    pub fn push(&mut self, command: impl Command + 'static) {
        self.commands.push(Box::new(command));
    }

    pub fn push_boxed(&mut self, command: Box<dyn Command>) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Box<dyn Command>] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// World extent as `(x, y)`.
    pub fn world_size(&self) -> (f32, f32) {
        (self.world_size_x, self.world_size_y)
    }

    pub fn pixels_per_world_unit(&self) -> f32 {
        self.pixels_per_world_unit
    }

    /// Resolution covering the world extent at the authored pixel density,
    /// at least one pixel per axis.
    pub fn native_resolution(&self) -> (usize, usize) {
        let rx = (self.world_size_x * self.pixels_per_world_unit) as usize;
        let ry = (self.world_size_y * self.pixels_per_world_unit) as usize;
        (rx.max(1), ry.max(1))
    }

    pub fn buffer_info(&self, resolution_x: usize, resolution_y: usize) -> MapBufferInfo {
        MapBufferInfo::new(
            self.world_size_x,
            self.world_size_y,
            self.pixels_per_world_unit,
            resolution_x,
            resolution_y,
        )
    }

    /// Runs every command and returns the final row-major buffer.
    pub fn execute(&self, resolution_x: usize, resolution_y: usize, normalize: bool) -> Vec<f32> {
        let mut output = vec![0.0; resolution_x * resolution_y];
        self.execute_into(resolution_x, resolution_y, normalize, &mut output);
        output
    }

    /// Runs every command, writing the final result into `destination`.
    ///
    /// With no commands the destination is zero-filled. With `normalize` the
    /// result is rescaled to `[0, 1]` afterwards.
    ///
    /// # Panics
    ///
    /// Panics on a zero resolution or if `destination` has the wrong length.
    pub fn execute_into(
        &self,
        resolution_x: usize,
        resolution_y: usize,
        normalize: bool,
        destination: &mut [f32],
    ) {
        let info = self.buffer_info(resolution_x, resolution_y);
        assert_eq!(
            destination.len(),
            info.len(),
            "destination holds {} cells, {resolution_x}x{resolution_y} needs {}",
            destination.len(),
            info.len()
        );

        let started = Instant::now();
        let count = self.commands.len();
        if count == 0 {
            destination.fill(0.0);
        }

        // Slot `i % 3` receives command `i`; the next two slots hold the
        // results of `i - 2` and `i - 1`.
        let mut buffers: [Vec<f32>; 3] = if count > 1 {
            std::array::from_fn(|_| vec![0.0; info.len()])
        } else {
            Default::default()
        };

        for (i, command) in self.commands.iter().enumerate() {
            let layer_started = Instant::now();
            let slot = i % 3;
            if i + 1 == count {
                let prev = (i >= 2).then(|| buffers[(slot + 1) % 3].as_slice());
                let current = (i >= 1).then(|| buffers[(slot + 2) % 3].as_slice());
                command.execute(&self.executor, &info, prev, current, destination);
            } else {
                let (target, older, newer) = rotate(&mut buffers, slot);
                let prev = (i >= 2).then_some(older);
                let current = (i >= 1).then_some(newer);
                command.execute(&self.executor, &info, prev, current, target);
            }
            debug!(
                layer = i,
                command = command.name(),
                elapsed_ms = layer_started.elapsed().as_secs_f64() * 1000.0,
                "layer complete"
            );
        }

        if normalize {
            filter::normalize(destination);
        }

        info!(
            layers = count,
            width = resolution_x,
            height = resolution_y,
            threads = self.executor.threads(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "heightmap generated"
        );
    }
}

/// Splits the scratch buffers into the write target at `slot` and the two
/// read-only slots after it.
fn rotate(buffers: &mut [Vec<f32>; 3], slot: usize) -> (&mut [f32], &[f32], &[f32]) {
    let [a, b, c] = buffers;
    match slot {
        0 => (a.as_mut_slice(), b.as_slice(), c.as_slice()),
        1 => (b.as_mut_slice(), c.as_slice(), a.as_slice()),
        _ => (c.as_mut_slice(), a.as_slice(), b.as_slice()),
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.commands.iter().map(|c| c.name()).collect();
        f.debug_struct("Pipeline")
            .field("world_size_x", &self.world_size_x)
            .field("world_size_y", &self.world_size_y)
            .field("pixels_per_world_unit", &self.pixels_per_world_unit)
            .field("commands", &names)
            .field("executor", &self.executor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::blend::{BlendCommand, BlendOp};
    use crate::buffer::LayerInputs;
    use crate::generator::{MstDistanceCommand, MstMode};
    use crate::kernel::{Kernel, PixelKernel};
    use crate::noise::{NoiseContext, ValueNoiseCommand, ValueNoiseParams};

    /// Fills the layer with a constant; `current`, if any, is added.
    struct Constant(f32);

    impl Command for Constant {
        fn name(&self) -> &'static str {
            "Constant"
        }

        fn prepare(&self, _info: &MapBufferInfo, _inputs: LayerInputs<'_>) -> Kernel<'_> {
            Kernel::Filter(crate::filter::FilterKernel::Rescale {
                min: -self.0,
                scale: 1.0,
            })
        }
    }

    #[test]
    fn test_empty_pipeline_yields_zeros() {
        let pipeline = Pipeline::new(8.0, 8.0, 1.0);
        let mut out = vec![3.0; 16];
        pipeline.execute_into(4, 4, false, &mut out);
        assert!(out.iter().all(|&v| v == 0.0));
        assert_eq!(pipeline.execute(2, 3, true), vec![0.0; 6]);
    }

    #[test]
    fn test_buffer_rotation_feeds_prev_and_current() {
        // Rescale without a current input returns zero, so Constant(c)
        // evaluates to current + c when a previous result exists.
        let mut pipeline =
            Pipeline::new(4.0, 4.0, 1.0).with_executor(LayerExecutor::with_threads(3));
        pipeline.push(Constant(1.0));
        pipeline.push(Constant(2.0));
        pipeline.push(BlendCommand::new(BlendOp::Add));
        pipeline.push(Constant(10.0));
        pipeline.push(BlendCommand::new(BlendOp::Multiply));

        // 0: 0 (no current), 1: 0 + 2 = 2, 2: prev 0 + cur 2 = 2,
        // 3: 2 + 10 = 12, 4: prev 2 * cur 12 = 24.
        let out = pipeline.execute(4, 4, false);
        assert!(out.iter().all(|&v| v == 24.0), "{out:?}");
    }

    #[test]
    fn test_rotation_over_many_layers() {
        let mut pipeline = Pipeline::new(2.0, 2.0, 1.0);
        for _ in 0..7 {
            pipeline.push(Constant(1.0));
        }
        // Every layer after the first adds one to the previous result.
        let out = pipeline.execute(3, 2, false);
        assert!(out.iter().all(|&v| v == 6.0), "{out:?}");
    }

    #[test]
    fn test_ridge_pipeline_normalizes() {
        let mut pipeline = Pipeline::new(64.0, 64.0, 1.0);
        pipeline.push(MstDistanceCommand::new(
            &[
                Vec3::new(10.0, 10.0, 1.0),
                Vec3::new(50.0, 20.0, 0.8),
                Vec3::new(30.0, 55.0, 0.6),
            ],
            30.0,
            0.3,
            MstMode::Ridges,
        ));
        pipeline.push(ValueNoiseCommand::new(ValueNoiseParams {
            context: NoiseContext::new(5),
            height_scale: 2.0,
            ..Default::default()
        }));
        pipeline.push(BlendCommand::new(BlendOp::Add));

        let out = pipeline.execute(64, 64, true);
        let (min, max) = crate::filter::value_range(&out).expect("non-empty buffer");
        assert_eq!(min, 0.0);
        assert!((max - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_thread_count_does_not_change_output() {
        let build = |threads| {
            let mut pipeline =
                Pipeline::new(40.0, 30.0, 1.0).with_executor(LayerExecutor::with_threads(threads));
            pipeline.push(MstDistanceCommand::new(
                &[Vec3::new(5.0, 5.0, 1.0), Vec3::new(35.0, 25.0, 0.5)],
                20.0,
                0.3,
                MstMode::Valleys,
            ));
            pipeline.push(ValueNoiseCommand::new(ValueNoiseParams::default()));
            pipeline.push(BlendCommand::new(BlendOp::Refract(3.0)));
            pipeline.execute(40, 30, false)
        };
        let reference = build(1);
        for threads in [2, 3, 7, 64] {
            assert_eq!(build(threads), reference, "threads = {threads}");
        }
    }

    #[test]
    fn test_native_resolution_uses_both_axes() {
        let pipeline = Pipeline::new(100.0, 50.0, 2.0);
        assert_eq!(pipeline.native_resolution(), (200, 100));
    }

    #[test]
    #[should_panic(expected = "destination holds")]
    fn test_wrong_destination_length_panics() {
        let pipeline = Pipeline::new(4.0, 4.0, 1.0);
        let mut out = vec![0.0; 5];
        pipeline.execute_into(2, 2, false, &mut out);
    }

    #[test]
    fn test_constant_kernel_reads_current() {
        let info = MapBufferInfo::new(1.0, 1.0, 1.0, 1, 1);
        let current = [4.0];
        let command = Constant(1.5);
        let kernel = command.prepare(&info, LayerInputs::new(None, Some(&current)));
        let value = kernel.evaluate(&info, 0, 0, &LayerInputs::new(None, Some(&current)));
        assert_eq!(value, 5.5);
    }
}
