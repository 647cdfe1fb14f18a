//! Device fields: layered 2D arrays with parallel per-texel kernel dispatch.
//!
//! Every stage of the ocean pipeline allocates its buffers here and runs its
//! kernels through [`DeviceField::dispatch`], one invocation per texel. The
//! backing store is host memory and rows are spread over the rayon pool, so a
//! kernel must not depend on the order texels are visited in.

use rayon::prelude::*;

/// A `width x height x layers` array of texels
#[derive(Debug, Clone)]
pub struct DeviceField<T> {
    width: usize,
    height: usize,
    layers: usize,
    data: Vec<T>,
}

impl<T: Copy + Default + Send + Sync> DeviceField<T> {
    /// Allocate a zero-initialised (default-initialised) field
    pub fn allocate(label: &'static str, width: usize, height: usize, layers: usize) -> Self {
        log::debug!(
            "Allocating device field '{}' ({}x{}x{})",
            label,
            width,
            height,
            layers
        );
        Self {
            width,
            height,
            layers,
            data: vec![T::default(); width * height * layers],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Texels per layer
    pub fn layer_len(&self) -> usize {
        self.width * self.height
    }

    /// Upload texels into one layer
    pub fn write(&mut self, layer: usize, texels: &[T]) {
        debug_assert_eq!(texels.len(), self.layer_len(), "write size mismatch");
        self.read_mut(layer).copy_from_slice(texels);
    }

    /// Borrow one layer in row-major order (`z * width + x`)
    pub fn read(&self, layer: usize) -> &[T] {
        let len = self.layer_len();
        &self.data[layer * len..(layer + 1) * len]
    }

    pub fn read_mut(&mut self, layer: usize) -> &mut [T] {
        let len = self.layer_len();
        &mut self.data[layer * len..(layer + 1) * len]
    }

    /// All layers, back to back
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn texel(&self, layer: usize, x: usize, z: usize) -> T {
        self.data[layer * self.layer_len() + z * self.width + x]
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Run `kernel(x, z, texel)` over every texel of one layer
    pub fn dispatch<F>(&mut self, layer: usize, kernel: F)
    where
        F: Fn(usize, usize, &mut T) + Sync + Send,
    {
        let width = self.width;
        self.read_mut(layer)
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(z, row)| {
                for (x, texel) in row.iter_mut().enumerate() {
                    kernel(x, z, texel);
                }
            });
    }

    /// Run `kernel(layer, x, z, texel)` over every texel of every layer
    pub fn dispatch_all<F>(&mut self, kernel: F)
    where
        F: Fn(usize, usize, usize, &mut T) + Sync + Send,
    {
        let (width, height) = (self.width, self.height);
        self.data
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row_index, row)| {
                let layer = row_index / height;
                let z = row_index % height;
                for (x, texel) in row.iter_mut().enumerate() {
                    kernel(layer, x, z, texel);
                }
            });
    }
}
