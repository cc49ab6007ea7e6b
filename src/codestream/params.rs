//! Image and coding parameters as carried by the SIZ and COD/QCD segments.

use crate::coding_parameters::ProgressionOrder;
use crate::constants::{
    MAXIMUM_CODEBLOCK_AREA, MAXIMUM_CODEBLOCK_SIZE, MAXIMUM_CODESTREAM_BIT_DEPTH,
    MAXIMUM_CODESTREAM_COMPONENTS, MAXIMUM_DECOMPOSITION_LEVELS, MAXIMUM_QUANTIZATION_STEP,
    MINIMUM_CODEBLOCK_SIZE,
};
use crate::error::Htj2kError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// `x * y`, or `None` when it does not fit in `usize`.
    pub fn area(&self) -> Option<usize> {
        (self.x as usize).checked_mul(self.y as usize)
    }
}

/// A zero-filled buffer of `len` elements, failing instead of aborting when
/// the allocation cannot be made.
pub fn zeroed<T: Clone + Default>(len: usize) -> Result<Vec<T>, Htj2kError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| Htj2kError::NotEnoughMemory)?;
    buffer.resize(len, T::default());
    Ok(buffer)
}

/// A zero-filled plane covering `extent`.
pub fn zeroed_plane<T: Clone + Default>(extent: Point) -> Result<Vec<T>, Htj2kError> {
    zeroed(extent.area().ok_or(Htj2kError::NotEnoughMemory)?)
}

/// Per-component SIZ fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentSiz {
    pub downsampling: Point,
    pub bit_depth: u8,
    pub is_signed: bool,
}

impl ComponentSiz {
    pub fn new(bit_depth: u8, is_signed: bool) -> Self {
        Self {
            downsampling: Point::new(1, 1),
            bit_depth,
            is_signed,
        }
    }

    pub fn with_downsampling(mut self, dx: u32, dy: u32) -> Self {
        self.downsampling = Point::new(dx, dy);
        self
    }

    /// Inclusive sample range of the component.
    pub fn sample_range(&self) -> (i32, i32) {
        if self.is_signed {
            (-(1 << (self.bit_depth - 1)), (1 << (self.bit_depth - 1)) - 1)
        } else {
            (0, (1 << self.bit_depth) - 1)
        }
    }

    /// Offset removed from unsigned samples before the transform.
    pub fn level_shift(&self) -> i32 {
        if self.is_signed {
            0
        } else {
            1 << (self.bit_depth - 1)
        }
    }
}

/// Image extent and component layout. The image is a single tile anchored at
/// the origin.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SizParams {
    pub extent: Point,
    pub components: Vec<ComponentSiz>,
}

impl SizParams {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            extent: Point::new(width, height),
            components: Vec::new(),
        }
    }

    pub fn with_component(mut self, component: ComponentSiz) -> Self {
        self.components.push(component);
        self
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Full-resolution extent of component `c`.
    pub fn component_extent(&self, c: usize) -> Point {
        self.reduced_component_extent(c, 0)
    }

    /// Image extent with `skipped_levels` resolutions dropped.
    pub fn reduced_extent(&self, skipped_levels: u32) -> Point {
        Point::new(
            self.extent.x.checked_shr(skipped_levels).unwrap_or(0),
            self.extent.y.checked_shr(skipped_levels).unwrap_or(0),
        )
    }

    /// Extent of component `c` with `skipped_levels` resolutions dropped.
    pub fn reduced_component_extent(&self, c: usize, skipped_levels: u32) -> Point {
        let reduced = self.reduced_extent(skipped_levels);
        match self.components.get(c) {
            Some(component) => Point::new(
                reduced.x.div_ceil(component.downsampling.x.max(1)),
                reduced.y.div_ceil(component.downsampling.y.max(1)),
            ),
            None => Point::default(),
        }
    }

    /// Order in which component lines are exchanged, as (component, row).
    /// Interleaved order walks image rows and yields component `c` on rows
    /// that are a multiple of its vertical downsampling; planar order yields
    /// every row of component 0 first.
    pub fn line_schedule(&self, skipped_levels: u32, planar: bool) -> Vec<(u32, u32)> {
        let count = self.components.len();
        let mut schedule = Vec::new();
        if planar {
            for c in 0..count {
                let rows = self.reduced_component_extent(c, skipped_levels).y;
                schedule.extend((0..rows).map(|row| (c as u32, row)));
            }
        } else {
            for y in 0..self.reduced_extent(skipped_levels).y {
                for (c, component) in self.components.iter().enumerate() {
                    let dy = component.downsampling.y.max(1);
                    if y % dy == 0 {
                        schedule.push((c as u32, y / dy));
                    }
                }
            }
        }
        schedule
    }

    pub fn validate(&self) -> Result<(), Htj2kError> {
        if self.extent.x == 0 || self.extent.y == 0 {
            return Err(Htj2kError::InvalidParameterExtent);
        }
        if self.components.is_empty() || self.components.len() > MAXIMUM_CODESTREAM_COMPONENTS {
            return Err(Htj2kError::InvalidParameterComponentCount);
        }
        for component in &self.components {
            if !(1..=MAXIMUM_CODESTREAM_BIT_DEPTH).contains(&component.bit_depth) {
                return Err(Htj2kError::InvalidParameterBitDepth);
            }
            let Point { x, y } = component.downsampling;
            if !(1..=255).contains(&x) || !(1..=255).contains(&y) {
                return Err(Htj2kError::InvalidParameterDownsampling);
            }
        }
        Ok(())
    }
}

/// Coding style: wavelet, code-blocks, progression and quantization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodParams {
    pub decomposition_levels: u8,
    /// Code-block width and height, powers of two.
    pub block_dims: Point,
    pub progression_order: ProgressionOrder,
    /// Multi-component transform on the first three components.
    pub color_transform: bool,
    /// 5/3 integer wavelet when set, 9/7 with quantization otherwise.
    pub reversible: bool,
    /// Base quantization step relative to the component range; irreversible only.
    pub quantization_step: f32,
}

impl Default for CodParams {
    fn default() -> Self {
        Self {
            decomposition_levels: 5,
            block_dims: Point::new(64, 64),
            progression_order: ProgressionOrder::Rpcl,
            color_transform: false,
            reversible: true,
            quantization_step: 0.0,
        }
    }
}

impl CodParams {
    pub fn resolution_count(&self) -> usize {
        usize::from(self.decomposition_levels) + 1
    }

    pub fn validate(&self) -> Result<(), Htj2kError> {
        if u32::from(self.decomposition_levels) > MAXIMUM_DECOMPOSITION_LEVELS {
            return Err(Htj2kError::InvalidParameterDecompositionLevels);
        }
        let Point { x, y } = self.block_dims;
        for size in [x, y] {
            if !size.is_power_of_two()
                || !(MINIMUM_CODEBLOCK_SIZE..=MAXIMUM_CODEBLOCK_SIZE).contains(&size)
            {
                return Err(Htj2kError::InvalidParameterCodeblockSize);
            }
        }
        if x * y > MAXIMUM_CODEBLOCK_AREA {
            return Err(Htj2kError::InvalidParameterCodeblockSize);
        }
        let step = self.quantization_step;
        if !self.reversible && !(step > 0.0 && step < MAXIMUM_QUANTIZATION_STEP) {
            return Err(Htj2kError::InvalidParameterQuantizationStep);
        }
        Ok(())
    }
}
