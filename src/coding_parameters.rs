//! Compression configuration for the encode path.

use std::fmt;
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::constants::{
    MAXIMUM_CODEBLOCK_AREA, MAXIMUM_CODEBLOCK_SIZE, MAXIMUM_DECOMPOSITION_LEVELS,
    MAXIMUM_QUANTIZATION_STEP, MINIMUM_CODEBLOCK_SIZE,
};
use crate::error::BridgeError;

/// Packet progression order of the codestream (ISO/IEC 15444-1, table A.16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ProgressionOrder {
    /// Layer-resolution-component-position.
    Lrcp = 0,
    /// Resolution-layer-component-position.
    Rlcp = 1,
    /// Resolution-position-component-layer.
    #[default]
    Rpcl = 2,
    /// Position-component-resolution-layer.
    Pcrl = 3,
    /// Component-position-resolution-layer.
    Cprl = 4,
}

impl ProgressionOrder {
    pub const ALL: [ProgressionOrder; 5] = [
        ProgressionOrder::Lrcp,
        ProgressionOrder::Rlcp,
        ProgressionOrder::Rpcl,
        ProgressionOrder::Pcrl,
        ProgressionOrder::Cprl,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProgressionOrder::Lrcp => "LRCP",
            ProgressionOrder::Rlcp => "RLCP",
            ProgressionOrder::Rpcl => "RPCL",
            ProgressionOrder::Pcrl => "PCRL",
            ProgressionOrder::Cprl => "CPRL",
        }
    }

    /// Converts the integer form used by C-style callers (0=LRCP .. 4=CPRL).
    /// Anything outside that range is rejected, never clamped.
    pub fn from_index(index: i32) -> Result<Self, BridgeError> {
        u8::try_from(index)
            .ok()
            .and_then(|value| ProgressionOrder::try_from(value).ok())
            .ok_or_else(|| BridgeError::invalid(format!("invalid progression order {index}")))
    }

    /// True when resolutions are the outermost packet loop.
    pub fn is_resolution_major(self) -> bool {
        matches!(
            self,
            ProgressionOrder::Lrcp | ProgressionOrder::Rlcp | ProgressionOrder::Rpcl
        )
    }
}

impl fmt::Display for ProgressionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProgressionOrder {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProgressionOrder::ALL
            .into_iter()
            .find(|order| order.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| BridgeError::invalid(format!("invalid progression order '{s}'")))
    }
}

/// Parameters controlling how an image is coded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionParams {
    /// Number of wavelet decompositions.
    pub decomposition_levels: u32,
    /// Code-block width, a power of two.
    pub codeblock_width: u32,
    /// Code-block height, a power of two.
    pub codeblock_height: u32,
    /// Quantization step relative to the sample range (lower = better quality).
    /// Ignored when `lossless` is set.
    pub quantization_step: f32,
    pub lossless: bool,
    /// Apply the component decorrelating transform; only effective with 3+ components.
    pub apply_color_transform: bool,
    /// Downsample every component but the first by 2x2.
    pub chroma_subsample: bool,
    pub progression_order: ProgressionOrder,
}

impl Default for CompressionParams {
    fn default() -> Self {
        Self {
            decomposition_levels: 5,
            codeblock_width: 64,
            codeblock_height: 64,
            quantization_step: 0.001,
            lossless: true,
            apply_color_transform: true,
            chroma_subsample: false,
            progression_order: ProgressionOrder::Rpcl,
        }
    }
}

impl CompressionParams {
    pub fn lossy(quantization_step: f32) -> Self {
        Self {
            quantization_step,
            lossless: false,
            ..Self::default()
        }
    }

    pub fn with_decomposition_levels(mut self, levels: u32) -> Self {
        self.decomposition_levels = levels;
        self
    }

    pub fn with_codeblock_size(mut self, width: u32, height: u32) -> Self {
        self.codeblock_width = width;
        self.codeblock_height = height;
        self
    }

    pub fn with_color_transform(mut self, enabled: bool) -> Self {
        self.apply_color_transform = enabled;
        self
    }

    pub fn with_chroma_subsample(mut self, enabled: bool) -> Self {
        self.chroma_subsample = enabled;
        self
    }

    pub fn with_progression_order(mut self, order: ProgressionOrder) -> Self {
        self.progression_order = order;
        self
    }

    /// Effective color transform gate for an image with `components` components.
    pub fn color_transform_for(&self, components: u8) -> bool {
        self.apply_color_transform && components >= 3
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.decomposition_levels > MAXIMUM_DECOMPOSITION_LEVELS {
            return Err(BridgeError::invalid(format!(
                "decomposition levels {} exceed {MAXIMUM_DECOMPOSITION_LEVELS}",
                self.decomposition_levels
            )));
        }
        for (name, size) in [
            ("width", self.codeblock_width),
            ("height", self.codeblock_height),
        ] {
            if !size.is_power_of_two()
                || !(MINIMUM_CODEBLOCK_SIZE..=MAXIMUM_CODEBLOCK_SIZE).contains(&size)
            {
                return Err(BridgeError::invalid(format!(
                    "code-block {name} {size} is not a power of two in \
                     {MINIMUM_CODEBLOCK_SIZE}..={MAXIMUM_CODEBLOCK_SIZE}"
                )));
            }
        }
        if self.codeblock_width * self.codeblock_height > MAXIMUM_CODEBLOCK_AREA {
            return Err(BridgeError::invalid(format!(
                "code-block area {}x{} exceeds {MAXIMUM_CODEBLOCK_AREA} samples",
                self.codeblock_width, self.codeblock_height
            )));
        }
        let step = self.quantization_step;
        if !self.lossless && !(step > 0.0 && step < MAXIMUM_QUANTIZATION_STEP) {
            return Err(BridgeError::invalid(format!(
                "quantization step {step} outside (0, {MAXIMUM_QUANTIZATION_STEP})"
            )));
        }
        Ok(())
    }
}
