pub const MINIMUM_COMPONENT_COUNT: u8 = 1;
pub const MAXIMUM_COMPONENT_COUNT: u8 = 4;
pub const MINIMUM_BITS_PER_SAMPLE: u8 = 1;
pub const MAXIMUM_BITS_PER_SAMPLE: u8 = 16;

// ISO/IEC 15444-1, A.6.1: at most 32 decomposition levels.
pub const MAXIMUM_DECOMPOSITION_LEVELS: u32 = 32;

// ISO/IEC 15444-1, A.6.1: code-block dimensions are powers of two in 4..=1024
// and xcb + ycb <= 12.
pub const MINIMUM_CODEBLOCK_SIZE: u32 = 4;
pub const MAXIMUM_CODEBLOCK_SIZE: u32 = 1024;
pub const MAXIMUM_CODEBLOCK_AREA: u32 = 4096;

// The codestream codec itself accepts more components than the bridge exposes.
pub const MAXIMUM_CODESTREAM_COMPONENTS: usize = 16384;
pub const MAXIMUM_CODESTREAM_BIT_DEPTH: u8 = 16;

// The QCD step word carries 2^-exponent * (1 + mantissa / 2048) with a
// non-negative exponent, so relative steps stay below 2.
pub const MAXIMUM_QUANTIZATION_STEP: f32 = 2.0;

// Number of guard bits signalled in QCD.
pub const GUARD_BITS: u8 = 1;

// Width of the per-code-block magnitude prefix.
pub const MAGNITUDE_BITS_PREFIX: u8 = 5;

