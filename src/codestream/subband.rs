//! Subband layout of a component plane after in-place decomposition.
//!
//! Each decomposition level splits the current low-pass region of size
//! `w x h` into LL `ceil(w/2) x ceil(h/2)` at the top-left, HL to its right,
//! LH below it and HH diagonal. Resolution 0 is the final LL; resolution `r`
//! adds the three detail bands of level `levels - r + 1`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubbandOrientation {
    Ll,
    Hl,
    Lh,
    Hh,
}

impl SubbandOrientation {
    /// log2 of the nominal dynamic range gain of the band.
    pub fn gain(self) -> u8 {
        match self {
            SubbandOrientation::Ll => 0,
            SubbandOrientation::Hl | SubbandOrientation::Lh => 1,
            SubbandOrientation::Hh => 2,
        }
    }
}

/// Half-open rectangle in plane coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Rect {
    pub fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }

    pub fn height(&self) -> usize {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subband {
    pub orientation: SubbandOrientation,
    pub rect: Rect,
}

/// Low-pass region size before level 1 (`sizes[0]`) and after each level.
pub fn level_sizes(width: usize, height: usize, levels: usize) -> Vec<(usize, usize)> {
    let mut sizes = Vec::with_capacity(levels + 1);
    let (mut w, mut h) = (width, height);
    sizes.push((w, h));
    for _ in 0..levels {
        w = w.div_ceil(2);
        h = h.div_ceil(2);
        sizes.push((w, h));
    }
    sizes
}

/// Subbands contributing to `resolution` (0..=levels). Empty bands are kept
/// so callers see a fixed band count per resolution.
pub fn resolution_subbands(
    width: usize,
    height: usize,
    levels: usize,
    resolution: usize,
) -> Vec<Subband> {
    let sizes = level_sizes(width, height, levels);
    if resolution == 0 {
        let (w, h) = sizes[levels];
        return vec![Subband {
            orientation: SubbandOrientation::Ll,
            rect: Rect::new(0, 0, w, h),
        }];
    }
    let level = levels - resolution + 1;
    let (outer_w, outer_h) = sizes[level - 1];
    let (low_w, low_h) = sizes[level];
    vec![
        Subband {
            orientation: SubbandOrientation::Hl,
            rect: Rect::new(low_w, 0, outer_w, low_h),
        },
        Subband {
            orientation: SubbandOrientation::Lh,
            rect: Rect::new(0, low_h, low_w, outer_h),
        },
        Subband {
            orientation: SubbandOrientation::Hh,
            rect: Rect::new(low_w, low_h, outer_w, outer_h),
        },
    ]
}
