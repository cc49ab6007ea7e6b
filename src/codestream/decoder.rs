use tracing::{debug, warn};

use super::bit_io::J2kBitReader;
use super::block_coder::{clear_band, decode_band};
use super::boundary::{DecodedLine, LinePull};
use super::color::{inverse_ict, inverse_rct};
use super::dwt::{Dwt53, Dwt97, inverse_levels};
use super::marker::J2kMarker;
use super::packet::{find_next_packet, read_packet_header};
use super::params::{CodParams, Point, SizParams, zeroed, zeroed_plane};
use super::parser::{J2kReader, parse_headers};
use super::quantization::{absolute_step, dequantize_scalar};
use super::subband::resolution_subbands;
use crate::error::Htj2kError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Initial,
    HeadersRead,
    Decoding,
    Closed,
}

/// Decoder over an in-memory codestream produced by
/// [`Htj2kEncoder`](super::Htj2kEncoder).
///
/// In resilient mode damaged packets are dropped (their subbands decode as
/// zero), the reader resynchronizes on the next SOP marker, and a missing
/// EOC is tolerated.
pub struct Htj2kDecoder<'a> {
    source: &'a [u8],
    state: DecoderState,
    resilient: bool,
    skipped_levels: u32,
    siz: SizParams,
    cod: CodParams,
    data_offset: usize,
    outputs: Vec<Vec<i32>>,
    widths: Vec<usize>,
    schedule: Vec<(u32, u32)>,
    next_line: usize,
    damaged_packets: usize,
}

impl<'a> Htj2kDecoder<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            state: DecoderState::Initial,
            resilient: false,
            skipped_levels: 0,
            siz: SizParams::default(),
            cod: CodParams::default(),
            data_offset: 0,
            outputs: Vec::new(),
            widths: Vec::new(),
            schedule: Vec::new(),
            next_line: 0,
            damaged_packets: 0,
        }
    }

    pub fn cod(&self) -> &CodParams {
        &self.cod
    }

    /// Packets dropped or missing in resilient mode.
    pub fn damaged_packets(&self) -> usize {
        self.damaged_packets
    }

    fn expect_state(&self, state: DecoderState) -> Result<(), Htj2kError> {
        if self.state == state {
            Ok(())
        } else {
            Err(Htj2kError::InvalidOperation)
        }
    }

    fn resolution_count(&self) -> usize {
        self.cod.resolution_count()
    }

    /// Resolutions actually reconstructed.
    fn kept_resolutions(&self) -> usize {
        self.resolution_count() - self.skipped_levels as usize
    }

    fn full_extents(&self) -> Vec<Point> {
        (0..self.siz.component_count())
            .map(|c| self.siz.component_extent(c))
            .collect()
    }

    /// Reads every packet into zero-initialized coefficient planes.
    fn read_packets(&mut self) -> Result<Vec<Vec<i32>>, Htj2kError> {
        let extents = self.full_extents();
        let mut planes = extents
            .iter()
            .map(|&extent| zeroed_plane(extent))
            .collect::<Result<Vec<Vec<i32>>, _>>()?;
        let mut seen = vec![false; planes.len() * self.resolution_count()];
        let mut reader = J2kReader::new(self.source);
        reader.set_position(self.data_offset);
        let mut end_found = false;
        let mut damaged = 0;

        while reader.remaining() > 0 {
            if reader.at_marker(J2kMarker::EndOfCodestream) {
                end_found = true;
                break;
            }
            let start = reader.position();
            match self.read_packet(&mut reader, &mut planes, &mut seen, &extents) {
                Ok(()) => {}
                Err(error) if self.resilient => {
                    damaged += 1;
                    warn!(offset = start, %error, "skipping damaged packet data");
                    match find_next_packet(self.source, start + 1) {
                        Some(next) => reader.set_position(next),
                        None => break,
                    }
                }
                Err(error) => return Err(error),
            }
        }

        if !end_found && !self.resilient {
            return Err(Htj2kError::EndOfCodestreamNotFound);
        }
        let resolutions = self.resolution_count();
        let kept = self.kept_resolutions();
        let missing = seen
            .iter()
            .enumerate()
            .filter(|(slot, present)| slot % resolutions < kept && !**present)
            .count();
        if missing > 0 {
            if !self.resilient {
                return Err(Htj2kError::MissingPacket);
            }
            warn!(missing, "packets missing from codestream");
        }
        self.damaged_packets = damaged + missing;
        Ok(planes)
    }

    fn read_packet(
        &self,
        reader: &mut J2kReader,
        planes: &mut [Vec<i32>],
        seen: &mut [bool],
        extents: &[Point],
    ) -> Result<(), Htj2kError> {
        let header = read_packet_header(reader)?;
        let c = usize::from(header.component);
        let r = usize::from(header.resolution);
        let resolutions = self.resolution_count();
        if c >= planes.len() || r >= resolutions {
            return Err(Htj2kError::InvalidPacket);
        }
        let body = reader.read_bytes(header.body_length as usize)?;
        let slot = c * resolutions + r;
        if seen[slot] {
            return Err(Htj2kError::DuplicatePacket);
        }
        seen[slot] = true;
        if r >= self.kept_resolutions() {
            return Ok(());
        }

        let width = extents[c].x as usize;
        let height = extents[c].y as usize;
        let levels = usize::from(self.cod.decomposition_levels);
        let bands = resolution_subbands(width, height, levels, r);
        let mut bits = J2kBitReader::new(body);
        for band in &bands {
            if let Err(error) =
                decode_band(&mut planes[c], width, band.rect, self.cod.block_dims, &mut bits)
            {
                for band in &bands {
                    clear_band(&mut planes[c], width, band.rect);
                }
                return Err(error);
            }
        }
        Ok(())
    }

    fn reconstruct_reversible(&self, mut planes: Vec<Vec<i32>>) -> Vec<Vec<i32>> {
        let levels = usize::from(self.cod.decomposition_levels);
        let mut wavelet = Dwt53::default();
        let mut outputs: Vec<Vec<i32>> = planes
            .iter_mut()
            .zip(self.full_extents())
            .enumerate()
            .map(|(c, (plane, full))| {
                let (width, height) = (full.x as usize, full.y as usize);
                inverse_levels(&mut wavelet, plane, width, height, levels, self.skipped_levels as usize);
                crop(plane, width, self.siz.reduced_component_extent(c, self.skipped_levels))
            })
            .collect();
        if self.cod.color_transform {
            if let [c0, c1, c2, ..] = outputs.as_mut_slice() {
                inverse_rct(c0, c1, c2);
            }
        }
        for (output, component) in outputs.iter_mut().zip(&self.siz.components) {
            let (min, max) = component.sample_range();
            let shift = i64::from(component.level_shift());
            for value in output.iter_mut() {
                *value = (i64::from(*value) + shift).clamp(i64::from(min), i64::from(max)) as i32;
            }
        }
        outputs
    }

    fn reconstruct_irreversible(
        &self,
        planes: Vec<Vec<i32>>,
    ) -> Result<Vec<Vec<i32>>, Htj2kError> {
        let levels = usize::from(self.cod.decomposition_levels);
        let mut wavelet = Dwt97::default();
        let mut outputs = planes
            .iter()
            .zip(self.full_extents())
            .zip(&self.siz.components)
            .enumerate()
            .map(|(c, ((plane, full), component))| {
                let step = absolute_step(self.cod.quantization_step, component.bit_depth);
                let mut real: Vec<f32> = zeroed(plane.len())?;
                for (value, &q) in real.iter_mut().zip(plane) {
                    *value = dequantize_scalar(q, step);
                }
                let (width, height) = (full.x as usize, full.y as usize);
                inverse_levels(&mut wavelet, &mut real, width, height, levels, self.skipped_levels as usize);
                Ok(crop(&real, width, self.siz.reduced_component_extent(c, self.skipped_levels)))
            })
            .collect::<Result<Vec<Vec<f32>>, Htj2kError>>()?;
        if self.cod.color_transform {
            if let [c0, c1, c2, ..] = outputs.as_mut_slice() {
                inverse_ict(c0, c1, c2);
            }
        }
        Ok(outputs
            .iter()
            .zip(&self.siz.components)
            .map(|(output, component)| {
                let (min, max) = component.sample_range();
                let shift = i64::from(component.level_shift());
                output
                    .iter()
                    .map(|v| (v.round() as i64 + shift).clamp(i64::from(min), i64::from(max)) as i32)
                    .collect()
            })
            .collect())
    }
}

/// Top-left `extent` of a plane with row stride `stride`.
fn crop<T: Copy>(plane: &[T], stride: usize, extent: Point) -> Vec<T> {
    let width = extent.x as usize;
    (0..extent.y as usize)
        .flat_map(|y| plane[y * stride..y * stride + width].iter().copied())
        .collect()
}

impl LinePull for Htj2kDecoder<'_> {
    fn enable_resilience(&mut self) -> Result<(), Htj2kError> {
        self.expect_state(DecoderState::Initial)?;
        self.resilient = true;
        Ok(())
    }

    fn read_headers(&mut self) -> Result<(), Htj2kError> {
        self.expect_state(DecoderState::Initial)?;
        let header = parse_headers(self.source)?;
        debug!(
            width = header.siz.extent.x,
            height = header.siz.extent.y,
            components = header.siz.component_count(),
            levels = header.cod.decomposition_levels,
            reversible = header.cod.reversible,
            order = %header.cod.progression_order,
            "codestream headers read"
        );
        self.siz = header.siz;
        self.cod = header.cod;
        self.data_offset = header.data_offset;
        self.state = DecoderState::HeadersRead;
        Ok(())
    }

    fn restrict_input_resolution(&mut self, skipped_levels: u32) -> Result<(), Htj2kError> {
        self.expect_state(DecoderState::HeadersRead)?;
        let reduced = self.siz.reduced_extent(skipped_levels);
        if skipped_levels > u32::from(self.cod.decomposition_levels)
            || reduced.x == 0
            || reduced.y == 0
        {
            return Err(Htj2kError::InvalidParameterResolution);
        }
        self.skipped_levels = skipped_levels;
        Ok(())
    }

    fn siz(&self) -> &SizParams {
        &self.siz
    }

    fn create(&mut self) -> Result<(), Htj2kError> {
        self.expect_state(DecoderState::HeadersRead)?;
        let planes = self.read_packets()?;
        self.outputs = if self.cod.reversible {
            self.reconstruct_reversible(planes)
        } else {
            self.reconstruct_irreversible(planes)?
        };
        self.widths = (0..self.siz.component_count())
            .map(|c| self.siz.reduced_component_extent(c, self.skipped_levels).x as usize)
            .collect();
        self.schedule = self.siz.line_schedule(self.skipped_levels, false);
        self.next_line = 0;
        debug!(
            skipped_levels = self.skipped_levels,
            damaged_packets = self.damaged_packets,
            lines = self.schedule.len(),
            "codestream decoded"
        );
        self.state = DecoderState::Decoding;
        Ok(())
    }

    fn pull(&mut self) -> Result<Option<DecodedLine<'_>>, Htj2kError> {
        self.expect_state(DecoderState::Decoding)?;
        let Some(&(component, row)) = self.schedule.get(self.next_line) else {
            return Ok(None);
        };
        self.next_line += 1;
        let c = component as usize;
        let width = self.widths[c];
        let start = row as usize * width;
        Ok(Some(DecodedLine {
            component,
            line: &self.outputs[c][start..start + width],
        }))
    }

    fn close(&mut self) {
        self.outputs = Vec::new();
        self.schedule = Vec::new();
        self.state = DecoderState::Closed;
    }
}
