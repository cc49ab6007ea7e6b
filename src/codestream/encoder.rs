use std::io::Write;

use tracing::{debug, trace};

use super::bit_io::J2kBitWriter;
use super::block_coder::encode_band;
use super::boundary::{LineExchange, LineRequest};
use super::color::{forward_ict, forward_rct};
use super::dwt::{Dwt53, Dwt97, forward_levels};
use super::packet::{PacketHeader, packet_order, write_packet};
use super::params::{CodParams, Point, SizParams, zeroed, zeroed_plane};
use super::parser::color_transform_applies;
use super::quantization::{absolute_step, decode_step, encode_step, quantize_scalar};
use super::subband::resolution_subbands;
use super::writer::J2kWriter;
use crate::error::Htj2kError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncoderState {
    Initial,
    HeadersWritten,
    Flushed,
    Closed,
}

/// Line-driven encoder writing a single-tile codestream to `W`.
///
/// Lines are collected into per-component planes; the wavelet transform,
/// block coding and packet emission happen on [`flush`](LineExchange::flush).
pub struct Htj2kEncoder<W: Write> {
    sink: W,
    state: EncoderState,
    siz: Option<SizParams>,
    cod: Option<CodParams>,
    planar: bool,
    extents: Vec<Point>,
    /// Per component: (min, max, level shift).
    sample_levels: Vec<(i32, i32, i32)>,
    planes: Vec<Vec<i32>>,
    line: Vec<i32>,
    schedule: Vec<(u32, u32)>,
    next_line: usize,
    pending: Option<(u32, u32)>,
    bytes_written: u64,
}

impl<W: Write> Htj2kEncoder<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            state: EncoderState::Initial,
            siz: None,
            cod: None,
            planar: false,
            extents: Vec::new(),
            sample_levels: Vec::new(),
            planes: Vec::new(),
            line: Vec::new(),
            schedule: Vec::new(),
            next_line: 0,
            pending: None,
            bytes_written: 0,
        }
    }

    /// Bytes handed to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn expect_state(&self, state: EncoderState) -> Result<(), Htj2kError> {
        if self.state == state {
            Ok(())
        } else {
            Err(Htj2kError::InvalidOperation)
        }
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<(), Htj2kError> {
        self.sink
            .write_all(bytes)
            .map_err(|_| Htj2kError::OutputWriteFailed)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Moves the line lent by the last exchange into its plane, level shifted.
    fn commit_pending(&mut self) {
        let Some((component, row)) = self.pending.take() else {
            return;
        };
        let c = component as usize;
        let width = self.extents[c].x as usize;
        let (min, max, shift) = self.sample_levels[c];
        let start = row as usize * width;
        for (dst, src) in self.planes[c][start..start + width]
            .iter_mut()
            .zip(&self.line[..width])
        {
            *dst = (*src).clamp(min, max) - shift;
        }
    }

    /// Wavelet coefficients per component, quantized on the irreversible path.
    fn transform(&mut self, siz: &SizParams, cod: &CodParams) -> Vec<Vec<i32>> {
        let levels = usize::from(cod.decomposition_levels);
        let mut planes = std::mem::take(&mut self.planes);
        if cod.reversible {
            if cod.color_transform {
                if let [c0, c1, c2, ..] = planes.as_mut_slice() {
                    forward_rct(c0, c1, c2);
                }
            }
            let mut wavelet = Dwt53::default();
            for (plane, extent) in planes.iter_mut().zip(&self.extents) {
                forward_levels(&mut wavelet, plane, extent.x as usize, extent.y as usize, levels);
            }
            return planes;
        }

        let mut real: Vec<Vec<f32>> = planes
            .iter()
            .map(|plane| plane.iter().map(|&v| v as f32).collect())
            .collect();
        if cod.color_transform {
            if let [c0, c1, c2, ..] = real.as_mut_slice() {
                forward_ict(c0, c1, c2);
            }
        }
        let mut wavelet = Dwt97::default();
        for (c, (plane, extent)) in real.iter_mut().zip(&self.extents).enumerate() {
            forward_levels(&mut wavelet, plane, extent.x as usize, extent.y as usize, levels);
            let step = absolute_step(cod.quantization_step, siz.components[c].bit_depth);
            for (dst, &coefficient) in planes[c].iter_mut().zip(plane.iter()) {
                *dst = quantize_scalar(coefficient, step);
            }
        }
        planes
    }
}

impl<W: Write> LineExchange for Htj2kEncoder<W> {
    fn configure(&mut self, siz: SizParams) -> Result<(), Htj2kError> {
        self.expect_state(EncoderState::Initial)?;
        siz.validate()?;
        self.siz = Some(siz);
        Ok(())
    }

    fn configure_coding(&mut self, cod: CodParams) -> Result<(), Htj2kError> {
        self.expect_state(EncoderState::Initial)?;
        cod.validate()?;
        self.cod = Some(cod);
        Ok(())
    }

    fn set_planar(&mut self, planar: bool) -> Result<(), Htj2kError> {
        self.expect_state(EncoderState::Initial)?;
        self.planar = planar;
        Ok(())
    }

    fn write_headers(&mut self) -> Result<(), Htj2kError> {
        self.expect_state(EncoderState::Initial)?;
        let siz = self.siz.clone().ok_or(Htj2kError::InvalidOperation)?;
        let mut cod = self.cod.ok_or(Htj2kError::InvalidOperation)?;
        if cod.color_transform && !color_transform_applies(&siz) {
            return Err(Htj2kError::ColorTransformNotSupported);
        }
        if !cod.reversible {
            // quantize with the step the decoder will read back
            cod.quantization_step = decode_step(encode_step(cod.quantization_step));
        }

        self.extents = (0..siz.component_count())
            .map(|c| siz.component_extent(c))
            .collect();
        self.planes = self
            .extents
            .iter()
            .map(|&extent| zeroed_plane(extent))
            .collect::<Result<Vec<Vec<i32>>, _>>()?;
        let widest = self.extents.iter().map(|e| e.x).max().unwrap_or(0);
        self.line = zeroed(widest as usize)?;

        let mut writer = J2kWriter::new();
        writer.write_soc();
        writer.write_siz(&siz);
        writer.write_cod(&cod);
        writer.write_qcd(&cod, &siz);
        writer.write_qcc(&cod, &siz);
        writer.write_sot();
        writer.write_sod();
        self.emit(writer.as_bytes())?;

        self.sample_levels = siz
            .components
            .iter()
            .map(|component| {
                let (min, max) = component.sample_range();
                (min, max, component.level_shift())
            })
            .collect();
        self.schedule = siz.line_schedule(0, self.planar);
        self.next_line = 0;
        trace!(
            lines = self.schedule.len(),
            planar = self.planar,
            "codestream headers written"
        );
        self.cod = Some(cod);
        self.state = EncoderState::HeadersWritten;
        Ok(())
    }

    fn exchange(&mut self) -> Result<Option<LineRequest<'_>>, Htj2kError> {
        self.expect_state(EncoderState::HeadersWritten)?;
        self.commit_pending();

        let Some(&(component, row)) = self.schedule.get(self.next_line) else {
            return Ok(None);
        };
        self.next_line += 1;
        self.pending = Some((component, row));
        let width = self.extents[component as usize].x as usize;
        Ok(Some(LineRequest {
            component,
            line: &mut self.line[..width],
        }))
    }

    fn flush(&mut self) -> Result<(), Htj2kError> {
        self.expect_state(EncoderState::HeadersWritten)?;
        let siz = self.siz.clone().ok_or(Htj2kError::InvalidOperation)?;
        let cod = self.cod.ok_or(Htj2kError::InvalidOperation)?;
        self.commit_pending();
        if self.next_line < self.schedule.len() {
            return Err(Htj2kError::LinesNotExchanged);
        }

        let coefficients = self.transform(&siz, &cod);
        let levels = usize::from(cod.decomposition_levels);
        let mut writer = J2kWriter::new();
        for (sequence, (c, resolution)) in
            packet_order(cod.progression_order, siz.component_count(), levels + 1)
                .into_iter()
                .enumerate()
        {
            let extent = self.extents[c];
            let (width, height) = (extent.x as usize, extent.y as usize);
            let mut body = J2kBitWriter::new();
            for band in resolution_subbands(width, height, levels, resolution) {
                encode_band(&coefficients[c], width, band.rect, cod.block_dims, &mut body);
            }
            let body = body.finish();
            let header = PacketHeader {
                sequence: sequence as u16,
                component: c as u16,
                resolution: resolution as u8,
                body_length: body.len() as u32,
            };
            write_packet(&mut writer, &header, &body);
        }
        writer.write_eoc();
        self.emit(writer.as_bytes())?;
        self.sink
            .flush()
            .map_err(|_| Htj2kError::OutputWriteFailed)?;

        debug!(
            width = siz.extent.x,
            height = siz.extent.y,
            components = siz.component_count(),
            levels,
            reversible = cod.reversible,
            order = %cod.progression_order,
            bytes = self.bytes_written,
            "codestream flushed"
        );
        self.state = EncoderState::Flushed;
        Ok(())
    }

    fn close(&mut self) {
        self.planes = Vec::new();
        self.line = Vec::new();
        self.schedule = Vec::new();
        self.pending = None;
        self.state = EncoderState::Closed;
    }
}
