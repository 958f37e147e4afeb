//! Persistence envelope: a matrix serializes as a header describing its
//! shape/type/format plus a payload of `(I, J, X)` triplets. The
//! envelope may be sharded into [`MatrixChunk`]s, each carrying a
//! `schema` that declares how many chunks of each [`ChunkKind`] the
//! sender intends to send; a [`MatrixLoader`] replays them and reports
//! [`LoadProgress::Complete`] once every declared chunk has arrived, at
//! which point it clears its accumulated state and applies any pending
//! work on the reconstructed matrix.
//!
//! Gated behind the `serde` feature rather than made unconditional, so
//! downstream consumers that never serialize a matrix don't pay for the
//! dependency.

use serde::{Deserialize, Serialize};

use grb_types::{ElementType, TypeCode};

use crate::error::{GrbError, GrbResult};
use crate::matrix::{dump_tuples, rebuild_from_entries, Matrix, Sparsity, SparsityControl};

/// The fixed-size part of a serialized matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixHeader {
    /// Raw [`TypeCode`] discriminant; stored as `u32` rather than the
    /// type itself so the envelope doesn't need `TypeCode` to carry a
    /// `serde` derive.
    pub type_code: u32,
    /// Length of one outer slice.
    pub vlen: u64,
    /// Number of outer slices.
    pub vdim: u64,
    /// `true` if entries are column-major.
    pub is_csc: bool,
    /// Format at the time of serialization; the loader rebuilds a fresh
    /// matrix and lets `conform` repick, so this is informational only.
    pub sparsity: Sparsity,
    /// `true` if every entry shares one stored scalar.
    pub iso: bool,
    /// Number of non-empty outer slices at serialization time.
    pub nvec: usize,
    /// Number of present entries.
    pub nvals: usize,
}

/// The `(I, J, X)` triplet payload, in whatever order the source
/// matrix's format naturally produced. The sender's own `P`/`H`/`B`
/// arrays are not part of the wire format: the loader rebuilds a fresh
/// matrix from coordinates alone and lets it pick its own internal
/// layout, so only the coordinate-value triples need to cross the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixPayload {
    /// Row indices.
    pub i: Vec<u64>,
    /// Column indices.
    pub j: Vec<u64>,
    /// Concatenated value bytes, `elem_size` bytes per entry (or exactly
    /// one `elem_size`-byte scalar when `header.iso` is set).
    pub x: Vec<u8>,
    /// Byte width of one value.
    pub elem_size: usize,
}

/// A complete, unsharded serialized matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixEnvelope {
    /// The header.
    pub header: MatrixHeader,
    /// The payload.
    pub payload: MatrixPayload,
}

impl MatrixEnvelope {
    /// Capture `m` into an envelope. Resolves pending work first, since
    /// the wire format has no representation for a pending queue.
    pub fn from_matrix(m: &mut Matrix) -> GrbResult<MatrixEnvelope> {
        if m.needs_wait() {
            m.wait()?;
        }
        let ty = m.element_type().clone();
        let elem_size = ty.size();
        let type_code = match ty.code() {
            grb_types::Code::Builtin(c) => c as u32,
            grb_types::Code::UserDefined(_) => {
                return Err(GrbError::InvalidObject {
                    where_: "MatrixEnvelope::from_matrix",
                    details: "user-defined element types have no stable persistence encoding".into(),
                })
            }
        };
        let triplets = dump_tuples(m)?;
        let mut i = Vec::with_capacity(triplets.len());
        let mut j = Vec::with_capacity(triplets.len());
        let mut x = Vec::with_capacity(triplets.len() * elem_size);
        for (r, c, bytes) in &triplets {
            i.push(*r);
            j.push(*c);
            if !m.is_iso() {
                x.extend_from_slice(bytes);
            }
        }
        if m.is_iso() {
            if let Some(scalar) = m.iso_scalar() {
                x.extend_from_slice(scalar);
            }
        }
        Ok(MatrixEnvelope {
            header: MatrixHeader {
                type_code,
                vlen: m.vlen,
                vdim: m.vdim,
                is_csc: m.is_csc(),
                sparsity: m.format(),
                iso: m.is_iso(),
                nvec: m.nvec,
                nvals: m.nvals(),
            },
            payload: MatrixPayload { i, j, x, elem_size },
        })
    }

    /// Reconstruct a matrix from a complete envelope.
    pub fn into_matrix(self) -> GrbResult<Matrix> {
        rebuild_header_and_payload(self.header, self.payload)
    }
}

fn rebuild_header_and_payload(header: MatrixHeader, payload: MatrixPayload) -> GrbResult<Matrix> {
    let code = TypeCode::from_raw(header.type_code).map_err(|_| GrbError::InvalidValue {
        where_: "MatrixEnvelope::into_matrix",
        details: format!("unknown type code {}", header.type_code),
    })?;
    let ty = ElementType::builtin(code);
    let (nrows, ncols) = if header.is_csc { (header.vlen, header.vdim) } else { (header.vdim, header.vlen) };
    let mut template = Matrix::new(ty, nrows, ncols, SparsityControl::AUTO)?;
    template.is_csc = header.is_csc;

    if header.iso {
        let entries: Vec<(u64, u64, Vec<u8>)> = payload.i.iter().zip(payload.j.iter()).map(|(&r, &c)| (r, c, Vec::new())).collect();
        let mut m = rebuild_from_entries(&template, entries)?;
        m.set_iso_scalar(payload.x);
        return Ok(m);
    }

    if payload.i.len() != payload.j.len() || payload.x.len() != payload.i.len() * payload.elem_size {
        return Err(GrbError::DimensionMismatch {
            where_: "MatrixEnvelope::into_matrix",
            details: "I, J and X lengths disagree".into(),
        });
    }
    let entries: Vec<(u64, u64, Vec<u8>)> = payload
        .i
        .iter()
        .zip(payload.j.iter())
        .enumerate()
        .map(|(k, (&r, &c))| (r, c, payload.x[k * payload.elem_size..(k + 1) * payload.elem_size].to_vec()))
        .collect();
    rebuild_from_entries(&template, entries)
}

/// Which part of the envelope a [`MatrixChunk`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkKind {
    /// Carries a [`MatrixHeader`].
    Header,
    /// Carries a slice of the `(I, J, X)` payload.
    Entries,
}

/// One shard of a sharded matrix transfer. `schema` is the sender's
/// declaration of how many chunks of each [`ChunkKind`] the whole
/// transfer will contain, sent identically on every chunk so a loader
/// starting mid-stream (or re-fed a retransmission) can still recognize
/// completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixChunk {
    /// `(kind, count)` pairs; `count` entries of `kind` are expected
    /// across the whole transfer.
    pub schema: Vec<(ChunkKind, usize)>,
    /// This chunk's payload.
    pub payload: ChunkPayload,
}

/// The payload carried by one [`MatrixChunk`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChunkPayload {
    /// The matrix header.
    Header(MatrixHeader),
    /// A slice of entries, in the same `(i, j, x, elem_size)` shape as
    /// [`MatrixPayload`].
    Entries {
        /// Row indices.
        i: Vec<u64>,
        /// Column indices.
        j: Vec<u64>,
        /// Concatenated value bytes.
        x: Vec<u8>,
        /// Byte width of one value; `0` for an iso chunk whose `x` is
        /// the single shared scalar rather than one value per entry.
        elem_size: usize,
        /// `true` if `x` is this matrix's one shared iso scalar rather
        /// than `i.len()` individual values.
        iso: bool,
    },
}

/// What [`MatrixLoader::feed_chunk`] reports after absorbing one chunk.
pub enum LoadProgress {
    /// More chunks are still expected.
    Pending,
    /// Every declared chunk has arrived; the matrix is fully
    /// reconstructed and pending work has already been applied.
    Complete(Box<Matrix>),
}

/// Accumulates [`MatrixChunk`]s from a sharded transfer and reconstructs
/// the matrix once the declared chunk count is reached.
#[derive(Default)]
pub struct MatrixLoader {
    declared_total: Option<usize>,
    seen: usize,
    header: Option<MatrixHeader>,
    i: Vec<u64>,
    j: Vec<u64>,
    x: Vec<u8>,
    elem_size: Option<usize>,
    iso: bool,
}

impl MatrixLoader {
    /// A loader with nothing absorbed yet.
    pub fn new() -> MatrixLoader {
        MatrixLoader::default()
    }

    /// Absorb one chunk. Returns [`LoadProgress::Complete`] once the
    /// number of chunks fed equals every chunk's declared `schema`
    /// total, at which point pending work has already been resolved on
    /// the returned matrix.
    pub fn feed_chunk(&mut self, chunk: MatrixChunk) -> GrbResult<LoadProgress> {
        let declared: usize = chunk.schema.iter().map(|(_, count)| *count).sum();
        match self.declared_total {
            None => self.declared_total = Some(declared),
            Some(expected) if expected != declared => {
                return Err(GrbError::InvalidObject {
                    where_: "MatrixLoader::feed_chunk",
                    details: "chunk schema disagrees with a previously seen chunk's schema".into(),
                })
            }
            _ => {}
        }

        match chunk.payload {
            ChunkPayload::Header(h) => self.header = Some(h),
            ChunkPayload::Entries { i, j, x, elem_size, iso } => {
                self.i.extend(i);
                self.j.extend(j);
                self.x.extend(x);
                self.elem_size = Some(elem_size);
                self.iso = self.iso || iso;
            }
        }
        self.seen += 1;

        if Some(self.seen) != self.declared_total {
            return Ok(LoadProgress::Pending);
        }

        let header = self.header.take().ok_or(GrbError::UninitializedObject {
            where_: "MatrixLoader::feed_chunk",
        })?;
        let payload = MatrixPayload {
            i: std::mem::take(&mut self.i),
            j: std::mem::take(&mut self.j),
            x: std::mem::take(&mut self.x),
            elem_size: self.elem_size.unwrap_or(0),
        };
        self.declared_total = None;
        self.seen = 0;
        self.iso = false;

        let mut m = rebuild_header_and_payload(header, payload)?;
        if m.needs_wait() {
            m.wait()?;
        }
        Ok(LoadProgress::Complete(Box::new(m)))
    }
}

#[cfg(test)]
mod tests {
    use grb_types::TypeCode;

    use super::*;

    fn sample_matrix() -> Matrix {
        let mut m = Matrix::new(ElementType::builtin(TypeCode::Int32), 3, 3, SparsityControl::AUTO).unwrap();
        m.set_element(0u64, 0u64, 1i32).unwrap();
        m.set_element(1u64, 2u64, 5i32).unwrap();
        m.wait().unwrap();
        m
    }

    #[test]
    fn round_trips_through_a_single_envelope() {
        let mut m = sample_matrix();
        let env = MatrixEnvelope::from_matrix(&mut m).unwrap();
        let mut rebuilt = env.into_matrix().unwrap();
        let v: i32 = rebuilt.extract_element(0, 0).unwrap().unwrap();
        assert_eq!(v, 1);
        let v: i32 = rebuilt.extract_element(1, 2).unwrap().unwrap();
        assert_eq!(v, 5);
        assert_eq!(rebuilt.nvals(), 2);
    }

    #[test]
    fn loader_reports_pending_until_every_declared_chunk_arrives() {
        let mut m = sample_matrix();
        let env = MatrixEnvelope::from_matrix(&mut m).unwrap();
        let schema = vec![(ChunkKind::Header, 1), (ChunkKind::Entries, 1)];

        let mut loader = MatrixLoader::new();
        let progress = loader
            .feed_chunk(MatrixChunk {
                schema: schema.clone(),
                payload: ChunkPayload::Header(env.header.clone()),
            })
            .unwrap();
        assert!(matches!(progress, LoadProgress::Pending));

        let progress = loader
            .feed_chunk(MatrixChunk {
                schema,
                payload: ChunkPayload::Entries {
                    i: env.payload.i.clone(),
                    j: env.payload.j.clone(),
                    x: env.payload.x.clone(),
                    elem_size: env.payload.elem_size,
                    iso: false,
                },
            })
            .unwrap();
        match progress {
            LoadProgress::Complete(m) => assert_eq!(m.nvals(), 2),
            LoadProgress::Pending => panic!("loader should have completed"),
        }
    }

    #[test]
    fn loader_rejects_a_chunk_whose_schema_disagrees() {
        let mut m = sample_matrix();
        let env = MatrixEnvelope::from_matrix(&mut m).unwrap();
        let mut loader = MatrixLoader::new();
        loader
            .feed_chunk(MatrixChunk {
                schema: vec![(ChunkKind::Header, 1), (ChunkKind::Entries, 1)],
                payload: ChunkPayload::Header(env.header),
            })
            .unwrap();
        let err = loader.feed_chunk(MatrixChunk {
            schema: vec![(ChunkKind::Header, 1), (ChunkKind::Entries, 2)],
            payload: ChunkPayload::Entries {
                i: env.payload.i,
                j: env.payload.j,
                x: env.payload.x,
                elem_size: env.payload.elem_size,
                iso: false,
            },
        });
        assert!(err.is_err());
    }

    #[test]
    fn iso_matrix_round_trips_its_single_shared_scalar() {
        let ty = ElementType::builtin(TypeCode::Fp64);
        let mut m = Matrix::build(ty, 4, 4, &[0u64, 1, 2], &[0u64, 1, 2], &[9.5f64], None).unwrap();
        let env = MatrixEnvelope::from_matrix(&mut m).unwrap();
        assert!(env.header.iso);
        let mut rebuilt = env.into_matrix().unwrap();
        let v: f64 = rebuilt.extract_element(1, 1).unwrap().unwrap();
        assert_eq!(v, 9.5);
    }
}
