//! Descriptor: the small configuration record consumed by every
//! high-level operation to control masking, transposition, output
//! replacement and the multiply algorithm hint.

use crate::context::Context;
use crate::error::GrbError;

/// `desc.out`: whether the output is cleared before `C<M> = results` is
/// written through the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputPolicy {
    /// Leave `C`'s existing entries in place outside the mask's effect.
    #[default]
    Default,
    /// Clear `C` before the masked write.
    Replace,
}

/// `desc.mask`: how the mask matrix `M` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaskPolicy {
    /// Negate the mask: `M(i,j)=0` means "write", not "don't write".
    pub complement: bool,
    /// Use only `M`'s pattern (any present entry counts as true),
    /// ignoring its values.
    pub structural: bool,
}

/// `desc.in0`/`desc.in1`: whether an input is transposed before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransposePolicy {
    /// Use the matrix as-is.
    #[default]
    Default,
    /// Use the matrix's transpose.
    Transpose,
}

/// `desc.axb`: algorithm hint for `mxm`/`vxm`/`mxv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxbMethod {
    /// Let the engine choose based on operand shape and density.
    #[default]
    Default,
    /// Gustavson's gather-scatter saxpy method.
    Gustavson,
    /// Hash-table accumulation.
    Hash,
    /// Either Gustavson or hash, engine's choice.
    Saxpy,
    /// Dot-product, column-by-column.
    Dot,
}

/// A matrix-operation configuration record.
///
/// Each field defaults to the permissive/no-op choice: an unconfigured
/// descriptor behaves exactly like no descriptor at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Descriptor {
    /// Output-replace policy.
    pub out: OutputPolicy,
    /// Mask interpretation.
    pub mask: MaskPolicy,
    /// Transpose the first input.
    pub in0: TransposePolicy,
    /// Transpose the second input.
    pub in1: TransposePolicy,
    /// Multiply algorithm hint.
    pub axb: AxbMethod,
    /// Force sorted output for `mxm`.
    pub sort: bool,
    /// Thread-count hint; `0` defers to the global default.
    pub nthreads_max: usize,
    /// Chunk-size hint; `0` defers to the global default.
    pub chunk: usize,
}

impl Descriptor {
    /// A descriptor with every field at its default value.
    pub fn new() -> Descriptor {
        Descriptor::default()
    }
}

/// Resolved descriptor contents plus the `Context` derived from it.
/// Boolean fields spell out each raw descriptor setting so kernels never
/// re-derive them, and the accompanying `Context` carries the resolved
/// thread-count and chunk-size hints.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedDescriptor {
    /// `true` if `C` should be cleared before the masked write.
    pub c_replace: bool,
    /// `true` if the mask is complemented.
    pub mask_comp: bool,
    /// `true` if only the mask's structure is used.
    pub mask_struct: bool,
    /// `true` if the first input should be transposed.
    pub in0_transpose: bool,
    /// `true` if the second input should be transposed.
    pub in1_transpose: bool,
    /// Selected multiply algorithm hint.
    pub axb_method: AxbMethod,
    /// `true` if sorted output is forced.
    pub do_sort: bool,
}

/// Resolve a descriptor (or its absence, meaning all-default) into a
/// `ResolvedDescriptor` and a `Context` for `where_fn_name`.
///
/// There is no invalid combination to reject here: every field of
/// `Descriptor` is a closed Rust enum/bool, so construction alone
/// guarantees validity instead of needing a runtime combination check.
pub fn descriptor_get(
    desc: Option<&Descriptor>,
    where_fn_name: &'static str,
) -> Result<(ResolvedDescriptor, Context), GrbError> {
    let d = desc.copied().unwrap_or_default();
    let mut ctx = Context::new(where_fn_name);
    if d.nthreads_max > 0 {
        ctx.nthreads_max = d.nthreads_max;
    }
    if d.chunk > 0 {
        ctx.chunk = d.chunk;
    }
    let resolved = ResolvedDescriptor {
        c_replace: matches!(d.out, OutputPolicy::Replace),
        mask_comp: d.mask.complement,
        mask_struct: d.mask.structural,
        in0_transpose: matches!(d.in0, TransposePolicy::Transpose),
        in1_transpose: matches!(d.in1, TransposePolicy::Transpose),
        axb_method: d.axb,
        do_sort: d.sort,
    };
    Ok((resolved, ctx))
}

impl ResolvedDescriptor {
    /// `true` when a mask is both complemented and would be empty: every
    /// entry is then allowed through, so the caller can skip running the
    /// kernel and simply copy the unmasked result. `mask_is_empty` is
    /// supplied by the caller, which already has `M` in hand.
    pub fn short_circuits_on_empty_mask(&self, mask_is_empty: bool) -> bool {
        mask_is_empty && self.mask_comp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_descriptor_resolves_to_all_defaults() {
        let (r, _ctx) = descriptor_get(None, "test").unwrap();
        assert!(!r.c_replace);
        assert!(!r.mask_comp);
        assert!(!r.in0_transpose);
        assert_eq!(r.axb_method, AxbMethod::Default);
    }

    #[test]
    fn complemented_empty_mask_short_circuits() {
        let mut d = Descriptor::new();
        d.mask.complement = true;
        let (r, _ctx) = descriptor_get(Some(&d), "test").unwrap();
        assert!(r.short_circuits_on_empty_mask(true));
        assert!(!r.short_circuits_on_empty_mask(false));
    }
}
