//! Decide how (and whether) the mask takes part in the product

use crate::config::{AxbMethod, MaskRegime, Saxpy3Config};
use crate::utility::util::as_f64;

/// Outcome of the mask-cost policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MaskDecision {
    pub regime: MaskRegime,
    pub method: AxbMethod,
    /// The flop count included the mask and must be redone without it.
    pub recount: bool,
    /// A dense mask scan must be added to every column's cost.
    pub add_dense_cost: bool,
}

/// What the policy needs to know about the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MaskShape {
    Absent,
    Sparse,
    Dense,
}

/// Choose the mask regime from the flop estimate.
///
/// `total_flops` includes `mask_work` for a sparse mask; dense masks are
/// never part of the estimate. A sparse mask is discarded when the product
/// work is below `mask_alpha * mask_work`. A dense mask is read in place
/// with the Hash method when the product work is below `mask_beta * cvlen *
/// cvdim`, and otherwise forces Gustavson with the scan added to the cost.
/// An explicit method hint keeps its method and reads a dense mask in place.
pub(crate) fn decide(
    shape: MaskShape,
    total_flops: i64,
    mask_work: i64,
    cvlen: usize,
    cvdim: usize,
    method: AxbMethod,
    config: &Saxpy3Config,
) -> MaskDecision {
    let keep = |regime| MaskDecision {
        regime,
        method,
        recount: false,
        add_dense_cost: false,
    };
    let discard = MaskDecision {
        regime: MaskRegime::Discard,
        method,
        recount: shape == MaskShape::Sparse,
        add_dense_cost: false,
    };
    let dense_in_place = MaskDecision {
        regime: MaskRegime::DenseInPlace,
        method: if method == AxbMethod::Default {
            AxbMethod::Hash
        } else {
            method
        },
        recount: false,
        add_dense_cost: false,
    };
    let dense_gustavson = MaskDecision {
        regime: MaskRegime::DenseGustavson,
        method: AxbMethod::Gustavson,
        recount: false,
        add_dense_cost: true,
    };

    if shape == MaskShape::Absent {
        return keep(MaskRegime::NoMask);
    }

    if let Some(forced) = config.force_mask_regime {
        return match (forced, shape) {
            (MaskRegime::Discard | MaskRegime::NoMask, _) => discard,
            (MaskRegime::DenseGustavson, MaskShape::Dense) => dense_gustavson,
            (_, MaskShape::Dense) => dense_in_place,
            _ => keep(MaskRegime::Inline),
        };
    }

    let axbflops = as_f64(total_flops - mask_work);
    match shape {
        MaskShape::Dense if method != AxbMethod::Default => keep(MaskRegime::DenseInPlace),
        MaskShape::Dense => {
            #[allow(clippy::cast_precision_loss)]
            let mwork = cvlen as f64 * cvdim as f64;
            if axbflops < mwork * config.mask_beta {
                dense_in_place
            } else {
                dense_gustavson
            }
        }
        _ if axbflops < as_f64(mask_work) * config.mask_alpha => discard,
        _ => keep(MaskRegime::Inline),
    }
}
