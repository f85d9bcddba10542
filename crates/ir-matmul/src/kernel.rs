use ir_tensor::Tensor;

use crate::context::OpContext;
use crate::error::Result;
use crate::prepack::PrepackedWeight;

/// A compute kernel bound to one graph node.
///
/// `pre_pack` and `use_cached_prepacked_weight` are called by the session,
/// before the first `compute`, for inputs that are constant for the lifetime
/// of the kernel. Both return whether the kernel took the input over; the
/// defaults decline.
pub trait OpKernel: Send + Sync {
    fn compute(&self, ctx: &OpContext<'_>) -> Result<Tensor>;

    /// Offer constant input `input_idx` for packing. If `cache` is given the
    /// packed form is published there instead of being kept privately.
    fn pre_pack(
        &mut self,
        _tensor: &Tensor,
        _input_idx: usize,
        _cache: Option<&PrepackedWeight>,
    ) -> Result<bool> {
        Ok(false)
    }

    /// Adopt a packed input that another kernel already published.
    fn use_cached_prepacked_weight(
        &mut self,
        _entry: &PrepackedWeight,
        _input_idx: usize,
    ) -> Result<bool> {
        Ok(false)
    }
}
