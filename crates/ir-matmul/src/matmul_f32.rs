use std::sync::Arc;

use ir_tensor::{CpuBackend, DType, PackedMatrix, SgemmB, SgemmBatch, SgemmData, Shape, Tensor};

use crate::attributes::{MatMulAttributes, NodeAttributes};
use crate::context::OpContext;
use crate::error::{MatMulError, Result};
use crate::kernel::OpKernel;
use crate::plan::BroadcastPlan;
use crate::prepack::{PackState, PrepackedWeight};

/// Index of the operand that may be packed.
const PACKABLE_INPUT: usize = 1;

/// The right operand as `compute` will read it.
#[derive(Clone, Copy)]
enum RightOperand<'t> {
    Packed {
        matrix: &'t PackedMatrix,
        shape: &'t Shape,
    },
    Raw {
        data: &'t [f32],
        shape: &'t Shape,
    },
}

impl<'t> RightOperand<'t> {
    fn shape(self) -> &'t Shape {
        match self {
            RightOperand::Packed { shape, .. } | RightOperand::Raw { shape, .. } => shape,
        }
    }

    fn at(self, offset: usize, ldb: usize) -> SgemmB<'t> {
        match self {
            RightOperand::Packed { matrix, .. } => SgemmB::Packed(matrix),
            RightOperand::Raw { data, .. } => SgemmB::Raw {
                data: &data[offset..],
                ldb,
            },
        }
    }
}

/// f32 MatMul with transpose flags, a scale factor and right-operand packing.
///
/// All batch elements go to the primitive in a single call so it can spread
/// them across the worker pool.
#[derive(Debug)]
pub struct MatMulF32 {
    attrs: MatMulAttributes,
    backend: Arc<dyn SgemmBatch>,
    packed_b: PackState,
}

impl MatMulF32 {
    pub fn new(attrs: MatMulAttributes, backend: Arc<dyn SgemmBatch>) -> Self {
        MatMulF32 {
            attrs,
            backend,
            packed_b: PackState::Unpacked,
        }
    }

    /// A kernel on the reference CPU backend.
    pub fn cpu(attrs: MatMulAttributes) -> Self {
        Self::new(attrs, Arc::new(CpuBackend::new()))
    }

    /// A kernel on the reference CPU backend configured from node attributes.
    pub fn from_attributes(attrs: &NodeAttributes) -> Result<Self> {
        Ok(Self::cpu(MatMulAttributes::from_attributes(attrs)?))
    }

    pub fn attributes(&self) -> &MatMulAttributes {
        &self.attrs
    }

    pub fn pack_state(&self) -> &PackState {
        &self.packed_b
    }

    /// Pack `tensor` as the right operand, or `None` if packing does not
    /// apply to it.
    fn pack(&self, tensor: &Tensor) -> Result<Option<(PackedMatrix, Shape)>> {
        if tensor.dtype() != DType::F32 {
            log::debug!("not packing {} right operand", tensor.dtype());
            return Ok(None);
        }
        // Only a single 2-D weight matrix is packed.
        let (rows, cols) = match tensor.shape().dims() {
            [rows, cols] => (*rows, *cols),
            _ => {
                log::debug!("not packing right operand of shape {}", tensor.shape());
                return Ok(None);
            }
        };
        let trans_b = self.attrs.trans_b;
        let (k, n) = if trans_b { (cols, rows) } else { (rows, cols) };
        if self.backend.packed_b_size(n, k) == 0 {
            log::debug!("backend declined to pack [{}x{}] right operand", k, n);
            return Ok(None);
        }
        let ldb = if trans_b { k } else { n };
        let matrix = self
            .backend
            .pack_b(trans_b, n, k, tensor.data::<f32>()?, ldb)?;
        Ok(Some((matrix, tensor.shape().clone())))
    }
}

impl OpKernel for MatMulF32 {
    fn pre_pack(
        &mut self,
        tensor: &Tensor,
        input_idx: usize,
        cache: Option<&PrepackedWeight>,
    ) -> Result<bool> {
        if input_idx != PACKABLE_INPUT {
            return Ok(false);
        }
        if self.packed_b.is_resolved() {
            log::debug!("right operand already packed, ignoring pre_pack");
            return Ok(false);
        }
        let Some((matrix, shape)) = self.pack(tensor)? else {
            return Ok(false);
        };

        let trans_b = self.attrs.trans_b;
        self.packed_b = match cache {
            None => PackState::Owned { matrix, shape },
            Some(entry) => match entry.publish(matrix, shape.clone(), trans_b) {
                // Lost the race to a pack with the other transpose layout.
                (cached, Some(matrix)) if cached.trans_b != trans_b => {
                    log::debug!(
                        "prepacked weight has trans_b={}, keeping a private pack",
                        cached.trans_b
                    );
                    PackState::Owned { matrix, shape }
                }
                (cached, _) => PackState::Borrowed {
                    matrix: cached.matrix,
                    shape: cached.shape,
                },
            },
        };
        Ok(true)
    }

    fn use_cached_prepacked_weight(
        &mut self,
        entry: &PrepackedWeight,
        input_idx: usize,
    ) -> Result<bool> {
        if input_idx != PACKABLE_INPUT {
            return Ok(false);
        }
        if self.packed_b.is_resolved() {
            log::debug!("right operand already packed, ignoring cached weight");
            return Ok(false);
        }
        let Some(cached) = entry.get() else {
            log::debug!("prepacked weight entry is empty");
            return Ok(false);
        };
        if cached.trans_b != self.attrs.trans_b {
            log::debug!(
                "prepacked weight has trans_b={}, kernel needs trans_b={}",
                cached.trans_b,
                self.attrs.trans_b
            );
            return Ok(false);
        }
        self.packed_b = PackState::Borrowed {
            matrix: cached.matrix,
            shape: cached.shape,
        };
        Ok(true)
    }

    fn compute(&self, ctx: &OpContext<'_>) -> Result<Tensor> {
        let a = ctx.input(0)?;
        let right = match self.packed_b.packed() {
            Some((matrix, shape)) => RightOperand::Packed { matrix, shape },
            None => {
                let b = ctx.input(1)?;
                RightOperand::Raw {
                    data: b.data::<f32>().map_err(|_| MatMulError::DTypeMismatch {
                        expected: DType::F32,
                        got: b.dtype(),
                    })?,
                    shape: b.shape(),
                }
            }
        };
        let a_data = a.data::<f32>().map_err(|_| MatMulError::DTypeMismatch {
            expected: DType::F32,
            got: a.dtype(),
        })?;

        let plan = BroadcastPlan::new(
            a.shape(),
            right.shape(),
            self.attrs.trans_a,
            self.attrs.trans_b,
        )?;
        let mut y = ctx.output(DType::F32, plan.output_shape())?;
        if y.numel() == 0 {
            return Ok(y);
        }

        let (m, n, k) = (plan.m(), plan.n(), plan.k());
        let lda = if plan.trans_a() { m } else { k };
        let ldb = if plan.trans_b() { k } else { n };
        log::trace!(
            "matmul<f32> m={} n={} k={} batch={} packed={}",
            m,
            n,
            k,
            plan.batch_count(),
            self.packed_b.is_resolved()
        );

        // Output matrices are contiguous: offset i is always i * m * n.
        let y_data = y.compute_view_mut::<f32>()?;
        let mut data: Vec<SgemmData<'_>> = plan
            .left_offsets()
            .iter()
            .zip(plan.right_offsets())
            .zip(y_data.chunks_mut(m * n))
            .map(|((&a_off, &b_off), c)| SgemmData {
                a: &a_data[a_off..],
                lda,
                b: right.at(b_off, ldb),
                c,
                ldc: n,
                alpha: self.attrs.alpha,
            })
            .collect();
        debug_assert_eq!(data.len(), plan.batch_count());

        self.backend.gemm_batch(
            plan.trans_a(),
            plan.trans_b(),
            m,
            n,
            k,
            &mut data,
            ctx.thread_pool(),
        )?;

        Ok(y)
    }
}
