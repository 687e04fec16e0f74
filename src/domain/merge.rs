//! Recursive merge over known, named fields.
//!
//! Composite sections merge field by field; leaves are replaced outright by
//! the patch. A field absent from the patch keeps its current value.

use crate::domain::model::{
    FeeRatios, FeeRatiosPatch, FinancingOverrides, FinancingProfile, PerUse, PerUsePatch,
};

pub trait DeepMerge {
    type Patch;

    fn merge(&mut self, patch: &Self::Patch);

    fn merged(mut self, patch: &Self::Patch) -> Self
    where
        Self: Sized,
    {
        self.merge(patch);
        self
    }
}

macro_rules! leaf_merge {
    ($($ty:ty),*) => {
        $(
            impl DeepMerge for $ty {
                type Patch = $ty;

                fn merge(&mut self, patch: &$ty) {
                    *self = patch.clone();
                }
            }
        )*
    };
}

leaf_merge!(f64, u32, usize);

/// 只有 patch 有值時才合併
pub fn merge_field<T: DeepMerge>(target: &mut T, patch: &Option<T::Patch>) {
    if let Some(patch) = patch {
        target.merge(patch);
    }
}

impl DeepMerge for PerUse {
    type Patch = PerUsePatch;

    fn merge(&mut self, patch: &PerUsePatch) {
        merge_field(&mut self.residential, &patch.residential);
        merge_field(&mut self.commercial, &patch.commercial);
    }
}

impl DeepMerge for FeeRatios {
    type Patch = FeeRatiosPatch;

    fn merge(&mut self, patch: &FeeRatiosPatch) {
        merge_field(&mut self.design, &patch.design);
        merge_field(&mut self.honoraria, &patch.honoraria);
        merge_field(&mut self.commercial, &patch.commercial);
        merge_field(&mut self.financing, &patch.financing);
        merge_field(&mut self.tax, &patch.tax);
    }
}

impl DeepMerge for FinancingProfile {
    type Patch = FinancingOverrides;

    fn merge(&mut self, patch: &FinancingOverrides) {
        merge_field(&mut self.sale_price_m2, &patch.sale_price_m2);
        merge_field(&mut self.construction_cost_m2, &patch.construction_cost_m2);
        merge_field(&mut self.fees, &patch.fees);
        merge_field(&mut self.target_margin_ratio, &patch.target_margin_ratio);
    }
}
