use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::VariantNum;

/// Where a variant reads its data from.
///
/// A full variant owns all of its rows; a partial variant stores a delta over
/// `full_variant_num`, which is itself always full.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct VariantScope {
    pub variant_num: VariantNum,
    pub full_variant_num: VariantNum,
}

impl VariantScope {
    pub fn full(variant_num: VariantNum) -> Self {
        Self {
            variant_num,
            full_variant_num: variant_num,
        }
    }

    pub fn partial(variant_num: VariantNum, full_variant_num: VariantNum) -> Self {
        Self {
            variant_num,
            full_variant_num,
        }
    }

    pub fn is_full(&self) -> bool {
        self.variant_num == self.full_variant_num
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct VariantInfos {
    pub id: String,
    pub num: VariantNum,
    pub full_variant_num: VariantNum,
}

impl VariantInfos {
    pub fn scope(&self) -> VariantScope {
        VariantScope::partial(self.num, self.full_variant_num)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfos {
    pub uuid: Uuid,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::{VariantInfos, VariantScope};

    #[test]
    fn fullness_follows_ancestor() {
        assert!(VariantScope::full(3).is_full());
        assert!(!VariantScope::partial(3, 0).is_full());
        let infos = VariantInfos {
            id: "V1".to_string(),
            num: 1,
            full_variant_num: 1,
        };
        assert!(infos.scope().is_full());
    }
}
