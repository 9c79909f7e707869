use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::BBox;
use crate::measure::classify::Role;

/// 1系統分の集計
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleMeasurements {
    /// 寸法ラベル → 実長(mm)の合計
    pub lengths_mm: BTreeMap<String, f64>,
    /// 部材名 → 個数（現状は常に空）
    pub counts: BTreeMap<String, u32>,
    /// 寸法ラベル → 検出順のBBox列（図示用）
    pub images: BTreeMap<String, Vec<BBox>>,
}

impl RoleMeasurements {
    /// 長さを加算し、BBoxを末尾に追加する。
    pub fn add(&mut self, size: &str, length_mm: f64, bbox: BBox) {
        *self.lengths_mm.entry(size.to_string()).or_insert(0.0) += length_mm;
        self.images.entry(size.to_string()).or_default().push(bbox);
    }

    pub fn is_empty(&self) -> bool {
        self.lengths_mm.is_empty() && self.counts.is_empty() && self.images.is_empty()
    }

    /// 全寸法の合計長(mm)
    pub fn total_length_mm(&self) -> f64 {
        self.lengths_mm.values().sum()
    }
}

/// 図面1枚分の計測結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub scale_denominator: f64,
    pub supply: RoleMeasurements,
    pub extract: RoleMeasurements,
}

impl MeasurementResult {
    pub fn new(scale_denominator: f64) -> Self {
        MeasurementResult {
            scale_denominator,
            supply: RoleMeasurements::default(),
            extract: RoleMeasurements::default(),
        }
    }

    /// 系統ごとの集計。`Discarded` には集計が無いのでNone。
    pub fn role(&self, role: Role) -> Option<&RoleMeasurements> {
        match role {
            Role::Supply => Some(&self.supply),
            Role::Extract => Some(&self.extract),
            Role::Discarded => None,
        }
    }

    pub(crate) fn role_mut(&mut self, role: Role) -> Option<&mut RoleMeasurements> {
        match role {
            Role::Supply => Some(&mut self.supply),
            Role::Extract => Some(&mut self.extract),
            Role::Discarded => None,
        }
    }

    /// (系統, 集計) の組を supply, extract の順に返す。
    pub fn roles(&self) -> [(Role, &RoleMeasurements); 2] {
        [(Role::Supply, &self.supply), (Role::Extract, &self.extract)]
    }

    /// 集計に使われたプリミティブ数（BBoxの総数）
    pub fn primitive_count(&self) -> usize {
        self.roles()
            .iter()
            .flat_map(|(_, m)| m.images.values())
            .map(Vec::len)
            .sum()
    }
}
