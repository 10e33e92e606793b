//! Size declarations and the resolver that turns them into pixel extents.
//!
//! A [`SizeSpec`] is either a percentage of the space left over by fixed
//! siblings or a fixed pixel request. [`resolve`] distributes a container's
//! extent across a list of sibling specs:
//!
//! - pixel requests are honored first and scaled down together when they
//!   overflow the container,
//! - percentages share whatever remains and are normalized so that they
//!   always fill it exactly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{FULL_PERCENT, PERCENT_EPSILON};
use crate::error::LayoutError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeUnit {
    Percent,
    Pixels,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SizeSpec {
    pub value: f64,
    pub unit: SizeUnit,
}

impl SizeSpec {
    pub const FULL: SizeSpec = SizeSpec {
        value: FULL_PERCENT,
        unit: SizeUnit::Percent,
    };

    pub fn percent(value: f64) -> Self {
        Self {
            value,
            unit: SizeUnit::Percent,
        }
    }

    pub fn pixels(value: f64) -> Self {
        Self {
            value,
            unit: SizeUnit::Pixels,
        }
    }

    pub fn is_percent(&self) -> bool {
        self.unit == SizeUnit::Percent
    }

    pub fn halved(self) -> Self {
        self.scaled(0.5)
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self {
            value: self.value * factor,
            unit: self.unit,
        }
    }

    pub fn grown(self, amount: f64) -> Self {
        Self {
            value: self.value + amount,
            unit: self.unit,
        }
    }
}

impl Default for SizeSpec {
    fn default() -> Self {
        Self::FULL
    }
}

impl fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            SizeUnit::Percent => write!(f, "{}%", self.value),
            SizeUnit::Pixels => write!(f, "{}px", self.value),
        }
    }
}

impl FromStr for SizeSpec {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(LayoutError::MalformedInput("empty size".to_string()));
        }
        if trimmed.eq_ignore_ascii_case("auto") {
            return Err(LayoutError::MalformedInput(
                "`auto` sizing is not supported, use a percentage or pixels".to_string(),
            ));
        }
        let (number, unit) = if let Some(n) = trimmed.strip_suffix('%') {
            (n, SizeUnit::Percent)
        } else if let Some(n) = trimmed.strip_suffix("px") {
            (n, SizeUnit::Pixels)
        } else {
            (trimmed, SizeUnit::Pixels)
        };
        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| LayoutError::MalformedInput(format!("unparseable size `{s}`")))?;
        if !value.is_finite() || value < 0.0 {
            return Err(LayoutError::MalformedInput(format!(
                "size must be a finite, non-negative number: `{s}`"
            )));
        }
        Ok(Self { value, unit })
    }
}

impl TryFrom<String> for SizeSpec {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SizeSpec> for String {
    fn from(spec: SizeSpec) -> Self {
        spec.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizeItem<Id> {
    pub id: Id,
    pub spec: SizeSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation<Id> {
    pub id: Id,
    pub pixels: f64,
    pub was_scaled_down: bool,
}

/// Distribute `container_extent` pixels across `items`.
///
/// The output keeps the order of `items`. When only pixel items are given
/// and they fit, the unclaimed remainder is left unused; callers that need
/// the whole extent filled use percentages.
pub fn resolve<Id: Clone>(container_extent: f64, items: &[SizeItem<Id>]) -> Vec<Allocation<Id>> {
    if items.is_empty() {
        return Vec::new();
    }
    let extent = if container_extent.is_finite() {
        container_extent.max(0.0)
    } else {
        0.0
    };

    let fixed_sum: f64 = items
        .iter()
        .filter(|item| !item.spec.is_percent())
        .map(|item| item.spec.value)
        .sum();
    let scale = if fixed_sum > extent && fixed_sum > 0.0 {
        Some(extent / fixed_sum)
    } else {
        None
    };
    let scaled_fixed = fixed_sum * scale.unwrap_or(1.0);
    let remaining = (extent - scaled_fixed).max(0.0);

    let percent_total: f64 = items
        .iter()
        .filter(|item| item.spec.is_percent())
        .map(|item| item.spec.value)
        .sum();
    let normalize = if percent_total > PERCENT_EPSILON {
        FULL_PERCENT / percent_total
    } else {
        0.0
    };

    items
        .iter()
        .map(|item| match item.spec.unit {
            SizeUnit::Pixels => Allocation {
                id: item.id.clone(),
                pixels: item.spec.value * scale.unwrap_or(1.0),
                was_scaled_down: scale.is_some(),
            },
            SizeUnit::Percent => Allocation {
                id: item.id.clone(),
                pixels: remaining * (item.spec.value * normalize) / FULL_PERCENT,
                was_scaled_down: false,
            },
        })
        .collect()
}

/// Rescale the percent entries of `sizes` so they add up to `target`.
///
/// Pixel entries are left untouched. Used when a sibling is inserted with a
/// share of the axis and the others have to make room.
pub(crate) fn rescale_percent(sizes: &mut [SizeSpec], target: f64) {
    let total: f64 = sizes.iter().filter(|s| s.is_percent()).map(|s| s.value).sum();
    if total <= PERCENT_EPSILON {
        return;
    }
    let factor = target / total;
    for size in sizes.iter_mut().filter(|s| s.is_percent()) {
        *size = size.scaled(factor);
    }
}
