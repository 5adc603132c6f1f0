//! Fixed mapping from prefecture name to the forecast service's city code.

use std::fmt;

/// Opaque region identifier understood by the forecast service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionCode(&'static str);

impl RegionCode {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Each prefecture points at the observation point of its capital city.
pub const PREFECTURE_REGIONS: &[(&str, RegionCode)] = &[
    ("神奈川県", RegionCode("140010")),
    ("東京都", RegionCode("130010")),
    ("埼玉県", RegionCode("110010")),
    ("千葉県", RegionCode("120010")),
    ("愛知県", RegionCode("230010")),
    ("大阪府", RegionCode("270000")),
    ("京都府", RegionCode("260010")),
    ("兵庫県", RegionCode("280010")),
    ("福岡県", RegionCode("400010")),
    ("北海道", RegionCode("016010")),
];

/// Look up the region code for a prefecture; `None` when the prefecture is not covered.
pub fn region_code(prefecture: &str) -> Option<RegionCode> {
    PREFECTURE_REGIONS
        .iter()
        .find(|(name, _)| *name == prefecture)
        .map(|(_, code)| *code)
}
