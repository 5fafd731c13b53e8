//! Categorical breakdowns and frequency-band classification.

use std::collections::HashMap;

use serde::Serialize;

use crate::data::model::Record;
use crate::data::schema::WIFI_FREQUENCY;

/// Frequencies below this (MHz) are 2.4 GHz band, the rest 5 GHz.
pub const BAND_SPLIT_MHZ: f64 = 3000.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoricalCount {
    pub label: String,
    pub count: usize,
}

/// Count each distinct value of `field` in first-seen order.
///
/// Missing and empty cells are counted under the empty label; numbers are
/// labelled by their shortest decimal form (`36`, not `36.0`).
pub fn count_by(records: &[Record], field: &str) -> Vec<CategoricalCount> {
    let mut counts: Vec<CategoricalCount> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();

    for rec in records {
        let label = rec.value(field).to_string();
        match slot.get(&label) {
            Some(&i) => counts[i].count += 1,
            None => {
                slot.insert(label.clone(), counts.len());
                counts.push(CategoricalCount { label, count: 1 });
            }
        }
    }
    counts
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BandCounts {
    #[serde(rename = "2.4GHz")]
    pub ghz_2_4: usize,
    #[serde(rename = "5GHz")]
    pub ghz_5: usize,
}

impl BandCounts {
    pub fn total(&self) -> usize {
        self.ghz_2_4 + self.ghz_5
    }

    pub fn to_counts(&self) -> Vec<CategoricalCount> {
        vec![
            CategoricalCount {
                label: "2.4GHz".to_string(),
                count: self.ghz_2_4,
            },
            CategoricalCount {
                label: "5GHz".to_string(),
                count: self.ghz_5,
            },
        ]
    }
}

/// Split records by radio band. Records without a numeric frequency are in
/// neither count.
pub fn classify_bands(records: &[Record]) -> BandCounts {
    records
        .iter()
        .filter_map(|r| r.finite(WIFI_FREQUENCY))
        .fold(BandCounts::default(), |mut acc, mhz| {
            if mhz < BAND_SPLIT_MHZ {
                acc.ghz_2_4 += 1;
            } else {
                acc.ghz_5 += 1;
            }
            acc
        })
}
