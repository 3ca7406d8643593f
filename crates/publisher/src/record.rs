//! JSON records served by the query layer

use contracts::{InertialSample, SynchronizedBundle};
use serde::{Deserialize, Serialize};

/// Latest synchronized bundle
///
/// `frame_timestamp` is `null` and `samples` empty before the first frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleRecord {
    pub frame_timestamp: Option<f64>,
    pub samples: Vec<InertialSample>,
}

impl BundleRecord {
    /// Record for "no bundle yet"
    pub fn empty() -> Self {
        Self {
            frame_timestamp: None,
            samples: Vec::new(),
        }
    }
}

impl From<&SynchronizedBundle> for BundleRecord {
    fn from(bundle: &SynchronizedBundle) -> Self {
        Self {
            frame_timestamp: Some(bundle.frame_timestamp),
            samples: bundle.samples.clone(),
        }
    }
}

/// Full inertial buffer contents, arrival order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBufferRecord {
    pub samples: Vec<InertialSample>,
}

/// Recent bundles, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleHistoryRecord {
    pub bundles: Vec<BundleRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_bundle_wire_shape() {
        let value = serde_json::to_value(BundleRecord::empty()).unwrap();
        assert_eq!(value, json!({ "frame_timestamp": null, "samples": [] }));
    }

    #[test]
    fn test_bundle_wire_shape() {
        let bundle = SynchronizedBundle {
            frame_timestamp: 100.0,
            samples: vec![InertialSample::from_channels(
                99.5,
                [0.1, 0.2, 9.8, 0.01, 0.02, 0.03],
            )],
        };
        let value = serde_json::to_value(BundleRecord::from(&bundle)).unwrap();
        assert_eq!(
            value,
            json!({
                "frame_timestamp": 100.0,
                "samples": [{
                    "timestamp": 99.5,
                    "ax": 0.1, "ay": 0.2, "az": 9.8,
                    "gx": 0.01, "gy": 0.02, "gz": 0.03
                }]
            })
        );
    }
}
