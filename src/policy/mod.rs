//! The four IP-recycling strategies and the config that selects one of them.

mod entry;
mod fifo;
mod random;
mod segmented;
mod tagged;

pub use entry::{Entry, EntryArena, EntryId};
pub use fifo::FifoPool;
pub use random::RandomPool;
pub use segmented::SegmentedPool;
pub use tagged::TaggedPool;

use serde::{Deserialize, Serialize};

use crate::kernel::PoolPolicy;

fn default_timer_multiplier() -> f64 {
    1.0
}

/// Tagged-union policy configuration, deserialized from a run's `policy` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PolicyConfig {
    Random,
    Fifo,
    Tagged,
    Segmented {
        #[serde(default = "default_timer_multiplier")]
        timer_multiplier: f64,
    },
    #[serde(rename = "segmented-neg")]
    SegmentedNeg {
        #[serde(default = "default_timer_multiplier")]
        timer_multiplier: f64,
    },
}

impl PolicyConfig {
    pub fn build(&self) -> Box<dyn PoolPolicy> {
        match self {
            PolicyConfig::Random => Box::new(RandomPool::new()),
            PolicyConfig::Fifo => Box::new(FifoPool::new()),
            PolicyConfig::Tagged => Box::new(TaggedPool::new()),
            PolicyConfig::Segmented { timer_multiplier } => {
                Box::new(SegmentedPool::new(*timer_multiplier, false))
            }
            PolicyConfig::SegmentedNeg { timer_multiplier } => {
                Box::new(SegmentedPool::new(*timer_multiplier, true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segmented_neg_config_round_trips_through_json() {
        let cfg = PolicyConfig::SegmentedNeg {
            timer_multiplier: 2.5,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"type\":\"segmented-neg\""));
        let back: PolicyConfig = serde_json::from_str(&json).unwrap();
        match back {
            PolicyConfig::SegmentedNeg { timer_multiplier } => {
                assert_eq!(timer_multiplier, 2.5)
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn fifo_config_has_no_fields() {
        let cfg: PolicyConfig = serde_json::from_str(r#"{"type":"fifo"}"#).unwrap();
        assert!(matches!(cfg, PolicyConfig::Fifo));
    }
}
