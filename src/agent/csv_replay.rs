use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::csv_trace::{TraceEvent, TraceReader};
use crate::ids::{IPAddress, TenantId};
use crate::kernel::error::KernelError;
use crate::kernel::{Agent, Simulation};

/// Replays a previously recorded allocation trace verbatim instead of
/// generating synthetic workload, mapping the trace's tenant ids into this
/// agent's carved-out namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvAgentConfig {
    pub input_filename: PathBuf,
    #[serde(default)]
    pub zstd: bool,
}

pub struct CsvReplayAgent {
    config: CsvAgentConfig,
    reader: Option<TraceReader>,
    instance_slots: HashMap<u64, IPAddress>,
    min_id: TenantId,
}

impl CsvReplayAgent {
    pub fn new(config: CsvAgentConfig) -> Self {
        CsvReplayAgent {
            config,
            reader: None,
            instance_slots: HashMap::new(),
            min_id: TenantId::NIL,
        }
    }
}

impl Agent for CsvReplayAgent {
    fn init(&mut self, _sim: &mut Simulation, min_id: TenantId, _max_id: TenantId) {
        self.min_id = min_id;
        self.reader = Some(
            TraceReader::open(&self.config.input_filename, self.config.zstd)
                .unwrap_or_else(|e| panic!("failed to open csv trace: {e}")),
        );
    }

    fn process(&mut self, sim: &mut Simulation) {
        let now = sim.get_time();
        let reader = self.reader.as_mut().expect("initialized");
        let records = reader.drain_at(now);

        for record in records {
            match record.event {
                TraceEvent::Allocate {
                    instance_id,
                    tenant,
                } => {
                    let ip = sim.get_ip(self.min_id + tenant.0);
                    self.instance_slots.insert(instance_id, ip);
                }
                TraceEvent::Release {
                    instance_id,
                    tenant,
                } => {
                    let ip = self
                        .instance_slots
                        .remove(&instance_id)
                        .unwrap_or_else(|| KernelError::CsvUnknownInstance(instance_id).abort());
                    sim.release_ip(ip, self.min_id + tenant.0, true);
                }
            }
        }

        if self.reader.as_ref().unwrap().is_exhausted() {
            sim.done();
        }
    }

    fn kind(&self) -> &'static str {
        "csv"
    }
}
