//! Allocation-trace replay format: `time,type,instance_id,tenant_id` lines,
//! optionally zstd-framed, read one line ahead (`Process` assumes a line has
//! already been scanned before it runs, matching the reference reader).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::ids::TenantId;
use crate::kernel::error::KernelError;
use crate::time::Duration;

pub enum TraceEvent {
    Allocate { instance_id: u64, tenant: TenantId },
    Release { instance_id: u64, tenant: TenantId },
}

pub struct TraceRecord {
    pub time: Duration,
    pub event: TraceEvent,
}

/// Line-buffered reader over a CSV trace file, transparently zstd-decoded
/// when `zstd` is set. Reads one line ahead so `next_at(t)` can check the
/// buffered line's timestamp before consuming it.
pub struct TraceReader {
    lines: Box<dyn Iterator<Item = std::io::Result<String>>>,
    pending: Option<String>,
    exhausted: bool,
}

impl TraceReader {
    pub fn open(path: &Path, zstd: bool) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if zstd {
            Box::new(BufReader::new(zstd::stream::read::Decoder::new(file)?))
        } else {
            Box::new(BufReader::new(file))
        };
        let mut lines = Box::new(reader.lines()) as Box<dyn Iterator<Item = std::io::Result<String>>>;
        let pending = lines.next().transpose()?;
        let exhausted = pending.is_none();
        Ok(TraceReader {
            lines,
            pending,
            exhausted,
        })
    }

    fn parse(line: &str) -> TraceRecord {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 4 {
            KernelError::CsvMalformed(line.to_string()).abort();
        }
        let time: i64 = fields[0]
            .parse()
            .unwrap_or_else(|_| KernelError::CsvMalformed(line.to_string()).abort());
        let kind: u64 = fields[1]
            .parse()
            .unwrap_or_else(|_| KernelError::CsvMalformed(line.to_string()).abort());
        let instance_id: u64 = fields[2]
            .parse()
            .unwrap_or_else(|_| KernelError::CsvMalformed(line.to_string()).abort());
        let tenant: u32 = fields[3]
            .parse()
            .unwrap_or_else(|_| KernelError::CsvMalformed(line.to_string()).abort());

        let event = match kind {
            1 => TraceEvent::Allocate {
                instance_id,
                tenant: TenantId(tenant),
            },
            0 => TraceEvent::Release {
                instance_id,
                tenant: TenantId(tenant),
            },
            _ => KernelError::CsvMalformed(line.to_string()).abort(),
        };

        TraceRecord {
            time: Duration(time),
            event,
        }
    }

    /// Drains and returns every buffered record whose timestamp equals `now`,
    /// stopping (without consuming) at the first record timestamped later.
    /// Panics via `KernelError::CsvOutOfOrder` if a record's timestamp is
    /// behind `now`, mirroring the reference reader's ordering invariant.
    pub fn drain_at(&mut self, now: Duration) -> Vec<TraceRecord> {
        let mut out = Vec::new();
        loop {
            let Some(line) = &self.pending else {
                return out;
            };
            let record = Self::parse(line);
            if record.time < now {
                KernelError::CsvOutOfOrder {
                    record_time: record.time,
                    current_time: now,
                }
                .abort();
            }
            if record.time > now {
                return out;
            }
            out.push(record);
            self.advance();
        }
    }

    fn advance(&mut self) {
        match self.lines.next() {
            Some(Ok(line)) => self.pending = Some(line),
            Some(Err(_)) | None => {
                self.pending = None;
                self.exhausted = true;
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_trace(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn drains_only_records_at_the_current_time() {
        let file = write_trace("0,1,1,5\n0,1,2,5\n1,0,1,5\n");
        let mut reader = TraceReader::open(file.path(), false).unwrap();
        let batch = reader.drain_at(Duration::ZERO);
        assert_eq!(batch.len(), 2);
        let batch = reader.drain_at(Duration(1));
        assert_eq!(batch.len(), 1);
        assert!(reader.is_exhausted());
    }

    #[test]
    #[should_panic]
    fn out_of_order_records_abort() {
        let file = write_trace("5,1,1,5\n");
        let mut reader = TraceReader::open(file.path(), false).unwrap();
        reader.drain_at(Duration(10));
    }
}
