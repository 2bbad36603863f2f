// imports
use std::io::{BufRead, ErrorKind, Read};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::{files_handling, Params};
use crate::error::{CoocError, Result};
use crate::table::CoocTable;
use crate::topk::TopKCollector;

/// One record of the binary co-occurrence stream as the external counter
/// writes it: two 1-based ids and a joint count, 16 bytes packed
/// little-endian. bincode's default fixint layout decodes it as-is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoocRecord {
    pub item_a: i32,
    pub item_b: i32,
    pub joint_count: f64,
}

pub const RECORD_SIZE: usize = 16;

pub struct TableBuilder {}

impl TableBuilder {
    /// Build a finalized table out of the two collaborator streams named
    /// in the params: intern the item-count stream in arrival order,
    /// offer every co-occurrence record, then consistency-check and sort.
    pub fn run(params: &Params) -> Result<CoocTable> {
        let mut table = CoocTable::new(1);

        let reader = files_handling::open_input(&params.vocab_file)?;
        let interned = Self::read_vocab(reader, &mut table)?;
        info!("interned {} items from {}", interned, params.vocab_file);

        let collector = TopKCollector::new(params.top_k);
        let reader = files_handling::open_input(&params.cooc_file)?;
        let records = Self::read_cooc(reader, &collector, &mut table)?;
        info!("consumed {} co-occurrence records from {}", records, params.cooc_file);

        table.check_consistency()?;
        collector.finalize(&mut table);
        Ok(table)
    }

    // one `item count` pair per line; identities are positional, so a
    // line that cannot be parsed (or repeats an item) is fatal rather
    // than skipped
    fn read_vocab<R: BufRead>(reader: R, table: &mut CoocTable) -> Result<u64> {
        let mut interned = 0;
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let mut fields = line.split_whitespace();
            let item = match fields.next() {
                Some(item) => item,
                None => {
                    return Err(CoocError::BadVocabLine {
                        line: lineno + 1,
                        text: line.clone(),
                    })
                }
            };
            let count: u64 = match fields.next().map(str::parse) {
                Some(Ok(count)) => count,
                _ => {
                    return Err(CoocError::BadVocabLine {
                        line: lineno + 1,
                        text: line.clone(),
                    })
                }
            };
            table.intern(item, count)?;
            interned += 1;
        }
        Ok(interned)
    }

    // fixed 16-byte frames until EOF; a short trailing frame means the
    // counter broke off mid-record
    fn read_cooc<R: Read>(
        mut reader: R,
        collector: &TopKCollector,
        table: &mut CoocTable,
    ) -> Result<u64> {
        let mut buf = [0u8; RECORD_SIZE];
        let mut records = 0;
        while Self::read_frame(&mut reader, &mut buf)? {
            records += 1;
            let record: CoocRecord = bincode::deserialize(&buf)?;
            let main_id = match u32::try_from(record.item_a) {
                Ok(id) => id,
                Err(_) => {
                    return Err(CoocError::MainIdOutOfRange {
                        id: record.item_a as i64,
                        size: table.len(),
                    })
                }
            };
            let partner_id = match u32::try_from(record.item_b) {
                Ok(id) => id,
                Err(_) => {
                    debug!("record {}: negative partner id {} skipped", records, record.item_b);
                    continue;
                }
            };
            collector.offer(table, main_id, partner_id, record.joint_count as u64)?;
        }
        Ok(records)
    }

    fn read_frame<R: Read>(reader: &mut R, buf: &mut [u8; RECORD_SIZE]) -> Result<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = match reader.read(&mut buf[filled..]) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                if filled == 0 {
                    return Ok(false);
                }
                return Err(CoocError::TruncatedRecord {
                    got: filled,
                    want: RECORD_SIZE,
                });
            }
            filled += n;
        }
        Ok(true)
    }
}
