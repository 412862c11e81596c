//! Record sources feeding the partitioner.

use std::io::Read;

use csv::{ByteRecord, ReaderBuilder};

use crate::error::FareError;
use crate::record::{RawRecord, FIELD_NAMES, RECORD_FIELDS};

/// Produces path records in source order.
pub trait RecordSource {
    /// Next record, or `Ok(None)` once the source is exhausted. The returned
    /// record borrows the source's internal buffer and is only valid until the
    /// next call.
    fn next_record(&mut self) -> Result<Option<RawRecord<'_>>, FareError>;
}

/// Reads headerless `ride_id,lat,lng,unix_seconds` lines.
///
/// A single [`ByteRecord`] buffer is reused for every line. Fields are
/// decoded as UTF-8 one record at a time, so a line with invalid bytes is a
/// record error rather than a failure of the whole source.
pub struct CsvRecordSource<R> {
    reader: csv::Reader<R>,
    record: ByteRecord,
    position: u64,
}

impl<R: Read> CsvRecordSource<R> {
    pub fn new(input: R) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(input);
        Self {
            reader,
            record: ByteRecord::new(),
            position: 0,
        }
    }

    /// Number of records read so far.
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl<R: Read> RecordSource for CsvRecordSource<R> {
    fn next_record(&mut self) -> Result<Option<RawRecord<'_>>, FareError> {
        if !self
            .reader
            .read_byte_record(&mut self.record)
            .map_err(FareError::Source)?
        {
            return Ok(None);
        }
        self.position += 1;

        let found = self.record.len();
        if found != RECORD_FIELDS {
            return Err(FareError::FieldCount {
                position: self.position,
                expected: RECORD_FIELDS,
                found,
            });
        }

        let mut fields = [""; RECORD_FIELDS];
        for ((slot, name), bytes) in fields
            .iter_mut()
            .zip(FIELD_NAMES)
            .zip(self.record.iter())
        {
            *slot = std::str::from_utf8(bytes).map_err(|_| FareError::Parse {
                position: self.position,
                field: name,
                value: String::from_utf8_lossy(bytes).into_owned(),
            })?;
        }
        RawRecord::from_fields(self.position, &fields).map(Some)
    }
}
