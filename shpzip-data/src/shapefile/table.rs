//! dBase III attribute table reader.

use std::io::{self, Read};

use byteorder::{ByteOrder, LittleEndian};
use shpzip_core::{Field, FieldType, ReadError, StreamKind};

const PREAMBLE_LENGTH: usize = 32;
const DESCRIPTOR_LENGTH: usize = 32;
const TERMINATOR: u8 = 0x0D;

/// Sequential row reader over an attribute stream.
#[derive(Debug)]
pub(crate) struct AttributeTable<R> {
    reader: R,
    fields: Vec<Field>,
    record_count: u32,
    record_length: usize,
    rows_read: u32,
}

impl<R: Read> AttributeTable<R> {
    /// Parse the table header and field descriptors, leaving `reader`
    /// positioned at the first row.
    pub(crate) fn open(mut reader: R) -> Result<Self, ReadError> {
        let mut preamble = [0_u8; PREAMBLE_LENGTH];
        read_exact(&mut reader, &mut preamble, "table header")?;
        let record_count = LittleEndian::read_u32(&preamble[4..8]);
        let header_length = usize::from(LittleEndian::read_u16(&preamble[8..10]));
        let record_length = usize::from(LittleEndian::read_u16(&preamble[10..12]));

        let mut fields = Vec::new();
        let mut consumed = PREAMBLE_LENGTH;
        loop {
            let mut marker = [0_u8; 1];
            read_exact(&mut reader, &mut marker, "field descriptors")?;
            consumed += 1;
            if marker == [TERMINATOR] {
                break;
            }
            let mut descriptor = [0_u8; DESCRIPTOR_LENGTH];
            descriptor[0] = marker[0];
            read_exact(&mut reader, &mut descriptor[1..], "field descriptors")?;
            consumed += DESCRIPTOR_LENGTH - 1;
            fields.push(parse_descriptor(&descriptor));
        }

        let row_width = 1 + fields
            .iter()
            .map(|field| usize::from(field.length))
            .sum::<usize>();
        if record_length < row_width {
            return Err(invalid(format!(
                "record length {record_length} is shorter than the {row_width} bytes its fields need"
            )));
        }
        if header_length > consumed {
            let skip = u64::try_from(header_length - consumed).unwrap_or(u64::MAX);
            io::copy(&mut reader.by_ref().take(skip), &mut io::sink()).map_err(io_error)?;
        }

        Ok(Self {
            reader,
            fields,
            record_count,
            record_length,
            rows_read: 0,
        })
    }

    pub(crate) fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Read the row aligned with geometry record `record`.
    ///
    /// Deleted rows are returned like live rows so that row `n` always
    /// belongs to geometry record `n`.
    pub(crate) fn next_row(&mut self, record: usize) -> Result<Vec<String>, ReadError> {
        if self.rows_read >= self.record_count {
            return Err(ReadError::AttributeMismatch { record });
        }
        let mut row = vec![0_u8; self.record_length];
        self.reader.read_exact(&mut row).map_err(|source| {
            if source.kind() == io::ErrorKind::UnexpectedEof {
                ReadError::AttributeMismatch { record }
            } else {
                io_error(source)
            }
        })?;
        self.rows_read += 1;

        let mut values = Vec::with_capacity(self.fields.len());
        let mut offset = 1;
        for field in &self.fields {
            let end = offset + usize::from(field.length);
            let raw = row.get(offset..end).unwrap_or_default();
            values.push(decode_value(raw));
            offset = end;
        }
        Ok(values)
    }
}

fn parse_descriptor(descriptor: &[u8; DESCRIPTOR_LENGTH]) -> Field {
    let name_bytes = &descriptor[..11];
    let name_end = name_bytes
        .iter()
        .position(|byte| *byte == 0)
        .unwrap_or(name_bytes.len());
    let name = String::from_utf8_lossy(name_bytes.get(..name_end).unwrap_or_default())
        .trim()
        .to_owned();
    Field::new(
        name,
        FieldType::from_byte(descriptor[11]),
        descriptor[16],
        descriptor[17],
    )
}

fn decode_value(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_matches(|c: char| c == ' ' || c == '\0')
        .to_owned()
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<(), ReadError> {
    reader.read_exact(buf).map_err(|source| {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            invalid(format!("stream ended inside the {what}"))
        } else {
            io_error(source)
        }
    })
}

fn invalid(reason: String) -> ReadError {
    ReadError::InvalidHeader {
        stream: StreamKind::Attribute,
        reason,
    }
}

fn io_error(source: io::Error) -> ReadError {
    ReadError::Io {
        stream: StreamKind::Attribute,
        source,
    }
}
