//! # Telemetry Record
//!
//! The fixed-width binary record that every other part of the system moves
//! around: the sampler produces it, the transport notifies it, the record
//! log persists it.
//!
//! The on-disk and on-air layout is defined by the explicit encode/decode
//! pair below (little-endian, fixed field order, zero padding to
//! [`RECORD_SIZE_BYTES`]) — never by the in-memory struct layout, so the
//! format is stable across compilers and platforms. [`RECORD_VERSION`] and
//! [`RECORD_SIZE_BYTES`] together identify the layout; changing either
//! mandates wiping incompatible historical data (see `store::guard`).

use crate::error::{PackmonError, Result};

/// Number of per-cell voltage readings in one record
pub const CELL_COUNT: usize = 16;

/// Record layout version. v1 was the original layout without the sequence
/// number; v2 appended `seq` and repadded.
pub const RECORD_VERSION: u32 = 2;

/// Declared total size of one encoded record, padding included
pub const RECORD_SIZE_BYTES: usize = 56;

/// Bytes occupied by the fields themselves, before padding
const RECORD_FIELD_BYTES: usize = 4 + CELL_COUNT * 2 + 3 * 2 + 2 + 2 * 2 + 1 + 4;

/// Zero padding appended after the last field
const RECORD_PAD_BYTES: usize = 3;

// The declared size constant must match the actual field layout.
const _: () = assert!(RECORD_FIELD_BYTES == 53);
const _: () = assert!(RECORD_FIELD_BYTES + RECORD_PAD_BYTES == RECORD_SIZE_BYTES);

/// One battery-pack telemetry sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    /// Unix timestamp in seconds
    pub timestamp_s: u32,

    /// Individual cell voltages (mV)
    pub cell_mv: [u16; CELL_COUNT],

    /// Total pack voltage (mV)
    pub pack_total_mv: u16,

    /// Pack voltage under load drop (mV)
    pub pack_ld_mv: u16,

    /// Sum of active cell voltages (mV)
    pub pack_sum_active_mv: u16,

    /// Pack current (mA, negative = discharging)
    pub current_ma: i16,

    /// Temperature sensor 1 (°C × 100)
    pub temp_ts1_c_x100: i16,

    /// Internal temperature (°C × 100)
    pub temp_int_c_x100: i16,

    /// State of charge (0-100%)
    pub soc: u8,

    /// Monotonically increasing sample sequence number
    pub seq: u32,
}

impl Record {
    /// Encode this record into its fixed wire/disk layout
    ///
    /// # Returns
    ///
    /// * `[u8; RECORD_SIZE_BYTES]` - exactly one record's worth of bytes,
    ///   little-endian fields followed by zero padding
    pub fn encode(&self) -> [u8; RECORD_SIZE_BYTES] {
        let mut buf = [0u8; RECORD_SIZE_BYTES];
        let mut off = 0;

        buf[off..off + 4].copy_from_slice(&self.timestamp_s.to_le_bytes());
        off += 4;

        for mv in &self.cell_mv {
            buf[off..off + 2].copy_from_slice(&mv.to_le_bytes());
            off += 2;
        }

        buf[off..off + 2].copy_from_slice(&self.pack_total_mv.to_le_bytes());
        off += 2;
        buf[off..off + 2].copy_from_slice(&self.pack_ld_mv.to_le_bytes());
        off += 2;
        buf[off..off + 2].copy_from_slice(&self.pack_sum_active_mv.to_le_bytes());
        off += 2;
        buf[off..off + 2].copy_from_slice(&self.current_ma.to_le_bytes());
        off += 2;
        buf[off..off + 2].copy_from_slice(&self.temp_ts1_c_x100.to_le_bytes());
        off += 2;
        buf[off..off + 2].copy_from_slice(&self.temp_int_c_x100.to_le_bytes());
        off += 2;

        buf[off] = self.soc;
        off += 1;

        buf[off..off + 4].copy_from_slice(&self.seq.to_le_bytes());
        off += 4;

        debug_assert_eq!(off, RECORD_FIELD_BYTES);
        buf
    }

    /// Decode a record from its fixed wire/disk layout
    ///
    /// # Arguments
    ///
    /// * `bytes` - exactly `RECORD_SIZE_BYTES` bytes
    ///
    /// # Errors
    ///
    /// Returns [`PackmonError::RecordCodec`] if `bytes` is not exactly one
    /// record long. Padding content is ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != RECORD_SIZE_BYTES {
            return Err(PackmonError::RecordCodec(format!(
                "expected {} bytes, got {}",
                RECORD_SIZE_BYTES,
                bytes.len()
            )));
        }

        let mut off = 0;
        let u16_at = |bytes: &[u8], off: &mut usize| {
            let v = u16::from_le_bytes([bytes[*off], bytes[*off + 1]]);
            *off += 2;
            v
        };

        let timestamp_s = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        off += 4;

        let mut cell_mv = [0u16; CELL_COUNT];
        for mv in cell_mv.iter_mut() {
            *mv = u16_at(bytes, &mut off);
        }

        let pack_total_mv = u16_at(bytes, &mut off);
        let pack_ld_mv = u16_at(bytes, &mut off);
        let pack_sum_active_mv = u16_at(bytes, &mut off);
        let current_ma = u16_at(bytes, &mut off) as i16;
        let temp_ts1_c_x100 = u16_at(bytes, &mut off) as i16;
        let temp_int_c_x100 = u16_at(bytes, &mut off) as i16;

        let soc = bytes[off];
        off += 1;

        let seq = u32::from_le_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]]);
        off += 4;

        debug_assert_eq!(off, RECORD_FIELD_BYTES);

        Ok(Self {
            timestamp_s,
            cell_mv,
            pack_total_mv,
            pack_ld_mv,
            pack_sum_active_mv,
            current_ma,
            temp_ts1_c_x100,
            temp_int_c_x100,
            soc,
            seq,
        })
    }
}

impl Default for Record {
    fn default() -> Self {
        Self {
            timestamp_s: 0,
            cell_mv: [0; CELL_COUNT],
            pack_total_mv: 0,
            pack_ld_mv: 0,
            pack_sum_active_mv: 0,
            current_ma: 0,
            temp_ts1_c_x100: 0,
            temp_int_c_x100: 0,
            soc: 0,
            seq: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Record {
        let mut cell_mv = [0u16; CELL_COUNT];
        for (i, mv) in cell_mv.iter_mut().enumerate() {
            *mv = 3650 + (i as u16 % 4) * 3;
        }
        Record {
            timestamp_s: 1_700_000_000,
            cell_mv,
            pack_total_mv: 58_412,
            pack_ld_mv: 58_362,
            pack_sum_active_mv: 58_412,
            current_ma: -1200,
            temp_ts1_c_x100: 2550,
            temp_int_c_x100: 2800,
            soc: 76,
            seq: 42,
        }
    }

    #[test]
    fn test_layout_constants() {
        assert_eq!(RECORD_VERSION, 2);
        assert_eq!(RECORD_SIZE_BYTES, 56);
        assert_eq!(RECORD_FIELD_BYTES, 53);
        assert_eq!(CELL_COUNT, 16);
    }

    #[test]
    fn test_encode_produces_declared_size() {
        let encoded = sample_record().encode();
        assert_eq!(encoded.len(), RECORD_SIZE_BYTES);
    }

    #[test]
    fn test_encode_field_offsets() {
        let record = sample_record();
        let encoded = record.encode();

        // Timestamp at offset 0, little-endian
        assert_eq!(
            u32::from_le_bytes([encoded[0], encoded[1], encoded[2], encoded[3]]),
            1_700_000_000
        );

        // First and last cell voltages at offsets 4 and 34
        assert_eq!(u16::from_le_bytes([encoded[4], encoded[5]]), 3650);
        assert_eq!(u16::from_le_bytes([encoded[34], encoded[35]]), 3659);

        // SOC single byte at offset 48
        assert_eq!(encoded[48], 76);

        // Sequence number at offset 49
        assert_eq!(
            u32::from_le_bytes([encoded[49], encoded[50], encoded[51], encoded[52]]),
            42
        );
    }

    #[test]
    fn test_encode_padding_is_zero() {
        let encoded = sample_record().encode();
        assert_eq!(&encoded[53..], &[0u8; 3]);
    }

    #[test]
    fn test_decode_round_trip() {
        let record = sample_record();
        let decoded = Record::decode(&record.encode()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_decode_negative_values() {
        let mut record = sample_record();
        record.current_ma = -32_000;
        record.temp_ts1_c_x100 = -1550; // -15.50 C
        let decoded = Record::decode(&record.encode()).unwrap();
        assert_eq!(decoded.current_ma, -32_000);
        assert_eq!(decoded.temp_ts1_c_x100, -1550);
    }

    #[test]
    fn test_decode_wrong_length_is_error() {
        let encoded = sample_record().encode();

        assert!(Record::decode(&encoded[..RECORD_SIZE_BYTES - 1]).is_err());
        assert!(Record::decode(&[]).is_err());

        let mut too_long = encoded.to_vec();
        too_long.push(0);
        assert!(Record::decode(&too_long).is_err());
    }

    #[test]
    fn test_decode_ignores_padding_content() {
        let record = sample_record();
        let mut encoded = record.encode();
        encoded[53] = 0xAA;
        encoded[55] = 0x55;
        let decoded = Record::decode(&encoded).unwrap();
        assert_eq!(decoded, record);
    }
}
