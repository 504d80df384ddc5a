//! # Sampler Module
//!
//! Source of telemetry records for the producer loop.
//!
//! Real cell monitoring hardware lives behind [`SampleSource`]; the shipped
//! [`MockSampler`] generates plausible pack telemetry so the rest of the
//! pipeline can run without a battery attached.

use chrono::Utc;

use crate::record::{Record, CELL_COUNT};

/// Produces one telemetry record per producer tick
pub trait SampleSource: Send {
    /// Produce the next sample
    fn produce(&mut self) -> Record;
}

/// Mock sample source with fixed, plausible pack values
///
/// Cells sit near 3.65 V with a small per-index variation; aggregates are
/// derived from the cell sum; current, temperatures, and state of charge are
/// constants. Timestamps are wall clock, sequence numbers increase by one
/// per sample.
#[derive(Debug, Default)]
pub struct MockSampler {
    next_seq: u32,
}

impl MockSampler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SampleSource for MockSampler {
    fn produce(&mut self) -> Record {
        let mut cell_mv = [0u16; CELL_COUNT];
        for (i, mv) in cell_mv.iter_mut().enumerate() {
            *mv = 3650 + (i as u16 % 4) * 3;
        }

        let sum: u32 = cell_mv.iter().map(|&mv| mv as u32).sum();
        let pack_total_mv = sum as u16;

        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);

        Record {
            timestamp_s: Utc::now().timestamp().max(0) as u32,
            cell_mv,
            pack_total_mv,
            pack_ld_mv: pack_total_mv.saturating_sub(50),
            pack_sum_active_mv: pack_total_mv,
            current_ma: -1200,        // -1.2 A, discharging
            temp_ts1_c_x100: 2550,    // 25.50 C
            temp_int_c_x100: 2800,    // 28.00 C
            soc: 76,
            seq,
        }
    }
}
