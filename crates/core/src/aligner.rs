// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The time aligner: picks the next common slice boundary across a
//! component's required input slots.

use crate::accumulator::StreamAccumulator;
use crate::message::Tick;

/// One input slot as seen by the aligner: its accumulator, and whether it's
/// "advisory" (e.g. a Matrix-only stream) and therefore excluded from both
/// the initial candidate and the feasibility check for the chosen `T`.
pub struct AlignerSlot<'a> {
    pub name: &'static str,
    pub accumulator: &'a StreamAccumulator,
    pub advisory: bool,
}

/// Finds the next alignment time `T` across `slots`, or `None` if there isn't
/// enough data yet on some required slot.
///
/// Starts at `T = min(earliest_end_time)` over non-advisory slots, then walks
/// `T` down (one tick at a time) until every required slot accepts a slice
/// there, stopping once `T` would fall at or below the highest
/// `stream_start_offset` among the required slots (below which no slot has
/// any unsliced data, so no alignment is possible yet). Advisory slots never
/// drive the candidate and are never checked for feasibility here — a
/// timeless advisory stream (e.g. Matrix-only) can sit arbitrarily far
/// behind `T` and still be sliced up to it by `take_block_up_to`.
#[must_use]
pub fn find_alignment(slots: &[AlignerSlot<'_>]) -> Option<Tick> {
    let required: Vec<&AlignerSlot<'_>> = slots.iter().filter(|s| !s.advisory).collect();
    if required.is_empty() {
        return None;
    }

    let mut candidate = required
        .iter()
        .map(|s| s.accumulator.earliest_end_time())
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .min()?;

    let floor = required.iter().map(|s| s.accumulator.stream_start_offset()).max().unwrap_or(0);

    loop {
        if required.iter().all(|s| s.accumulator.can_form_block_up_to(candidate)) {
            return Some(candidate);
        }
        if candidate <= floor {
            return None;
        }
        candidate -= 1;
    }
}
