//! Prologue wireless thermometer
//!
//! The sensor repeats a 36-bit packet seven times per burst, preceded
//! by a lone sync pulse. The data is grouped in nine nibbles:
//!
//! ```txt
//! [id0] [rid0] [rid1] [data0] [temp0] [temp1] [temp2] [unk0] [unk1]
//! ```
//!
//! `id0` is always `1001`. `rid` is a random id generated at power-up;
//! the same batteries often produce the same id. Of the `data` nibble,
//! bit 3 is clear on the sensor's first reading, bit 2 is set when the
//! reading was triggered by the button, and bits 1..0 plus one give the
//! channel (1-3). Temperature is a 12-bit signed count of tenths of a
//! degree Celsius.

use crate::bitbuf::BitMatrix;

use super::{Celsius, DecodeErr, PrologueReading};

/// Family nibble shared by the whole product line
const FAMILY_ID: u8 = 0x9;

/// Extract the fields of the second packet row
///
/// The first row holds only the sync pulse, so the fields live in
/// row 1. The fixed family nibble is the only validity check the
/// packet affords.
pub(super) fn parse(matrix: &BitMatrix) -> Result<PrologueReading, DecodeErr> {
    let row = matrix.row(1);

    let id = (row[0] & 0xf0) >> 4;
    if id != FAMILY_ID {
        return Err(DecodeErr::FamilyId {
            expected: FAMILY_ID,
            got: id,
        });
    }

    let rid = ((row[0] & 0x0f) << 4) | ((row[1] & 0xf0) >> 4);
    let first_reading = row[1] & 0x08 == 0;
    let button = row[1] & 0x04 != 0;
    let channel = (row[1] & 0x03) + 1;

    let raw = ((row[2] as u16) << 8) | ((row[3] & 0xf0) as u16);
    let tenths = (raw as i16) >> 4;

    Ok(PrologueReading {
        id,
        rid,
        channel,
        button,
        first_reading,
        temperature: Celsius::from_tenths(tenths),
    })
}
