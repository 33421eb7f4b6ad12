use crc::{Crc, CRC_8_AUTOSAR};

/// CRC-8/AUTOSAR (poly 0x2F, init 0xFF, xorout 0xFF). The lookup table is
/// generated once, at compile time.
static CRC8_AUTOSAR: Crc<u8> = Crc::<u8>::new(&CRC_8_AUTOSAR);

/// Number of salt entries per address, one per 4-bit counter value
pub const SALT_TABLE_LEN: usize = 16;

/// Per-address salt table indexed by the frame's rolling counter
pub type SaltTable = [u8; SALT_TABLE_LEN];

/// Compute the salted CRC-8/AUTOSAR over `payload`.
///
/// The running CRC is folded with the salt byte for `counter` before the final
/// table lookup, which is the same as appending the salt to the message. With
/// no salt table the last lookup is done on the bare running CRC, so frames on
/// unregistered addresses are not expected to match.
pub fn compute_crc8_autosar_salted(payload: &[u8], salts: Option<&SaltTable>, counter: u8) -> u8 {
    // A zero salt leaves the running CRC untouched, i.e. the bare final lookup.
    let salt = salts.map_or(0x00, |table| table[usize::from(counter) % SALT_TABLE_LEN]);
    let mut digest = CRC8_AUTOSAR.digest();
    digest.update(payload);
    digest.update(&[salt]);
    digest.finalize()
}
