//! Base58 with the Bitcoin alphabet.

const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const BASE: u32 = 58;

/// Encode `input` as a big-endian integer in base 58; every leading zero
/// byte becomes a leading `1`.
pub fn encode(input: &[u8]) -> String {
    let zeros = input.iter().take_while(|b| **b == 0).count();

    // Little-endian base-58 digits of the remaining value.
    let mut digits: Vec<u8> = Vec::with_capacity(input.len() * 138 / 100 + 1);
    for &byte in &input[zeros..] {
        let mut carry = u32::from(byte);
        for digit in &mut digits {
            carry += u32::from(*digit) << 8;
            *digit = (carry % BASE) as u8;
            carry /= BASE;
        }
        while carry > 0 {
            digits.push((carry % BASE) as u8);
            carry /= BASE;
        }
    }

    let mut out = String::with_capacity(zeros + digits.len());
    out.extend(std::iter::repeat(ALPHABET[0] as char).take(zeros));
    out.extend(digits.iter().rev().map(|d| ALPHABET[usize::from(*d)] as char));
    out
}

/// Inverse of [`encode`]; `None` on characters outside the alphabet.
pub fn decode(input: &str) -> Option<Vec<u8>> {
    let ones = input.bytes().take_while(|b| *b == ALPHABET[0]).count();

    let mut bytes: Vec<u8> = Vec::with_capacity(input.len());
    for c in input.bytes().skip(ones) {
        let value = ALPHABET.iter().position(|a| *a == c)?;
        let mut carry = value as u32;
        for byte in &mut bytes {
            carry += u32::from(*byte) * BASE;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let mut out = vec![0u8; ones];
    out.extend(bytes.iter().rev());
    Some(out)
}
