const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Renders `value` in base 36 with lower-case digits, a leading `-` for negatives and no
/// zero padding. This is how chunk files are named on disk.
pub fn base36(value: i32) -> String {
    let mut magnitude = value.unsigned_abs();
    // 6 digits cover u32::MAX, plus one for the sign
    let mut digits = [0u8; 7];
    let mut start = digits.len();
    loop {
        start -= 1;
        digits[start] = DIGITS[(magnitude % 36) as usize];
        magnitude /= 36;
        if magnitude == 0 {
            break;
        }
    }
    if value < 0 {
        start -= 1;
        digits[start] = b'-';
    }
    String::from_utf8_lossy(&digits[start..]).into_owned()
}
