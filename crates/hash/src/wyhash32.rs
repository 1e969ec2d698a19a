//! 32-bit wyhash32, for targets where 64-bit multiplies are expensive.

#[inline(always)]
fn mix(a: &mut u32, b: &mut u32) {
    let c = u64::from(*a ^ 0x53c5_ca59) * u64::from(*b ^ 0x7474_3c1b);
    *a = c as u32;
    *b = (c >> 32) as u32;
}

#[inline(always)]
fn read4(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}

#[inline(always)]
fn read3(bytes: &[u8], k: usize) -> u32 {
    (u32::from(bytes[0]) << 16) | (u32::from(bytes[k >> 1]) << 8) | u32::from(bytes[k - 1])
}

/// Hash `bytes` with the given seed.
pub fn wyhash32(bytes: &[u8], seed: u32) -> u32 {
    let len = bytes.len() as u64;
    let mut seed = seed ^ (len >> 32) as u32;
    let mut see1 = len as u32;
    mix(&mut seed, &mut see1);

    let mut p = 0;
    let mut i = bytes.len();
    while i > 8 {
        seed ^= read4(bytes, p);
        see1 ^= read4(bytes, p + 4);
        mix(&mut seed, &mut see1);
        i -= 8;
        p += 8;
    }

    if i >= 4 {
        seed ^= read4(bytes, p);
        see1 ^= read4(bytes, p + i - 4);
    } else if i > 0 {
        seed ^= read3(&bytes[p..], i);
    }

    mix(&mut seed, &mut see1);
    mix(&mut seed, &mut see1);
    seed ^ see1
}
