//! 64-bit wyhash (final version 4).

/// Default secret for [`wyhash`].
pub const WYHASH_SECRET: [u64; 4] = [
    0x2d35_8dcc_aa6c_78a5,
    0x8bb8_4b93_962e_acc9,
    0x4b33_a62e_d433_d4a3,
    0x4d5a_2da5_1de1_aa47,
];

#[inline(always)]
fn mum(a: u64, b: u64) -> (u64, u64) {
    let r = u128::from(a) * u128::from(b);
    (r as u64, (r >> 64) as u64)
}

#[inline(always)]
fn mix(a: u64, b: u64) -> u64 {
    let (lo, hi) = mum(a, b);
    lo ^ hi
}

#[inline(always)]
fn read8(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

#[inline(always)]
fn read4(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u64::from(u32::from_le_bytes(buf))
}

/// Reads 1..=3 bytes as a single word: first, middle and last byte.
#[inline(always)]
fn read3(bytes: &[u8], k: usize) -> u64 {
    (u64::from(bytes[0]) << 16) | (u64::from(bytes[k >> 1]) << 8) | u64::from(bytes[k - 1])
}

/// Hash `bytes` with the given seed and secret.
pub fn wyhash(bytes: &[u8], seed: u64, secret: &[u64; 4]) -> u64 {
    let len = bytes.len();
    let mut seed = seed ^ mix(seed ^ secret[0], secret[1]);
    let a;
    let b;

    if len <= 16 {
        if len >= 4 {
            let step = (len >> 3) << 2;
            a = (read4(bytes, 0) << 32) | read4(bytes, step);
            b = (read4(bytes, len - 4) << 32) | read4(bytes, len - 4 - step);
        } else if len > 0 {
            a = read3(bytes, len);
            b = 0;
        } else {
            a = 0;
            b = 0;
        }
    } else {
        let mut p = 0;
        let mut i = len;

        if i > 48 {
            let mut see1 = seed;
            let mut see2 = seed;
            loop {
                seed = mix(read8(bytes, p) ^ secret[1], read8(bytes, p + 8) ^ seed);
                see1 = mix(read8(bytes, p + 16) ^ secret[2], read8(bytes, p + 24) ^ see1);
                see2 = mix(read8(bytes, p + 32) ^ secret[3], read8(bytes, p + 40) ^ see2);
                p += 48;
                i -= 48;

                if i <= 48 {
                    break;
                }
            }
            seed ^= see1 ^ see2;
        }

        while i > 16 {
            seed = mix(read8(bytes, p) ^ secret[1], read8(bytes, p + 8) ^ seed);
            i -= 16;
            p += 16;
        }

        // May overlap bytes already consumed above, p + i == len >= 17
        a = read8(bytes, p + i - 16);
        b = read8(bytes, p + i - 8);
    }

    let (a, b) = mum(a ^ secret[1], b ^ seed);
    mix(a ^ secret[0] ^ len as u64, b ^ secret[1])
}
