use std::cmp::Ordering;

use fleece_slice::Slice;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_bytes(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let len = rng.gen_range(0..12);
    // Small alphabet so shared prefixes are common
    (0..len).map(|_| rng.gen_range(b'a'..=b'd')).collect()
}

#[test]
fn compare_is_a_total_order() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let samples: Vec<Vec<u8>> = (0..200).map(|_| random_bytes(&mut rng)).collect();

    for a in &samples {
        let sa = Slice::new(a);
        assert_eq!(sa.compare(&sa), Ordering::Equal);

        for b in &samples {
            let sb = Slice::new(b);
            assert_eq!(sa.compare(&sb), sb.compare(&sa).reverse());
            assert_eq!(sa.equal(&sb), sb.equal(&sa));
            assert_eq!(sa.equal(&sb), sa.compare(&sb) == Ordering::Equal);
            assert_eq!(sa.compare(&sb), a.as_slice().cmp(b.as_slice()));

            if sa.equal(&sb) {
                assert_eq!(sa.hash32(), sb.hash32());
            }
        }
    }
}

#[test]
fn compare_is_transitive() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut samples: Vec<Vec<u8>> = (0..100).map(|_| random_bytes(&mut rng)).collect();
    samples.sort_by(|a, b| Slice::new(a).compare(&Slice::new(b)));

    for window in samples.windows(3) {
        let (a, b, c) = (
            Slice::new(&window[0]),
            Slice::new(&window[1]),
            Slice::new(&window[2]),
        );
        assert_ne!(a.compare(&b), Ordering::Greater);
        assert_ne!(b.compare(&c), Ordering::Greater);
        assert_ne!(a.compare(&c), Ordering::Greater);
    }
}

#[test]
fn proper_prefix_sorts_first() {
    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    for _ in 0..100 {
        let mut long = random_bytes(&mut rng);
        long.push(rng.gen());
        let cut = rng.gen_range(0..long.len());

        let prefix = Slice::new(&long[..cut]);
        let whole = Slice::new(&long);
        assert_eq!(prefix.compare(&whole), Ordering::Less);
        assert!(!prefix.equal(&whole));
    }
}

#[test]
fn to_cstring_random_capacities() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    for _ in 0..100 {
        let bytes = random_bytes(&mut rng);
        let capacity = rng.gen_range(1..16);
        let mut buffer = vec![0xff; capacity];

        let fits = Slice::new(&bytes).to_cstring(&mut buffer);
        assert_eq!(fits, bytes.len() < capacity);

        let n = bytes.len().min(capacity - 1);
        assert_eq!(&buffer[..n], &bytes[..n]);
        assert_eq!(buffer[n], 0);
    }
}
