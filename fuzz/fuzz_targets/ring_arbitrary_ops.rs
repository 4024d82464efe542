#![no_main]

use gencache::ds::{Cached, GenerationRing};
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary operation sequences on GenerationRing
//
// Tests random sequences of insert, lookup, delete, rotate, and clear
// operations to find edge cases and invariant violations.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let generations = (data[0] as usize % 8).max(1);
    let ring: GenerationRing<u8, u8> = GenerationRing::new(generations);

    let mut idx = 1;
    while idx + 2 < data.len() {
        let op = data[idx] % 5;
        let key = data[idx + 1];
        let value = data[idx + 2];

        match op {
            0 => {
                ring.newest().insert(key, Cached::present(value));
            }
            1 => {
                let _ = ring.lookup(&key);
            }
            2 => {
                ring.delete_from_all(&key);
            }
            3 => {
                let report = ring.rotate();
                assert!(report.expired_slot < generations);
                assert_eq!(report.newest, ring.newest_index());
            }
            4 => {
                ring.clear_all();
                assert!(ring.is_empty());
            }
            _ => unreachable!(),
        }

        // Structural invariants hold after every operation
        assert_eq!(ring.generations(), generations);
        ring.debug_validate_invariants();

        idx += 3;
    }
});
