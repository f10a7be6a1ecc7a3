//! Short random identifiers for buckets and client sessions
//!
//! Ids are usability handles, not secrets: they come from the thread-local
//! RNG and collisions are an accepted, low-probability risk.

use rand::Rng;

/// Length of every generated id
pub const ID_LENGTH: usize = 10;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Generate a new id from the thread-local RNG
#[must_use]
pub fn generate() -> String {
    generate_with(&mut rand::thread_rng())
}

/// Generate a new id from the given RNG
pub fn generate_with<R: Rng>(rng: &mut R) -> String {
    (0..ID_LENGTH)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// Check that a value has the shape of a generated id
#[must_use]
pub fn is_valid(id: &str) -> bool {
    id.len() == ID_LENGTH && id.bytes().all(|b| b.is_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_shape() {
        for _ in 0..100 {
            let id = generate();
            assert_eq!(id.len(), ID_LENGTH);
            assert!(is_valid(&id), "unexpected id {id}");
        }
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let a = generate_with(&mut StdRng::seed_from_u64(7));
        let b = generate_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);

        let c = generate_with(&mut StdRng::seed_from_u64(8));
        assert_ne!(a, c);
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid("abcdefghij"));
        assert!(!is_valid("abcdefghi"));
        assert!(!is_valid("ABCDEFGHIJ"));
        assert!(!is_valid("abcde12345"));
    }

    #[test]
    fn test_concurrent_generation() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| (0..100).map(|_| generate()).collect::<Vec<_>>()))
            .collect();

        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(is_valid(&id));
            }
        }
    }
}
