//! Client-side identifiers for timeline entries.

use std::sync::atomic::{AtomicU64, Ordering};

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(1);

fn random_suffix() -> String {
    let mut bytes = [0u8; 8];
    match getrandom::fill(&mut bytes) {
        Ok(()) => bytes.iter().map(|b| format!("{b:02x}")).collect(),
        // Uniqueness within one process is all these ids need.
        Err(_) => format!(
            "{:016x}",
            FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed)
        ),
    }
}

pub fn provisional_id() -> String {
    format!("temp-{}", random_suffix())
}

pub fn durable_local_id() -> String {
    format!("local-{}", random_suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_their_prefix_and_do_not_repeat() {
        let a = provisional_id();
        let b = provisional_id();
        assert!(a.starts_with("temp-"));
        assert_ne!(a, b);
        assert!(durable_local_id().starts_with("local-"));
    }
}
