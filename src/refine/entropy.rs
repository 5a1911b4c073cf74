//! Shannon entropy of a consensus sequence.
//!
//! Low entropy means a low-complexity consensus (homopolymers, short
//! repeats), which makes even a successful alignment less trustworthy. Every
//! distinct upper-cased byte counts as its own symbol, so ambiguity codes
//! contribute as separate symbols rather than being folded into A/C/G/T.

/// Base-2 Shannon entropy over symbol frequencies.
///
/// Returns 0.0 for the empty sequence or a single repeated base, and
/// log2(k) for a uniform distribution over k symbols (2.0 for A/C/G/T).
pub fn shannon_entropy(sequence: &[u8]) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }

    let mut counts = [0usize; 256];
    for &b in sequence {
        counts[b.to_ascii_uppercase() as usize] += 1;
    }

    let len = sequence.len() as f64;
    let mut entropy = 0.0;
    for &count in counts.iter() {
        if count > 0 {
            let freq = count as f64 / len;
            entropy -= freq * freq.log2();
        }
    }
    entropy
}
