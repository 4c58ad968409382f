//! Domain label generation.

use rand::Rng;
use serde::Deserialize;

const LABEL_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

const BASE_NAMES: [&str; 10] = [
    "david", "alex", "nina", "fajar", "intan", "leo", "indra", "siti", "ken", "rina",
];

/// How labels are generated. Labels are never guaranteed globally unique;
/// collisions simply fail the register call and are absorbed by the retry
/// policy like any other chain error.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum NameStyle {
    /// Lowercase `[a-z0-9]` string of the given length.
    Random { length: usize },
    /// A base name followed by a four digit number, e.g. `nina4821`.
    Dictionary,
}

impl Default for NameStyle {
    fn default() -> Self {
        NameStyle::Random { length: 10 }
    }
}

pub fn generate_label(style: &NameStyle) -> String {
    let mut rng = rand::thread_rng();
    match style {
        NameStyle::Random { length } => (0..*length)
            .map(|_| LABEL_ALPHABET[rng.gen_range(0..LABEL_ALPHABET.len())] as char)
            .collect(),
        NameStyle::Dictionary => {
            let base = BASE_NAMES[rng.gen_range(0..BASE_NAMES.len())];
            format!("{}{}", base, rng.gen_range(1000..=9999))
        }
    }
}
