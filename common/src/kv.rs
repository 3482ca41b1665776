use serde::{Deserialize, Serialize};

/// Par clave/valor que emite la función map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// FNV-1a de 32 bits sobre los bytes de la clave, enmascarado a 31 bits.
/// Tiene que coincidir bit a bit entre todos los workers.
pub fn ihash(key: &str) -> u32 {
    let mut h = FNV32_OFFSET_BASIS;
    for b in key.as_bytes() {
        h ^= u32::from(*b);
        h = h.wrapping_mul(FNV32_PRIME);
    }
    h & 0x7fff_ffff
}

/// Bucket de reduce al que va una clave.
pub fn bucket_for(key: &str, n_reduce: usize) -> usize {
    ihash(key) as usize % n_reduce
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ihash_coincide_con_valores_fnv1a_de_referencia() {
        assert_eq!(ihash(""), 18_652_613);
        assert_eq!(ihash("a"), 1_678_518_572);
        assert_eq!(ihash("foo"), 703_823_575);
        assert_eq!(ihash("bar"), 1_991_736_602);
    }

    #[test]
    fn ihash_nunca_enciende_el_bit_de_signo() {
        for key in ["", "x", "hola mundo", "ñandú", "0123456789abcdef"] {
            assert_eq!(ihash(key) & 0x8000_0000, 0);
        }
    }

    #[test]
    fn bucket_for_queda_en_rango() {
        for n in 1..8 {
            for key in ["foo", "bar", "baz", "qux", ""] {
                assert!(bucket_for(key, n) < n);
            }
        }
        assert_eq!(bucket_for("foo", 2), 1);
        assert_eq!(bucket_for("bar", 2), 0);
        assert_eq!(bucket_for("baz", 2), 0);
    }
}
