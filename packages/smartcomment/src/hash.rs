//! Content fingerprints for anchors that have no text to search for.

/// 32-bit rolling hash (`h = h * 31 + c` over UTF-16 code units), rendered as lowercase hex of
/// its magnitude.
pub fn string_hash(input: &str) -> String {
    let hash = input
        .encode_utf16()
        .fold(0i32, |hash, unit| {
            (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
        });
    format!("{:x}", hash.unsigned_abs())
}

/// Fingerprint of an image from its source and rendered size
pub fn image_hash(src: &str, width: f32, height: f32) -> String {
    string_hash(&format!(
        "{src}|{}|{}",
        width.round() as i64,
        height.round() as i64
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_the_classic_string_hash() {
        assert_eq!(string_hash(""), "0");
        // 'a' = 97
        assert_eq!(string_hash("a"), "61");
        // 97 * 31 + 98 = 3105
        assert_eq!(string_hash("ab"), "c21");
        // wraps around i32 for long inputs and stays deterministic
        let long = "x".repeat(64);
        assert_eq!(string_hash(&long), string_hash(&long));
    }

    #[test]
    fn image_hash_rounds_dimensions() {
        assert_eq!(
            image_hash("/img/a.png", 99.6, 50.2),
            image_hash("/img/a.png", 100.0, 50.0)
        );
        assert_ne!(
            image_hash("/img/a.png", 100.0, 50.0),
            image_hash("/img/b.png", 100.0, 50.0)
        );
    }
}
