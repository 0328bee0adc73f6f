//! Sanitization of shader-tree display names into graph identifiers.
//!
//! Tree node names are free-form display strings; graph paths want
//! identifier-safe segments. The rules match the exporter this pass replaces:
//! a leading digit gains an underscore prefix, open parentheses are removed,
//! and the remaining disallowed characters each become an underscore.

/// Characters replaced with `_`. Close-paren is in the replacement class;
/// open-paren is removed outright.
const REPLACED: &[char] = &[')', ' ', '-', '.', ':', '#', ';', '?', ','];

/// Sanitize a display name into a graph-identifier-safe segment.
///
/// ```
/// use shadetree::util::clean_name;
/// assert_eq!(clean_name("3D (Test).01"), "_3D_Test__01");
/// ```
pub fn clean_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        out.push('_');
    }
    for c in name.chars() {
        if c == '(' {
            continue;
        }
        if REPLACED.contains(&c) {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}

/// Whether sanitization would change the name. Used to decide when a rename
/// diagnostic is worth recording.
pub fn needs_cleaning(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_digit())
        || name.contains('(')
        || name.contains(REPLACED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name_exact() {
        // Exact character-by-character: leading-digit prefix, "(" dropped,
        // ")" "." and space each replaced.
        assert_eq!(clean_name("3D (Test).01"), "_3D_Test__01");
    }

    #[test]
    fn test_clean_name_passthrough() {
        assert_eq!(clean_name("Base_Material"), "Base_Material");
        assert!(!needs_cleaning("Base_Material"));
    }

    #[test]
    fn test_clean_name_punctuation() {
        assert_eq!(clean_name("a:b;c?d,e#f-g"), "a_b_c_d_e_f_g");
        assert!(needs_cleaning("a:b"));
    }

    #[test]
    fn test_clean_name_leading_digit() {
        assert_eq!(clean_name("01 metal"), "_01_metal");
    }

    #[test]
    fn test_clean_name_empty() {
        assert_eq!(clean_name(""), "");
    }
}
