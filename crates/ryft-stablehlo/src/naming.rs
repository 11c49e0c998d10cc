//! Identifier normalization and wire-name derivation.

/// Normalizes an arbitrary string into a valid identifier. Every character that is not an ASCII letter, an ASCII
/// digit, or an underscore is replaced by an underscore, and an underscore is prepended if the result would start
/// with a digit. The empty string normalizes to the empty string.
///
/// # Examples
///
/// ```rust
/// # use ryft_stablehlo::naming::normalize_identifier;
/// assert_eq!(normalize_identifier("weights"), "weights");
/// assert_eq!(normalize_identifier("layer-1.bias"), "layer_1_bias");
/// assert_eq!(normalize_identifier("0th"), "_0th");
/// ```
pub fn normalize_identifier<S: AsRef<str>>(name: S) -> String {
    let mut normalized = String::with_capacity(name.as_ref().len() + 1);
    for character in name.as_ref().chars() {
        if character.is_ascii_alphanumeric() || character == '_' {
            normalized.push(character);
        } else {
            normalized.push('_');
        }
    }
    if normalized.starts_with(|character: char| character.is_ascii_digit()) {
        normalized.insert(0, '_');
    }
    normalized
}

/// Returns `true` if the provided name is non-empty and left unchanged by [`normalize_identifier`].
pub fn is_identifier<S: AsRef<str>>(name: S) -> bool {
    let name = name.as_ref();
    !name.is_empty() && normalize_identifier(name) == name
}

/// Converts a `CamelCase` name into `snake_case`. An underscore is inserted before every uppercase letter that
/// follows a lowercase letter or a digit.
pub fn snake_case<S: AsRef<str>>(name: S) -> String {
    let mut converted = String::with_capacity(name.as_ref().len() + 4);
    let mut previous: Option<char> = None;
    for character in name.as_ref().chars() {
        if character.is_ascii_uppercase() {
            if previous.is_some_and(|previous| previous.is_ascii_lowercase() || previous.is_ascii_digit()) {
                converted.push('_');
            }
            converted.push(character.to_ascii_lowercase());
        } else {
            converted.push(character);
        }
        previous = Some(character);
    }
    converted
}

/// Escapes backslashes and double quotes so that `value` can be placed inside a quoted string literal.
pub(crate) fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("main"), "main");
        assert_eq!(normalize_identifier("my function"), "my_function");
        assert_eq!(normalize_identifier("a.b-c"), "a_b_c");
        assert_eq!(normalize_identifier("42"), "_42");
        assert_eq!(normalize_identifier("_42"), "_42");
        assert_eq!(normalize_identifier("ünï"), "_n_");
        assert_eq!(normalize_identifier(""), "");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("x"));
        assert!(is_identifier("data_parallel"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("my mesh"));
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("Add"), "add");
        assert_eq!(snake_case("CountLeadingZeros"), "count_leading_zeros");
        assert_eq!(snake_case("BroadcastInDim"), "broadcast_in_dim");
        assert_eq!(snake_case("Atan2"), "atan2");
        assert_eq!(snake_case("AllToAll"), "all_to_all");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("plain"), "plain");
        assert_eq!(escape_string("a\"b"), "a\\\"b");
        assert_eq!(escape_string("a\\b"), "a\\\\b");
    }
}
