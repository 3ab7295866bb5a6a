//! Form-style query strings for hosted payment URLs and signature bases.

/// Percent-encode a value with spaces as `+`
pub fn encode_value(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

/// Join pairs as `k=v&k=v`, skipping empty values
pub fn encode_pairs(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}", key, encode_value(value.trim())))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_pairs() {
        let pairs = [
            ("item_name", "CIPC Annual Returns Filing".to_string()),
            ("email_address", "".to_string()),
            ("return_url", "https://x.co/ok?a=1".to_string()),
        ];

        assert_eq!(
            encode_pairs(&pairs),
            "item_name=CIPC+Annual+Returns+Filing&return_url=https%3A%2F%2Fx.co%2Fok%3Fa%3D1"
        );
    }
}
