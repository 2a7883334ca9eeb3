//! Cache key derivation.

/// Join a domain and its parameters as `<domain>:<p1>:<p2>`.
///
/// Parameters are trimmed and ASCII-lowercased so `"Calm "` and `"calm"`
/// share an entry; non-ASCII text is kept as written. A `:` inside a
/// parameter is percent-escaped so distinct parameter lists never collide.
pub fn cache_key<I, S>(domain: &str, parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut key = domain.to_string();
    for part in parts {
        key.push(':');
        let normalized = part.as_ref().trim().to_ascii_lowercase();
        key.push_str(&normalized.replace('%', "%25").replace(':', "%3A"));
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(cache_key("poems", ["sad", "위로"]), "poems:sad:위로");
        assert_eq!(cache_key("videos", [" Calm Music "]), "videos:calm music");
        assert_eq!(cache_key("stats", Vec::<String>::new()), "stats");
    }

    #[test]
    fn test_separator_in_parts_does_not_collide() {
        assert_ne!(cache_key("s", ["a:b"]), cache_key("s", ["a", "b"]));
        assert_ne!(cache_key("s", ["a%3Ab"]), cache_key("s", ["a:b"]));
    }
}
