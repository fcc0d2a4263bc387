//! URL slug derivation

/// Derive a URL slug from a display name: lowercase, alphanumerics kept,
/// runs of anything else collapsed to single hyphens.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("The Forest Hiker"), "the-forest-hiker");
    }

    #[test]
    fn test_slugify_collapses_punctuation() {
        assert_eq!(slugify("Sea -- & Sun!!"), "sea-sun");
    }

    #[test]
    fn test_slugify_trims_edges() {
        assert_eq!(slugify("  River Rafting  "), "river-rafting");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }
}
