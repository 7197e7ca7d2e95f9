use uuid::Uuid;

/// Generates a URL-safe portfolio slug from a display name.
///
/// The name is lowercased, runs of non-alphanumeric characters collapse to a
/// single hyphen, and a 6-hex-char random suffix is appended so two people
/// with the same name get distinct slugs. Collisions are still possible and
/// surface as `DuplicateSlug`; the caller retries with a fresh suffix.
pub fn generate_portfolio_slug(name: &str) -> String {
    let base = slugify(name);
    let suffix = &Uuid::new_v4().simple().to_string()[..6];
    if base.is_empty() {
        format!("portfolio-{suffix}")
    } else {
        format!("{base}-{suffix}")
    }
}

fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Aakash Singh"), "aakash-singh");
    }

    #[test]
    fn test_slugify_collapses_symbol_runs() {
        assert_eq!(slugify("  Jean-Luc  O'Neil!! "), "jean-luc-o-neil");
    }

    #[test]
    fn test_slugify_strips_leading_and_trailing_hyphens() {
        assert_eq!(slugify("---abc---"), "abc");
    }

    #[test]
    fn test_slug_has_random_suffix() {
        let slug = generate_portfolio_slug("Ada Lovelace");
        assert!(slug.starts_with("ada-lovelace-"));
        let suffix = slug.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_slug_for_symbol_only_name_falls_back() {
        let slug = generate_portfolio_slug("!!!");
        assert!(slug.starts_with("portfolio-"));
    }

    #[test]
    fn test_slugs_differ_across_calls() {
        assert_ne!(
            generate_portfolio_slug("Same Name"),
            generate_portfolio_slug("Same Name")
        );
    }
}
