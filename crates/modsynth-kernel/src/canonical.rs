//! Conversion between host request paths and canonical `::` names.

use crate::pattern::DELIMITER;

/// Extension used when a host keys loaded units by path.
pub const DEFAULT_EXTENSION: &str = "pm";

/// `Foo/Bar.pm`, `Foo\Bar.pm` and `Foo::Bar` all become `Foo::Bar`.
///
/// Surrounding whitespace is dropped. The result may be empty or contain
/// empty segments; dispatch declines such names.
pub fn canonicalize(request: &str) -> String {
    let trimmed = request.trim().trim_start_matches("./");
    let joined = trimmed.replace(['/', '\\'], DELIMITER);
    let joined = joined.trim_start_matches(DELIMITER);
    strip_extension(joined).to_string()
}

/// Inverse of [`canonicalize`]: `Foo::Bar` becomes `Foo/Bar.<extension>`.
pub fn to_request_path(name: &str, extension: &str) -> String {
    let path = name.replace(DELIMITER, "/");
    if extension.is_empty() {
        path
    } else {
        format!("{path}.{extension}")
    }
}

fn strip_extension(name: &str) -> &str {
    let leaf_start = name.rfind(DELIMITER).map_or(0, |idx| idx + DELIMITER.len());
    match name[leaf_start..].rfind('.') {
        Some(dot) if dot > 0 => &name[..leaf_start + dot],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_forms_collapse_to_one_name() {
        for request in [
            "Foo/Bar/Baz.pm",
            "Foo\\Bar\\Baz.pm",
            "Foo::Bar::Baz",
            "./Foo/Bar/Baz.pm",
            "/Foo/Bar/Baz.pm",
            "  Foo/Bar/Baz.pm\n",
        ] {
            assert_eq!(canonicalize(request), "Foo::Bar::Baz", "{request}");
        }
    }

    #[test]
    fn degenerate_requests_stay_degenerate() {
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize(" ./ "), "");
        assert_eq!(canonicalize("/"), "");
        assert_eq!(canonicalize("Foo/"), "Foo::");
    }

    #[test]
    fn only_the_final_extension_is_stripped() {
        assert_eq!(canonicalize("Foo/Bar.tar.gz"), "Foo::Bar.tar");
        assert_eq!(canonicalize("Foo.d/Bar"), "Foo.d::Bar");
        assert_eq!(canonicalize("Foo/.hidden"), "Foo::.hidden");
    }

    #[test]
    fn request_path_round_trips() {
        assert_eq!(to_request_path("Foo::Bar", DEFAULT_EXTENSION), "Foo/Bar.pm");
        assert_eq!(to_request_path("Foo", ""), "Foo");
        assert_eq!(canonicalize(&to_request_path("A::B::C", "pm")), "A::B::C");
    }
}
