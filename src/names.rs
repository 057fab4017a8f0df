use std::path::Path;

/// Decorations applied to a file's base name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameAffixes {
    pub prefix: String,
    pub suffix: String,
    pub taken_prefix: String,
    pub taken_suffix: String,
}

/// The name an emoji is uploaded under, and the fallback for when a built-in emoji owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateNames {
    pub name: String,
    pub taken_name: String,
}

/// Strips everything from the last `.` and every `:` from the file name.
///
/// A dotfile has no stem left. Colons delimit emoji names in messages, and some
/// platforms also report a leading `:` on path components (`/73.jpg` read as `:73.jpg`).
pub fn sanitized_stem(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|file_name| file_name.to_string_lossy())
        .unwrap_or_default();
    let stem = match file_name.rfind('.') {
        Some(dot) => &file_name[..dot],
        None => &file_name[..],
    };
    stem.replace(':', "")
}

pub fn derive_names(path: &Path, affixes: &NameAffixes) -> CandidateNames {
    let name = format!("{}{}{}", affixes.prefix, sanitized_stem(path), affixes.suffix);
    let taken_name = format!("{}{}{}", affixes.taken_prefix, name, affixes.taken_suffix);
    CandidateNames { name, taken_name }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn affixes(prefix: &str, suffix: &str, taken_prefix: &str, taken_suffix: &str) -> NameAffixes {
        NameAffixes {
            prefix: prefix.into(),
            suffix: suffix.into(),
            taken_prefix: taken_prefix.into(),
            taken_suffix: taken_suffix.into(),
        }
    }

    #[test]
    fn plain_file_name() {
        let names = derive_names(Path::new("emoji/icon.png"), &affixes("", "", "", "-alt"));
        assert_eq!(names.name, "icon");
        assert_eq!(names.taken_name, "icon-alt");
    }

    #[test]
    fn affixes_wrap_the_name() {
        let names = derive_names(
            Path::new("/tmp/set/party.gif"),
            &affixes("team-", "-v2", "custom-", "-x"),
        );
        assert_eq!(names.name, "team-party-v2");
        assert_eq!(names.taken_name, "custom-team-party-v2-x");
    }

    #[test]
    fn colons_are_removed() {
        let names = derive_names(Path::new(":73.jpg"), &affixes("", "", "", "_"));
        assert_eq!(names.name, "73");
        let names = derive_names(Path::new("dir/a:b:c.png"), &affixes("", "", "", "_"));
        assert_eq!(names.name, "abc");
        assert!(!names.taken_name.contains(':'));
    }

    #[test]
    fn only_the_last_extension_is_stripped() {
        let names = derive_names(Path::new("archive.tar.gz"), &affixes("", "", "", "_"));
        assert_eq!(names.name, "archive.tar");
    }

    #[test]
    fn dotfiles_have_no_stem() {
        assert_eq!(sanitized_stem(Path::new("set/.DS_Store")), "");
        assert_eq!(sanitized_stem(Path::new(".hidden.png")), ".hidden");
    }

    #[test]
    fn no_extension() {
        let names = derive_names(Path::new("dir/README"), &affixes("p", "s", "", "_"));
        assert_eq!(names.name, "pREADMEs");
    }

    #[test]
    fn taken_name_is_longer_by_the_taken_affixes() {
        let affixes = affixes("a", "b", "tp-", "-ts");
        for path in ["x.png", "dir/long-name.gif", "::.jpg", "weird:.png", "nested/dir/y"] {
            let names = derive_names(Path::new(path), &affixes);
            assert_eq!(
                names.taken_name.len(),
                names.name.len() + affixes.taken_prefix.len() + affixes.taken_suffix.len()
            );
            assert!(!names.name.contains(':'));
            assert!(!names.taken_name.contains(':'));
        }
    }

    #[test]
    fn distinct_paths_may_collide() {
        let affixes = affixes("", "", "", "_");
        assert_eq!(
            derive_names(Path::new("a/fire.png"), &affixes),
            derive_names(Path::new("b/fire.gif"), &affixes)
        );
    }
}
