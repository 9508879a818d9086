use std::borrow::Cow;

/// Extension trait for `str` treating it as a slash-separated template path.
///
/// Template paths are always `/`-separated regardless of platform, and are
/// resolved lexically: nothing here touches the file system.
pub trait SlashPath {
    /// Converts platform separators to `/`.
    ///
    /// # Examples
    /// ```
    /// use jetset::ext::SlashPath;
    ///
    /// assert_eq!("views/index.jet".to_slash(), "views/index.jet");
    /// ```
    fn to_slash(&self) -> Cow<'_, str>;

    /// Whether the path starts at the template root.
    fn is_rooted(&self) -> bool;

    /// Shortest lexically equivalent path: repeated separators, `.` segments
    /// and resolvable `..` segments are removed. `..` never climbs above `/`.
    ///
    /// # Examples
    /// ```
    /// use jetset::ext::SlashPath;
    ///
    /// assert_eq!("/a/b/../c/./d".clean(), "/a/c/d");
    /// assert_eq!("/../x".clean(), "/x");
    /// ```
    fn clean(&self) -> String;

    /// Everything but the last element, cleaned.
    fn dir(&self) -> String;

    /// The last element; `.` for an empty path and `/` for the root.
    fn base(&self) -> String;
}

impl SlashPath for str {
    fn to_slash(&self) -> Cow<'_, str> {
        if std::path::MAIN_SEPARATOR == '/' {
            Cow::Borrowed(self)
        } else {
            Cow::Owned(self.replace(std::path::MAIN_SEPARATOR, "/"))
        }
    }

    fn is_rooted(&self) -> bool {
        self.starts_with('/')
    }

    fn clean(&self) -> String {
        if self.is_empty() {
            return ".".to_string();
        }
        let rooted = self.is_rooted();
        let mut segments: Vec<&str> = Vec::new();
        for segment in self.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.last().is_some_and(|last| *last != "..") {
                        segments.pop();
                    } else if !rooted {
                        segments.push("..");
                    }
                }
                other => segments.push(other),
            }
        }
        let joined = segments.join("/");
        match (rooted, joined.is_empty()) {
            (true, _) => format!("/{joined}"),
            (false, true) => ".".to_string(),
            (false, false) => joined,
        }
    }

    fn dir(&self) -> String {
        match self.rfind('/') {
            Some(idx) => self[..=idx].clean(),
            None => ".".to_string(),
        }
    }

    fn base(&self) -> String {
        if self.is_empty() {
            return ".".to_string();
        }
        let trimmed = self.trim_end_matches('/');
        if trimmed.is_empty() {
            return "/".to_string();
        }
        match trimmed.rfind('/') {
            Some(idx) => trimmed[idx + 1..].to_string(),
            None => trimmed.to_string(),
        }
    }
}

/// Joins `elem` onto `base` and cleans the result. Empty inputs are skipped;
/// joining two empty strings yields an empty string.
pub fn join(base: &str, elem: &str) -> String {
    match (base.is_empty(), elem.is_empty()) {
        (true, true) => String::new(),
        (true, false) => elem.clean(),
        (false, true) => base.clean(),
        (false, false) => format!("{base}/{elem}").clean(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_rooted_paths() {
        assert_eq!("/".clean(), "/");
        assert_eq!("//a//b/".clean(), "/a/b");
        assert_eq!("/a/b/../../..".clean(), "/");
        assert_eq!("/a/./b".clean(), "/a/b");
    }

    #[test]
    fn test_clean_relative_paths() {
        assert_eq!("".clean(), ".");
        assert_eq!("a/..".clean(), ".");
        assert_eq!("../x".clean(), "../x");
        assert_eq!("a/../../b".clean(), "../b");
    }

    #[test]
    fn test_dir() {
        assert_eq!("/a/b/child".dir(), "/a/b");
        assert_eq!("/index".dir(), "/");
        assert_eq!("/".dir(), "/");
        assert_eq!("index".dir(), ".");
    }

    #[test]
    fn test_base() {
        assert_eq!("/a/b/child.jet".base(), "child.jet");
        assert_eq!("a/".base(), "a");
        assert_eq!(".".base(), ".");
        assert_eq!("/".base(), "/");
        assert_eq!("///".base(), "/");
        assert_eq!("".base(), ".");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/", "x/y"), "/x/y");
        assert_eq!(join("/a/b", "../base"), "/a/base");
        assert_eq!(join("/", "rel/path"), "/rel/path");
        assert_eq!(join("", ""), "");
        assert_eq!(join("", "a/./b"), "a/b");
    }
}
