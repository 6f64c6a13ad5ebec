use std::path::{Path, PathBuf};

/// `build`, then the user's platform arguments with duplicates removed, then
/// `required_flag` unless it is already present.
pub fn build_args(platform_args: &[String], required_flag: Option<&str>) -> Vec<String> {
    let mut args = vec!["build".to_string()];
    for arg in platform_args {
        if !args[1..].contains(arg) {
            args.push(arg.clone());
        }
    }

    if let Some(flag) = required_flag {
        if !args[1..].iter().any(|arg| arg == flag) {
            args.push(flag.to_string());
        }
    }

    args
}

/// `go build` in `dir` writes `<dir>/<dir name>`, plus `.exe` on Windows.
pub fn executable_path(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = if cfg!(windows) { ".exe" } else { "" };
    dir.join(format!("{name}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_required_flag_appended() {
        assert_eq!(build_args(&[], Some("-i")), strings(&["build", "-i"]));
        assert_eq!(build_args(&[], None), strings(&["build"]));
    }

    #[test]
    fn test_platform_args_deduplicated_in_order() {
        let platform = strings(&["-race", "-v", "-race", "-i"]);
        assert_eq!(
            build_args(&platform, Some("-i")),
            strings(&["build", "-race", "-v", "-i"])
        );
    }

    #[test]
    fn test_build_verb_in_platform_args_is_kept() {
        let platform = strings(&["build"]);
        assert_eq!(build_args(&platform, None), strings(&["build", "build"]));
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_path() {
        assert_eq!(
            executable_path(Path::new("/ws/u/src/hello")),
            PathBuf::from("/ws/u/src/hello/hello")
        );
    }
}
