use crate::models::BuildType;
use camino::Utf8Path;
use std::fs;

/// Cache file written by the generator into the build directory
pub const CACHE_FILE_NAME: &str = "CMakeCache.txt";

const BUILD_TYPE_KEY: &str = "CMAKE_BUILD_TYPE";

/// Classify the build directory's configuration from its cache file.
///
/// Best effort: a missing or unreadable cache yields [`BuildType::Unknown`].
pub fn read_build_type(build_dir: &Utf8Path) -> BuildType {
    let cache_path = build_dir.join(CACHE_FILE_NAME);
    let bytes = match fs::read(&cache_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("No readable cache at {}: {}", cache_path, e);
            return BuildType::Unknown;
        }
    };

    build_type_from_cache(&String::from_utf8_lossy(&bytes))
}

/// Scan cache contents for the first `CMAKE_BUILD_TYPE` entry.
///
/// Entries look like `CMAKE_BUILD_TYPE:STRING=Debug`; the type annotation is
/// optional.
pub fn build_type_from_cache(contents: &str) -> BuildType {
    contents
        .lines()
        .find(|line| line.starts_with(BUILD_TYPE_KEY))
        .and_then(|line| line.split_once('='))
        .map(|(_, value)| BuildType::from_cache_value(value))
        .unwrap_or(BuildType::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_build_type_from_cache() {
        let cache = "# comment\n\
                     CMAKE_AR:FILEPATH=/usr/bin/ar\n\
                     CMAKE_BUILD_TYPE:STRING=RelWithDebInfo\n";
        assert_eq!(build_type_from_cache(cache), BuildType::Profile);
        assert_eq!(build_type_from_cache("CMAKE_BUILD_TYPE=release\n"), BuildType::Release);
        assert_eq!(build_type_from_cache("CMAKE_BUILD_TYPE:STRING=MinSizeRel"), BuildType::Release);
        assert_eq!(build_type_from_cache("CMAKE_BUILD_TYPE:STRING=debugfull"), BuildType::Debug);
        assert_eq!(build_type_from_cache("CMAKE_BUILD_TYPE:STRING="), BuildType::Unknown);
        assert_eq!(build_type_from_cache("CMAKE_BUILD_TYPE"), BuildType::Unknown);
        assert_eq!(build_type_from_cache(""), BuildType::Unknown);
    }

    #[test]
    fn test_read_build_type() {
        let dir = TempDir::new().unwrap();
        let build_dir = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        assert_eq!(read_build_type(&build_dir), BuildType::Unknown);

        fs::write(build_dir.join(CACHE_FILE_NAME), "CMAKE_BUILD_TYPE:STRING=Debug\r\n").unwrap();
        assert_eq!(read_build_type(&build_dir), BuildType::Debug);
    }
}
