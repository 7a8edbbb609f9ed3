use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Default location of the diagnostic log.
pub const DEFAULT_LOG_FILE: &str = "error.log";
/// Appended to the input stem when writing an image.
pub const IMAGE_SUFFIX: &str = ".bytemap.png";
/// Appended to the image stem when writing recovered data.
pub const DATA_SUFFIX: &str = ".output";

#[derive(Debug, Clone)]
pub struct Settings {
    pub log_file: PathBuf,
    pub image_suffix: String,
    pub data_suffix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            image_suffix: IMAGE_SUFFIX.to_string(),
            data_suffix: DATA_SUFFIX.to_string(),
        }
    }
}

impl Settings {
    /// `<output_dir>/<input stem><image suffix>`
    pub fn image_path(&self, input: &Path, output_dir: &Path) -> PathBuf {
        derive_output(input, output_dir, &self.image_suffix)
    }

    /// `<output_dir>/<input stem><data suffix>`
    pub fn data_path(&self, input: &Path, output_dir: &Path) -> PathBuf {
        derive_output(input, output_dir, &self.data_suffix)
    }
}

/// Drops the last extension of the input's file name and adds `suffix`.
fn derive_output(input: &Path, output_dir: &Path, suffix: &str) -> PathBuf {
    let mut name = input
        .file_stem()
        .unwrap_or_else(|| OsStr::new("bytemap"))
        .to_os_string();
    name.push(suffix);
    output_dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_name_replaces_extension() {
        let settings = Settings::default();
        assert_eq!(
            settings.image_path(Path::new("/data/report.pdf"), Path::new("/out")),
            PathBuf::from("/out/report.bytemap.png")
        );
    }

    #[test]
    fn data_name_drops_only_last_extension() {
        let settings = Settings::default();
        assert_eq!(
            settings.data_path(Path::new("in/report.bytemap.png"), Path::new("out")),
            PathBuf::from("out/report.bytemap.output")
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_stem_is_kept_byte_for_byte() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let input = Path::new(OsStr::from_bytes(b"caf\xe9.txt"));
        let output = Settings::default().image_path(input, Path::new("out"));
        assert_eq!(
            output.file_name().map(|name| name.as_bytes()),
            Some(&b"caf\xe9.bytemap.png"[..])
        );
    }

    #[test]
    fn extensionless_input_keeps_name() {
        let settings = Settings::default();
        assert_eq!(
            settings.image_path(Path::new("Makefile"), Path::new(".")),
            PathBuf::from("./Makefile.bytemap.png")
        );
    }
}
