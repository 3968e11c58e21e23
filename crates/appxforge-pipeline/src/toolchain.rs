use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Toolchain {
    pub makeappx: PathBuf,
    pub makecert: PathBuf,
    pub pvk2pfx: PathBuf,
    pub signtool: PathBuf,
    bin_dir: PathBuf,
}

impl Toolchain {
    pub fn from_bin_dir(bin_dir: &Path) -> Self {
        Self {
            makeappx: bin_dir.join("makeappx.exe"),
            makecert: bin_dir.join("makecert.exe"),
            pvk2pfx: bin_dir.join("pvk2pfx.exe"),
            signtool: bin_dir.join("signtool.exe"),
            bin_dir: bin_dir.to_path_buf(),
        }
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    pub fn tools(&self) -> [(&'static str, &Path); 4] {
        [
            ("makeappx", &self.makeappx),
            ("makecert", &self.makecert),
            ("pvk2pfx", &self.pvk2pfx),
            ("signtool", &self.signtool),
        ]
    }
}
