use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};

/// 5 MiB, matching the editor-side upload limit.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

const DEFAULT_AUTHOR: &str = "Sungsoo Yang";

#[derive(Debug, Clone)]
pub struct InkpostConfig {
    pub api_port: u16,
    /// Create/upload endpoints are only served when this is set. Read once at
    /// startup; never mutated for the lifetime of the process.
    pub author_mode: bool,
    pub author_name: String,
    pub max_upload_bytes: u64,
    pub paths: InkpostPaths,
}

impl InkpostConfig {
    pub fn from_env() -> Result<Self> {
        let paths = InkpostPaths::discover()?;
        let api_port = env::var("INKPOST_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8080);
        let author_mode = env::var("INKPOST_AUTHOR_MODE")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let author_name =
            env::var("INKPOST_AUTHOR").unwrap_or_else(|_| DEFAULT_AUTHOR.to_string());
        let max_upload_bytes = env::var("INKPOST_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        Ok(Self {
            api_port,
            author_mode,
            author_name,
            max_upload_bytes,
            paths,
        })
    }

}

#[derive(Debug, Clone, Default)]
pub struct InkpostPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub media_dir: PathBuf,
}

impl InkpostPaths {
    pub fn discover() -> Result<Self> {
        let exe_path = std::env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("inkpost.db");
        let media_dir = base.join("media");

        Ok(Self {
            base,
            data_dir,
            db_path,
            media_dir,
        })
    }
}
