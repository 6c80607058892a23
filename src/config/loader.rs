//! Configuration file loading with CLI overrides

use super::{ConfigError, ControllerConfig};
use clap::Parser;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Drive an addressable LED strip from WebSocket commands
#[derive(Parser, Debug, Default)]
#[command(name = "pixel-commander", version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to serve HTTP and WebSocket on
    #[arg(long)]
    pub listen: Option<SocketAddr>,

    /// Number of pixels on the strip
    #[arg(long)]
    pub pixels: Option<u16>,

    /// Maximum number of buffered commands
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Commands executed per tick
    #[arg(long)]
    pub drain_per_tick: Option<usize>,
}

impl Args {
    fn apply(&self, config: &mut ControllerConfig) {
        if let Some(listen) = self.listen {
            config.network.listen = listen;
        }
        if let Some(pixels) = self.pixels {
            config.strip.pixel_count = pixels;
        }
        if let Some(capacity) = self.queue_capacity {
            config.queue.capacity = capacity;
        }
        if let Some(drain) = self.drain_per_tick {
            config.queue.drain_per_tick = drain;
        }
    }
}

/// Read a configuration file without validating it
pub fn from_file(path: &Path) -> Result<ControllerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Build the effective configuration: file (or defaults), then CLI flags
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the result
/// fails validation
pub fn load(args: &Args) -> Result<ControllerConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => from_file(path)?,
        None => ControllerConfig::default(),
    };

    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_partial_file() {
        let file = write_config(
            r#"
[network]
ssid = "porch-lights"
listen = "127.0.0.1:9100"

[strip]
pixel_count = 144
"#,
        );

        let config = from_file(file.path()).unwrap();
        assert_eq!(config.network.ssid, "porch-lights");
        assert_eq!(config.network.listen, "127.0.0.1:9100".parse().unwrap());
        assert_eq!(config.strip.pixel_count, 144);
        assert_eq!(config.strip.data_pin, 5);
        assert_eq!(config.queue.capacity, 512);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = write_config("[strip]\npixel_count = 30\n");
        let args = Args {
            config: Some(file.path().to_path_buf()),
            pixels: Some(10),
            drain_per_tick: Some(4),
            ..Default::default()
        };

        let config = load(&args).unwrap();
        assert_eq!(config.strip.pixel_count, 10);
        assert_eq!(config.queue.drain_per_tick, 4);
    }

    #[test]
    fn test_no_file_uses_defaults() {
        let config = load(&Args::default()).unwrap();
        assert_eq!(config, ControllerConfig::default());
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = Args {
            queue_capacity: Some(0),
            ..Default::default()
        };
        assert!(matches!(load(&args), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let file = write_config("[strip]\npixels = 30\n");
        assert!(matches!(from_file(file.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file() {
        let err = from_file(Path::new("/nonexistent/pixel-commander.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_parse_cli_flags() {
        let args = Args::parse_from(["pixel-commander", "--pixels", "12", "--listen", "0.0.0.0:81"]);
        assert_eq!(args.pixels, Some(12));
        assert_eq!(args.listen, Some("0.0.0.0:81".parse().unwrap()));
    }
}
