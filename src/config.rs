use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use std::{env, fmt, path::PathBuf};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Where photo bytes are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    /// An S3 (or S3-compatible) bucket.
    S3,
    /// A directory on the local filesystem.
    Local,
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub secret_key: String,
    pub bucket_name: String,
    pub storage_backend: StorageBackend,
    pub storage_dir: PathBuf,
    pub s3_endpoint: Option<String>,
    pub public_base_url: Option<String>,
    pub max_upload_bytes: usize,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("secret_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .field("storage_backend", &self.storage_backend)
            .field("storage_dir", &self.storage_dir)
            .field("s3_endpoint", &self.s3_endpoint)
            .field("public_base_url", &self.public_base_url)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Photo upload and editing API")]
pub struct Args {
    /// Host to bind to (overrides PIXLY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PIXLY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Bucket holding photo bytes (overrides BUCKET_NAME)
    #[arg(long)]
    pub bucket_name: Option<String>,

    /// Object store backend (overrides PIXLY_STORAGE_BACKEND)
    #[arg(long, value_enum)]
    pub storage_backend: Option<StorageBackend>,

    /// Root directory for the local backend (overrides PIXLY_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,

    /// Custom S3-compatible endpoint (overrides PIXLY_S3_ENDPOINT)
    #[arg(long)]
    pub s3_endpoint: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // A missing .env file is fine; the real environment still applies.
        let _ = dotenvy::dotenv();

        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::resolve(args, |name| env::var(name).ok())?;
        Ok((cfg, migrate))
    }

    /// Merge parsed CLI args over values from `lookup` (normally the process
    /// environment). CLI values win.
    pub fn resolve(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |cli: Option<String>, name: &str| -> Result<String> {
            cli.or_else(|| lookup(name))
                .filter(|value| !value.is_empty())
                .ok_or_else(|| anyhow!("required setting `{}` is not set", name))
        };

        let database_url = required(args.database_url, "DATABASE_URL")?;
        let secret_key = required(None, "SECRET_KEY")?;
        let bucket_name = required(args.bucket_name, "BUCKET_NAME")?;

        let env_port = match lookup("PIXLY_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PIXLY_PORT value `{}`", value))?,
            None => 5000,
        };
        let env_backend = match lookup("PIXLY_STORAGE_BACKEND") {
            Some(value) => StorageBackend::from_str(&value, true)
                .map_err(|err| anyhow!("parsing PIXLY_STORAGE_BACKEND value `{}`: {}", value, err))?,
            None => StorageBackend::S3,
        };
        let max_upload_bytes = match lookup("PIXLY_MAX_UPLOAD_BYTES") {
            Some(value) => value
                .parse::<usize>()
                .with_context(|| format!("parsing PIXLY_MAX_UPLOAD_BYTES value `{}`", value))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            host: args
                .host
                .or_else(|| lookup("PIXLY_HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port: args.port.unwrap_or(env_port),
            database_url,
            secret_key,
            bucket_name,
            storage_backend: args.storage_backend.unwrap_or(env_backend),
            storage_dir: args
                .storage_dir
                .or_else(|| lookup("PIXLY_STORAGE_DIR").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("./data/objects")),
            s3_endpoint: args.s3_endpoint.or_else(|| lookup("PIXLY_S3_ENDPOINT")),
            public_base_url: lookup("PIXLY_PUBLIC_BASE_URL"),
            max_upload_bytes,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |name| map.get(name).map(|v| v.to_string())
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "sqlite://./data/pixly.db"),
        ("SECRET_KEY", "hunter2"),
        ("BUCKET_NAME", "pixly-photos"),
    ];

    #[test]
    fn defaults_apply_when_only_required_vars_set() {
        let cfg = AppConfig::resolve(Args::default(), lookup(&REQUIRED)).unwrap();

        assert_eq!(cfg.addr(), "0.0.0.0:5000");
        assert_eq!(cfg.bucket_name, "pixly-photos");
        assert_eq!(cfg.storage_backend, StorageBackend::S3);
        assert_eq!(cfg.storage_dir, PathBuf::from("./data/objects"));
        assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(cfg.s3_endpoint, None);
    }

    #[test]
    fn each_required_var_is_enforced() {
        for missing in ["DATABASE_URL", "SECRET_KEY", "BUCKET_NAME"] {
            let vars: Vec<_> = REQUIRED.into_iter().filter(|(k, _)| *k != missing).collect();
            let err = AppConfig::resolve(Args::default(), lookup(&vars)).unwrap_err();
            assert!(err.to_string().contains(missing), "{err}");
        }
    }

    #[test]
    fn cli_overrides_environment() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([("PIXLY_PORT", "8080"), ("PIXLY_STORAGE_BACKEND", "s3")]);
        let args = Args {
            port: Some(9000),
            bucket_name: Some("from-cli".into()),
            storage_backend: Some(StorageBackend::Local),
            ..Args::default()
        };

        let cfg = AppConfig::resolve(args, lookup(&vars)).unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.bucket_name, "from-cli");
        assert_eq!(cfg.storage_backend, StorageBackend::Local);
    }

    #[test]
    fn environment_values_are_parsed() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("PIXLY_PORT", "8080"),
            ("PIXLY_STORAGE_BACKEND", "LOCAL"),
            ("PIXLY_MAX_UPLOAD_BYTES", "1024"),
            ("PIXLY_PUBLIC_BASE_URL", "https://cdn.example.com"),
        ]);

        let cfg = AppConfig::resolve(Args::default(), lookup(&vars)).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.storage_backend, StorageBackend::Local);
        assert_eq!(cfg.max_upload_bytes, 1024);
        assert_eq!(cfg.public_base_url.as_deref(), Some("https://cdn.example.com"));
    }

    #[test]
    fn bad_port_is_an_error() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PIXLY_PORT", "not-a-port"));
        let err = AppConfig::resolve(Args::default(), lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("PIXLY_PORT"));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let cfg = AppConfig::resolve(Args::default(), lookup(&REQUIRED)).unwrap();
        let printed = format!("{:?}", cfg);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }
}
