// src/config/validate.rs

use crate::config::model::{RawSettings, Settings};
use crate::errors::{KilnError, Result};
use crate::watch::ExcludeSet;

impl TryFrom<RawSettings> for Settings {
    type Error = KilnError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        validate_ports(&raw)?;
        let extension = normalize_extension(&raw.extension)?;
        let build_args = tokenize_build_args(&raw.build_args)?;

        let build_root = raw.build.clone().unwrap_or_else(|| raw.path.clone());

        Ok(Settings {
            laddr: raw.laddr.filter(|s| !s.trim().is_empty()),
            port: raw.port,
            app_port: raw.app_port,
            bin: raw.bin,
            watch_root: raw.path,
            build_root,
            excludes: ExcludeSet::new(raw.exclude_dir),
            immediate: raw.immediate,
            watch_all: raw.all,
            build_args,
            cert_file: raw.cert_file,
            key_file: raw.key_file,
            log_prefix: raw.log_prefix,
            notifications: raw.notifications,
            extension,
            output: raw.output,
        })
    }
}

fn validate_ports(raw: &RawSettings) -> Result<()> {
    if raw.port == raw.app_port {
        return Err(KilnError::ConfigError(format!(
            "proxy port and app port must differ (both are {})",
            raw.port
        )));
    }
    Ok(())
}

fn normalize_extension(ext: &str) -> Result<String> {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        return Err(KilnError::ConfigError(
            "source extension must not be empty".to_string(),
        ));
    }
    Ok(ext.to_string())
}

/// Split the extra build arguments with POSIX shell rules.
pub fn tokenize_build_args(args: &str) -> Result<Vec<String>> {
    shlex::split(args).ok_or_else(|| KilnError::BuildArgs(args.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_root_defaults_to_watch_root() {
        let raw = RawSettings {
            path: "app".into(),
            ..RawSettings::default()
        };
        let settings = Settings::try_from(raw).unwrap();
        assert_eq!(settings.build_root, settings.watch_root);
    }

    #[test]
    fn tokenizes_quoted_build_args() {
        let args = tokenize_build_args(r#"--features "dev tracing" --locked"#).unwrap();
        assert_eq!(args, vec!["--features", "dev tracing", "--locked"]);
    }

    #[test]
    fn unbalanced_quote_is_a_build_args_error() {
        match tokenize_build_args("--features \"dev") {
            Err(KilnError::BuildArgs(s)) => assert!(s.contains("dev")),
            other => panic!("expected BuildArgs error, got {other:?}"),
        }
    }

    #[test]
    fn extension_loses_leading_dot() {
        assert_eq!(normalize_extension(".rs").unwrap(), "rs");
        assert!(normalize_extension(" . ").is_err());
    }

    #[test]
    fn same_ports_are_rejected() {
        let raw = RawSettings {
            port: 4000,
            app_port: 4000,
            ..RawSettings::default()
        };
        assert!(matches!(
            Settings::try_from(raw),
            Err(KilnError::ConfigError(_))
        ));
    }
}
