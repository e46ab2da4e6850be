use anyhow::{bail, Context, Result};
use plugo_core::config::{expand_user, VenvConfig};
use plugo_core::{PluginIdentity, RequirementSet};
use plugo_venv::{
    EnvVarSearchPath, EnvironmentDescriptor, EnvironmentManager, EnvironmentStore, PathExposer,
};
use std::path::PathBuf;
use std::process::Command;

use crate::cli::PluginArgs;

/// Merge `-r` specifiers and the optional requirements file into an identity.
pub fn identity_from_args(args: &PluginArgs) -> Result<PluginIdentity> {
    let mut requirements = RequirementSet::new(&args.requirements);
    if let Some(ref file) = args.requirements_file {
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("Read requirements file {}", file.display()))?;
        requirements.extend(RequirementSet::from_requirements_txt(&content).iter());
    }
    Ok(PluginIdentity {
        name: args.name.clone(),
        version: args.plugin_version.clone(),
        requirements,
    })
}

fn venv_config(base: Option<PathBuf>) -> VenvConfig {
    let mut cfg = VenvConfig::from_env();
    if let Some(base) = base {
        cfg.home = expand_user(&base);
    }
    cfg
}

pub fn key(args: &PluginArgs) -> Result<()> {
    println!("{}", identity_from_args(args)?.key());
    Ok(())
}

pub fn ensure(args: &PluginArgs, base: Option<PathBuf>) -> Result<()> {
    let plugin = identity_from_args(args)?;
    let manager = EnvironmentManager::from_config(&venv_config(base))?;
    let env = manager
        .ensure_plugin(&plugin)
        .with_context(|| format!("Ensure environment for plugin '{}'", plugin.name))?;
    println!("{}", serde_json::to_string_pretty(&env)?);
    Ok(())
}

pub fn site_paths(key: &str, base: Option<PathBuf>) -> Result<()> {
    let cfg = venv_config(base);
    let store = EnvironmentStore::new(&cfg.home);
    if !store.is_provisioned(key) {
        bail!(
            "Environment '{}' is not provisioned under {}",
            key,
            store.base().display()
        );
    }
    let (dir, interpreter) = store.locate(key);
    let env = EnvironmentDescriptor {
        key: key.to_string(),
        dir,
        interpreter,
    };
    let dirs = PathExposer::from_config(&cfg)
        .query_site_dirs(&env)?
        .unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(&dirs)?);
    Ok(())
}

/// Returns the child's exit code.
pub fn run(args: &PluginArgs, base: Option<PathBuf>, command: &[String]) -> Result<i32> {
    let Some((program, rest)) = command.split_first() else {
        bail!("No command given");
    };
    let plugin = identity_from_args(args)?;
    let cfg = venv_config(base);
    let manager = EnvironmentManager::from_config(&cfg)?;
    let env = manager
        .ensure_plugin(&plugin)
        .with_context(|| format!("Ensure environment for plugin '{}'", plugin.name))?;
    PathExposer::from_config(&cfg).expose_to(&env, &mut EnvVarSearchPath::pythonpath())?;

    let status = Command::new(program)
        .args(rest)
        .status()
        .with_context(|| format!("Run {}", program))?;
    Ok(status.code().unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(requirements: &[&str], file: Option<PathBuf>) -> PluginArgs {
        PluginArgs {
            name: "demo".into(),
            plugin_version: Some("1.0.0".into()),
            requirements: requirements.iter().map(|s| s.to_string()).collect(),
            requirements_file: file,
        }
    }

    #[test]
    fn test_identity_merges_requirements_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("requirements.txt");
        std::fs::write(&file, "# deps\nrich\nrequests>=2\n").unwrap();

        let merged = identity_from_args(&args(&["requests>=2 "], Some(file))).unwrap();
        let direct = identity_from_args(&args(&["rich", "requests>=2"], None)).unwrap();
        assert_eq!(merged.requirements.len(), 2);
        assert_eq!(merged.key(), direct.key());
    }

    #[test]
    fn test_identity_missing_requirements_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = identity_from_args(&args(&[], Some(tmp.path().join("nope.txt")))).unwrap_err();
        assert!(err.to_string().contains("Read requirements file"));
    }

    #[test]
    fn test_site_paths_requires_provisioned_env() {
        let tmp = tempfile::tempdir().unwrap();
        let err = site_paths("demo-0123456789ab", Some(tmp.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("not provisioned"));
    }
}
