use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("arch-check") => arch_check(),
        Some(cmd) => anyhow::bail!("Unknown xtask command: {cmd}"),
        None => anyhow::bail!("Usage: cargo xtask <command>\n\nCommands:\n  arch-check"),
    }
}

#[derive(Debug, Deserialize)]
struct Metadata {
    packages: Vec<Package>,
}

#[derive(Debug, Deserialize)]
struct Package {
    name: String,
    manifest_path: PathBuf,
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
struct Dependency {
    name: String,
    /// `null` for normal dependencies, `"dev"` or `"build"` otherwise
    kind: Option<String>,
}

/// Crates each layer must not pull in as normal dependencies.
fn forbidden_dependencies() -> HashMap<&'static str, Vec<&'static str>> {
    let runtime = ["tokio", "tokio-util", "reqwest", "tracing-subscriber", "dotenvy"];
    HashMap::from([
        (
            "delver-domain",
            runtime
                .iter()
                .copied()
                .chain(["delver-shared", "delver-player"])
                .collect(),
        ),
        (
            "delver-shared",
            runtime.iter().copied().chain(["delver-player"]).collect(),
        ),
    ])
}

fn arch_check() -> anyhow::Result<()> {
    let output = std::process::Command::new("cargo")
        .args(["metadata", "--format-version", "1", "--no-deps"])
        .output()
        .context("running cargo metadata")?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed")
    }

    let metadata: Metadata =
        serde_json::from_slice(&output.stdout).context("parsing cargo metadata output")?;

    let mut violations = check_dependencies(&metadata);
    for package in &metadata.packages {
        if forbidden_dependencies().contains_key(package.name.as_str()) {
            let src = package
                .manifest_path
                .parent()
                .map(|dir| dir.join("src"))
                .context("manifest path has no parent")?;
            violations.extend(check_sources(&package.name, &src)?);
        }
    }

    if violations.is_empty() {
        println!("arch-check: OK");
        Ok(())
    } else {
        for violation in &violations {
            eprintln!("arch-check: {violation}");
        }
        anyhow::bail!("{} architecture violation(s)", violations.len())
    }
}

fn check_dependencies(metadata: &Metadata) -> Vec<String> {
    let forbidden = forbidden_dependencies();
    let mut violations = Vec::new();
    for package in &metadata.packages {
        let Some(banned) = forbidden.get(package.name.as_str()) else {
            continue;
        };
        for dep in package.dependencies.iter().filter(|d| d.kind.is_none()) {
            if banned.contains(&dep.name.as_str()) {
                violations.push(format!("{} depends on {}", package.name, dep.name));
            }
        }
    }
    violations
}

/// Catch runtime crates reached through paths rather than the manifest.
fn check_sources(package: &str, src: &Path) -> anyhow::Result<Vec<String>> {
    let pattern = regex_lite::Regex::new(r"\b(tokio|reqwest|tokio_util|dotenvy)::")
        .context("compiling source pattern")?;
    let mut violations = Vec::new();
    for file in rust_files(src)? {
        let text = std::fs::read_to_string(&file)
            .with_context(|| format!("reading {}", file.display()))?;
        for (number, line) in text.lines().enumerate() {
            if line.trim_start().starts_with("//") {
                continue;
            }
            if let Some(found) = pattern.captures(line).and_then(|c| c.get(1)) {
                violations.push(format!(
                    "{package}: {}:{} references {}",
                    file.display(),
                    number + 1,
                    found.as_str()
                ));
            }
        }
    }
    Ok(violations)
}

fn rust_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in
            std::fs::read_dir(&dir).with_context(|| format!("listing {}", dir.display()))?
        {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}
