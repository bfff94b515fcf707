//! Renders the installer package scaffolding from embedded templates.
//!
//! Failures are per-file: a template that will not render or write is logged
//! and skipped, the remaining templates still go out, and the exit code stays
//! zero either way.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

const INSTALL: &str = include_str!("../templates/chocolateyinstall.ps1.tpl");
const UNINSTALL: &str = include_str!("../templates/chocolateyuninstall.ps1.tpl");
const DOWNLOAD: &str = include_str!("../templates/download.ps1.tpl");
const LOGGER: &str = include_str!("../templates/logger.ps1.tpl");
const NUSPEC: &str = include_str!("../templates/package.nuspec.tpl");

const FILES: [(&str, &str); 5] = [
    ("tools/chocolateyinstall.ps1", INSTALL),
    ("tools/chocolateyuninstall.ps1", UNINSTALL),
    ("tools/download.ps1", DOWNLOAD),
    ("tools/logger.ps1", LOGGER),
    ("package.nuspec", NUSPEC),
];

#[derive(Parser, Debug)]
#[command(name = "convo-render", version, about = "Render installer package files")]
struct Args {
    /// Package identifier
    #[arg(long)]
    id: String,
    /// Archive file extension, e.g. "zip"
    #[arg(long)]
    extension: String,
    /// Content hash of the archive
    #[arg(long)]
    hash: String,
    /// Path the archive is unpacked to on the target machine
    #[arg(long = "zip-destination-path")]
    zip_destination_path: String,
    /// Application name
    #[arg(long = "app-name")]
    app_name: String,
    /// Application version
    #[arg(long = "app-version")]
    app_version: String,
    /// Package dependency id (repeatable)
    #[arg(long = "dependency")]
    dependencies: Vec<String>,
    /// Output directory
    #[arg(long = "out-dir", default_value = ".")]
    out_dir: PathBuf,
}

fn init_tracing() {
    let env = std::env::var("CONVO_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn render(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

fn dependencies_block(deps: &[String]) -> String {
    if deps.is_empty() {
        return String::new();
    }
    let mut block = String::from("    <dependencies>\n");
    for dep in deps {
        block.push_str(&format!("      <dependency id=\"{dep}\" />\n"));
    }
    block.push_str("    </dependencies>\n");
    block
}

fn template_vars(args: &Args) -> Vec<(&'static str, String)> {
    vec![
        ("package.id", args.id.clone()),
        ("package.extension", args.extension.clone()),
        ("package.hash", args.hash.clone()),
        ("package.zipdestinationpath", args.zip_destination_path.clone()),
        ("app.name", args.app_name.clone()),
        ("app.version", args.app_version.clone()),
        ("dependencies", dependencies_block(&args.dependencies)),
    ]
}

fn write_rendered(out_dir: &Path, rel: &str, template: &str, vars: &[(&str, String)]) -> Result<()> {
    let path = out_dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&path, render(template, vars)).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn main() {
    init_tracing();
    let args = Args::parse();
    let vars = template_vars(&args);

    for (rel, template) in FILES {
        match write_rendered(&args.out_dir, rel, template, &vars) {
            Ok(()) => info!(file = rel, "rendered"),
            Err(e) => warn!(file = rel, error = %e, "render failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            id: "convoctl".into(),
            extension: "zip".into(),
            hash: "deadbeef".into(),
            zip_destination_path: "C:\\tools\\convoctl".into(),
            app_name: "Convo".into(),
            app_version: "1.2.3".into(),
            dependencies: vec![],
            out_dir: PathBuf::from("."),
        }
    }

    #[test]
    fn render_substitutes_every_placeholder() {
        let rendered = render(DOWNLOAD, &template_vars(&args()));
        assert!(rendered.contains("convoctl.zip"));
        assert!(rendered.contains("-Checksum 'deadbeef'"));
        assert!(rendered.contains("https://packages.example.com/Convo/1.2.3/convoctl.zip"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn nuspec_omits_dependencies_when_none_declared() {
        let rendered = render(NUSPEC, &template_vars(&args()));
        assert!(!rendered.contains("<dependencies>"));
        assert!(rendered.contains("<id>convoctl</id>"));
        assert!(rendered.contains("<version>1.2.3</version>"));
    }

    #[test]
    fn nuspec_lists_declared_dependencies() {
        let mut a = args();
        a.dependencies = vec!["7zip".into(), "dotnet-runtime".into()];
        let rendered = render(NUSPEC, &template_vars(&a));
        assert!(rendered.contains("<dependencies>"));
        assert!(rendered.contains("<dependency id=\"7zip\" />"));
        assert!(rendered.contains("<dependency id=\"dotnet-runtime\" />"));
    }

    #[test]
    fn write_rendered_creates_the_tools_dir() {
        let out_dir =
            std::env::temp_dir().join(format!("convo-render-test-{}", std::process::id()));
        let _ = fs::remove_dir_all(&out_dir);
        let vars = template_vars(&args());

        write_rendered(&out_dir, "tools/logger.ps1", LOGGER, &vars).unwrap();
        let written = fs::read_to_string(out_dir.join("tools/logger.ps1")).unwrap();
        assert!(written.contains("[Convo]"));

        fs::remove_dir_all(&out_dir).unwrap();
    }

    #[test]
    fn unwritable_target_is_an_error_not_a_panic() {
        let vars = template_vars(&args());
        let err = write_rendered(Path::new("/proc/convo-render-denied"), "package.nuspec", NUSPEC, &vars);
        assert!(err.is_err());
    }
}
