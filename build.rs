use anyhow::Result;
use chrono::TimeZone;
use std::env;
use std::fs;
use std::process::Command;

fn main() -> Result<()> {
    let now = match env::var("SOURCE_DATE_EPOCH") {
        Ok(val) => chrono::Utc
            .timestamp_opt(val.parse::<i64>()?, 0)
            .single()
            .ok_or_else(|| anyhow::anyhow!("SOURCE_DATE_EPOCH out of range: {val}"))?,
        Err(_) => chrono::Utc::now(),
    };

    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let mpstream_version = mpstream_version_from_metadata().unwrap_or_else(|_| {
        mpstream_version_fallback().unwrap_or_else(|_| "unknown".to_string())
    });
    println!("cargo:rustc-env=MPSTREAM_VERSION={mpstream_version}");

    println!("cargo:rerun-if-changed=mpstream/Cargo.toml");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    Ok(())
}

/// Library version from `cargo metadata`, local member or registry dependency.
fn mpstream_version_from_metadata() -> Result<String> {
    let output = Command::new(env::var("CARGO").unwrap_or_else(|_| "cargo".to_string()))
        .args(["metadata", "--format-version", "1", "--offline"])
        .output()?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed");
    }

    let metadata: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    metadata["packages"]
        .as_array()
        .into_iter()
        .flatten()
        .find(|package| package["name"].as_str() == Some("mpstream"))
        .and_then(|package| package["version"].as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("mpstream package not found in metadata"))
}

fn mpstream_version_fallback() -> Result<String> {
    let toml_content = fs::read_to_string("mpstream/Cargo.toml")?;

    toml_content
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("version") && line.contains('='))
        .and_then(|line| line.split_once('='))
        .map(|(_, version)| version.trim().trim_matches('"').to_string())
        .ok_or_else(|| anyhow::anyhow!("Could not find version in mpstream/Cargo.toml"))
}
