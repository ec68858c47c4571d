mod scene;

use std::{env, fs};

use anyhow::{Context as _, Result, bail};
use tracing::debug;

use crate::scene::Scene;

const USAGE: &str = "usage: manos-nestable-story <scene.json>";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "manos_nestable=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = env::args().nth(1) else {
        bail!(USAGE);
    };
    let text = fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;
    let scene = Scene::from_json(&text).with_context(|| format!("failed to load {path}"))?;
    debug!(%path, steps = scene.steps.len(), "scene loaded");

    for frame in scene.replay()? {
        println!("{frame}");
    }
    Ok(())
}
