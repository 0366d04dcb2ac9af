// src/command/backend.rs

//! Per-backend image build commands.
//!
//! This is the only place that branches on [`BackendKind`]. A new backend is
//! a new enum arm in `types.rs` plus a new arm in [`BackendKind::build_step`].

use std::path::{Path, PathBuf};

use crate::config::model::{Rig, Settings};
use crate::errors::{Result, RigError};
use crate::fs::FileSystem;
use crate::types::BackendKind;

use super::template::{render, sanitize_for_file_name};
use super::{ArgumentVector, IMAGE_TAG, SettingsArtifact};

/// The build command for one rig plus the settings file it depends on.
#[derive(Debug, Clone)]
pub struct BuildStep {
    pub command: ArgumentVector,
    pub artifact: Option<SettingsArtifact>,
}

/// Map the rig's backend selector onto a known backend.
pub fn resolve_backend(rig: &Rig) -> Result<BackendKind> {
    rig.backend
        .parse::<BackendKind>()
        .map_err(|_| RigError::UnsupportedVariant {
            rig: rig.context.clone(),
            backend: rig.backend.clone(),
            expected: BackendKind::expected_list(),
        })
}

/// `<program> --context=<context>`, the prefix shared by every command.
pub fn base_args(settings: &Settings, rig: &Rig) -> Vec<String> {
    vec![settings.program.clone(), format!("--context={}", rig.context)]
}

impl BackendKind {
    /// Build the image-build command for `rig`.
    ///
    /// Reads the settings template for backends that need one; nothing is
    /// written here.
    pub fn build_step(
        self,
        rig: &Rig,
        settings: &Settings,
        fs: &dyn FileSystem,
    ) -> Result<BuildStep> {
        let mut args = base_args(settings, rig);
        args.push("build".to_string());
        args.push("--progress=plain".to_string());

        let artifact = match self {
            BackendKind::Rqminer => {
                args.push(format!("--build-arg=RQMINER_URL={}", rig.url));
                args.push(format!("--build-arg=THREAD_COUNT={}", rig.thread_count));
                args.push(format!("--build-arg=LABEL={}", rig.label));
                args.push(format!("--build-arg=PUBLIC_ID={}", rig.public_id));
                None
            }
            BackendKind::Xmrig => {
                let artifact = render_settings(rig, settings, fs)?;
                args.push(format!(
                    "--build-arg=SETTINGS_FILE={}",
                    build_arg_path(&settings.render_dir, &artifact_file_name(rig))
                ));
                args.push(format!("--build-arg=THREAD_COUNT={}", rig.thread_count));
                args.push(format!("--build-arg=LABEL={}", rig.label));
                Some(artifact)
            }
        };

        args.push(settings.build_context.display().to_string());
        args.push("-t".to_string());
        args.push(IMAGE_TAG.to_string());

        Ok(BuildStep {
            command: ArgumentVector::from_parts(args),
            artifact,
        })
    }
}

/// `xmrig-<context>.json`; one file per rig so concurrent renders never
/// collide.
pub fn artifact_file_name(rig: &Rig) -> String {
    format!("xmrig-{}.json", sanitize_for_file_name(&rig.context))
}

/// On-disk location of the rendered settings for `rig`.
pub fn artifact_path(rig: &Rig, settings: &Settings) -> PathBuf {
    settings
        .build_context
        .join(&settings.render_dir)
        .join(artifact_file_name(rig))
}

// Build args are resolved inside the build context, so they use the path
// relative to it with forward slashes.
fn build_arg_path(render_dir: &Path, file_name: &str) -> String {
    render_dir
        .join(file_name)
        .to_string_lossy()
        .replace('\\', "/")
}

fn render_settings(rig: &Rig, settings: &Settings, fs: &dyn FileSystem) -> Result<SettingsArtifact> {
    let path = artifact_path(rig, settings);
    let template_path = settings.build_context.join(&settings.template);

    let template = fs
        .read_to_string(&template_path)
        .map_err(|source| RigError::ArtifactWrite {
            rig: rig.context.clone(),
            path: path.clone(),
            source,
        })?;

    let contents = render(&template, rig);

    Ok(SettingsArtifact { path, contents })
}
