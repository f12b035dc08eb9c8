//! Turns a source-backed project into its content-addressed jar.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::deps::Classpath;
use crate::error::{Error, Result};

use super::project::Project;

/// Produces the runnable jar for a project.
pub trait Builder: Send + Sync {
    fn build(&self, project: &Project, classpath: &Classpath) -> Result<PathBuf>;
}

/// Shells out to `javac` and `jar`. The jar lands in its content-addressed
/// cache slot, so an existing jar means the same inputs were already built
/// and the whole step is skipped.
#[derive(Debug, Default)]
pub struct JavacBuilder;

impl Builder for JavacBuilder {
    fn build(&self, project: &Project, classpath: &Classpath) -> Result<PathBuf> {
        if let Some(jar) = project.prebuilt_jar() {
            return Ok(jar.to_path_buf());
        }
        let jar = project
            .jar_file()
            .ok_or_else(|| Error::Build("project has no jar target".to_string()))?;
        if jar.is_file() {
            debug!(jar = %jar.display(), "jar cache hit");
            return Ok(jar);
        }

        let parent = jar
            .parent()
            .ok_or_else(|| Error::Build("jar target has no parent directory".to_string()))?;
        fs::create_dir_all(parent)?;
        // Scratch space beside the target so the final rename stays on one
        // filesystem.
        let work = parent.join(format!(".build.{}", std::process::id()));
        fs::create_dir_all(&work)?;
        let classes = work.join("classes");
        fs::create_dir_all(&classes)?;

        let result = compile(project, classpath, &classes)
            .and_then(|_| package(project, &classes, &work, &jar));
        let _ = fs::remove_dir_all(&work);
        result?;

        info!(jar = %jar.display(), "built");
        Ok(jar)
    }
}

fn compile(project: &Project, classpath: &Classpath, classes: &Path) -> Result<()> {
    let mut cmd = Command::new("javac");
    cmd.args(project.compile_options());
    if let Some(version) = project.java_version() {
        cmd.arg("--release").arg(version.trim_end_matches('+'));
    }
    if !classpath.is_empty() {
        cmd.arg("-cp").arg(classpath.as_arg());
    }
    cmd.arg("-d").arg(classes);
    for source in project.source_set().sources() {
        cmd.arg(&source.resource_ref().file);
    }

    debug!(?cmd, "compiling");
    run(cmd, "javac")
}

fn package(project: &Project, classes: &Path, work: &Path, jar: &Path) -> Result<()> {
    let staged = work.join("out.jar");

    let mut cmd = Command::new("jar");
    cmd.arg("--create").arg("--file").arg(&staged);
    if let Some(main_class) = project.main_class() {
        cmd.arg("--main-class").arg(main_class);
    }
    if !project.manifest_attributes().is_empty() {
        let manifest = work.join("MANIFEST.MF");
        let mut body = String::new();
        for (key, value) in project.manifest_attributes() {
            body.push_str(&format!("{key}: {value}\n"));
        }
        fs::write(&manifest, body)?;
        cmd.arg("--manifest").arg(&manifest);
    }
    cmd.arg("-C").arg(classes).arg(".");

    debug!(?cmd, "packaging");
    run(cmd, "jar")?;

    // Publish atomically so a concurrent run never sees a partial jar.
    fs::rename(&staged, jar)?;
    Ok(())
}

fn run(mut cmd: Command, what: &str) -> Result<()> {
    let output = cmd
        .output()
        .map_err(|e| Error::Build(format!("could not launch {what}: {e}")))?;
    if !output.status.success() {
        return Err(Error::Build(format!(
            "{what} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}
