//! `jrun info`: print the resolved view of a reference as JSON.
//!
//! Resolution of the source closure always happens; the classpath is only
//! resolved when asked for, so plain `info` works offline and without a
//! populated artifact repository.

use anyhow::Result;
use serde::Serialize;

use crate::cli::InfoArgs;
use crate::config::load_config_with_discovery;
use crate::deps::{LocalM2Resolver, MavenRepo};
use crate::source::Project;

use super::{cwd_context, jars_dir, make_resolver, parse_properties};

#[derive(Serialize)]
struct InfoOutput {
    reference: String,
    main_file: String,
    shell: bool,
    native_image: bool,
    sources: Vec<String>,
    dependencies: Vec<String>,
    repositories: Vec<MavenRepo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    java_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gav: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    main_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stable_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    jar_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    classpath: Option<Vec<String>>,
}

pub fn run(args: InfoArgs) -> Result<()> {
    let config = load_config_with_discovery(args.config.config.as_deref())?;
    let props = parse_properties(&args.properties)?;

    let mut resolver = make_resolver(&config)?;
    let ctx = cwd_context()?;
    let mut project = Project::for_resource(&mut resolver, &args.reference, &ctx, Some(&props))?;
    project.set_jars_dir(jars_dir(&config));

    let classpath = if args.classpath {
        let resolved = project.resolve_classpath(&LocalM2Resolver::from_home())?;
        Some(
            resolved
                .entries()
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        )
    } else {
        None
    };

    let stable_id = if project.source_set().is_empty() {
        None
    } else {
        Some(project.source_set().stable_id())
    };

    let output = InfoOutput {
        reference: args.reference,
        main_file: project.resource_ref().file.display().to_string(),
        shell: project.is_shell(),
        native_image: project.native_image(),
        sources: project
            .source_set()
            .sources()
            .iter()
            .map(|s| s.resource_ref().file.display().to_string())
            .collect(),
        dependencies: project.dependencies(),
        repositories: project.repositories().to_vec(),
        java_version: project.java_version().map(str::to_string),
        gav: project.gav().map(str::to_string),
        description: project.description().map(str::to_string),
        main_class: project.main_class().map(str::to_string),
        stable_id,
        jar_file: project.jar_file().map(|p| p.display().to_string()),
        classpath,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
