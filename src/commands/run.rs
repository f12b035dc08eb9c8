//! `jrun run`: resolve, build and execute a reference.

use anyhow::{Context, Result};
use std::process::Command;
use tracing::{debug, info};

use crate::cli::RunArgs;
use crate::config::load_config_with_discovery;
use crate::deps::LocalM2Resolver;
use crate::source::{
    command_line, select, Builder, CmdKind, ForceType, JavacBuilder, Project, RunContext,
};

use super::{cwd_context, jars_dir, make_resolver, parse_properties};

pub fn run(args: RunArgs) -> Result<i32> {
    let config = load_config_with_discovery(args.config.config.as_deref())?;
    let props = parse_properties(&args.properties)?;

    let mut resolver = make_resolver(&config)?;
    let ctx = cwd_context()?;
    let mut project = Project::for_resource(&mut resolver, &args.reference, &ctx, Some(&props))?;
    project.set_jars_dir(jars_dir(&config));
    project.add_dependencies(&args.deps);
    project.add_repositories(&args.repos);
    project.add_runtime_options(&args.java_options);
    if let Some(version) = &config.java_version {
        project.set_default_java_version(version);
    }
    for (key, value) in props.pairs() {
        project.set_property(key, value);
    }

    if args.force_jar && project.is_shell() {
        anyhow::bail!(
            "{} is a shell script and cannot run from a jar; drop --jar or rename it to a .java source",
            args.reference
        );
    }

    let run_ctx = RunContext {
        interactive: args.interactive,
        force_type: force_type(&args),
        args: args.args.clone(),
    };
    let kind = select(&project, &run_ctx);
    debug!(?kind, reference = %args.reference, "execution kind selected");

    let dep_resolver = LocalM2Resolver::from_home();
    let classpath = project.resolve_classpath(&dep_resolver)?;

    if !args.dry_run && kind == CmdKind::Jar && project.prebuilt_jar().is_none() {
        JavacBuilder.build(&project, &classpath)?;
    }

    let argv = command_line(&project, &run_ctx, kind, &classpath);
    if args.dry_run {
        println!("{}", argv.join(" "));
        return Ok(0);
    }

    info!(program = %argv[0], "launching");
    let status = Command::new(&argv[0])
        .args(&argv[1..])
        .status()
        .with_context(|| format!("failed to launch {}", argv[0]))?;
    Ok(status.code().unwrap_or(1))
}

fn force_type(args: &RunArgs) -> Option<ForceType> {
    if args.jsh {
        Some(ForceType::Shell)
    } else if args.force_jar {
        Some(ForceType::Jar)
    } else {
        None
    }
}
