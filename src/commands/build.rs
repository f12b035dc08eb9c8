//! `jrun build`: resolve and build without running.

use anyhow::Result;

use crate::cli::BuildArgs;
use crate::config::load_config_with_discovery;
use crate::deps::LocalM2Resolver;
use crate::source::{Builder, JavacBuilder, Project};

use super::{cwd_context, jars_dir, make_resolver, parse_properties};

pub fn run(args: BuildArgs) -> Result<()> {
    let config = load_config_with_discovery(args.config.config.as_deref())?;
    let props = parse_properties(&args.properties)?;

    let mut resolver = make_resolver(&config)?;
    let ctx = cwd_context()?;
    let mut project = Project::for_resource(&mut resolver, &args.reference, &ctx, Some(&props))?;
    project.set_jars_dir(jars_dir(&config));
    if let Some(version) = &config.java_version {
        project.set_default_java_version(version);
    }

    if project.is_shell() {
        println!("{} runs in a shell session, nothing to build", args.reference);
        return Ok(());
    }

    let dep_resolver = LocalM2Resolver::from_home();
    let classpath = project.resolve_classpath(&dep_resolver)?;
    let jar = JavacBuilder.build(&project, &classpath)?;
    println!("{}", jar.display());
    Ok(())
}
