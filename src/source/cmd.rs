//! Picks how a project runs and assembles the launch command line.

use crate::deps::Classpath;

use super::project::Project;

/// How a project is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmdKind {
    /// Compile to a jar, run with the `java` launcher.
    Jar,
    /// Feed sources into an interactive `jshell` session.
    InteractiveShell,
}

/// Caller-forced execution kind, overriding what the sources suggest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceType {
    Jar,
    Shell,
}

/// Per-invocation run parameters.
#[derive(Debug, Default)]
pub struct RunContext {
    pub interactive: bool,
    pub force_type: Option<ForceType>,
    pub args: Vec<String>,
}

/// Pick the execution kind for `project` under `ctx`.
///
/// A forced kind or interactive session always wins, but only projects with
/// an actual main source can go to a shell, and only compilable sources can
/// be forced into a jar: shell scripts have no jar to build, so a jar force
/// leaves them in the shell. Jar-backed projects stay jars.
pub fn select(project: &Project, ctx: &RunContext) -> CmdKind {
    if project.main_source().is_none() {
        return CmdKind::Jar;
    }
    match ctx.force_type {
        Some(ForceType::Shell) => return CmdKind::InteractiveShell,
        Some(ForceType::Jar) if !project.is_shell() => return CmdKind::Jar,
        _ => {}
    }
    if ctx.interactive || project.is_shell() {
        CmdKind::InteractiveShell
    } else {
        CmdKind::Jar
    }
}

/// Assemble the argv for running `project` as `kind`.
pub fn command_line(
    project: &Project,
    ctx: &RunContext,
    kind: CmdKind,
    classpath: &Classpath,
) -> Vec<String> {
    match kind {
        CmdKind::Jar => jar_command_line(project, ctx, classpath),
        CmdKind::InteractiveShell => shell_command_line(project, ctx, classpath),
    }
}

fn jar_command_line(project: &Project, ctx: &RunContext, classpath: &Classpath) -> Vec<String> {
    let mut argv = vec!["java".to_string()];
    argv.extend(project.runtime_options().iter().cloned());
    for (key, value) in project.properties() {
        argv.push(format!("-D{key}={value}"));
    }
    if project.enable_cds() {
        if let Some(jar) = project.jar_file() {
            argv.push(format!(
                "-XX:SharedArchiveFile={}",
                jar.with_extension("jsa").display()
            ));
        }
    }

    let full_cp = match project.jar_file() {
        Some(jar) => classpath.with_entry(jar),
        None => classpath.clone(),
    };
    if !full_cp.is_empty() {
        argv.push("-cp".to_string());
        argv.push(full_cp.as_arg());
    }

    if let Some(main_class) = project.main_class() {
        argv.push(main_class.to_string());
    } else if let Some(jar) = project.prebuilt_jar() {
        // No known entry point: defer to the jar's own manifest.
        let cp_pos = argv.iter().position(|a| a == "-cp");
        if let Some(pos) = cp_pos {
            argv.drain(pos..pos + 2);
        }
        argv.push("-jar".to_string());
        argv.push(jar.display().to_string());
    }

    argv.extend(ctx.args.iter().cloned());
    argv
}

fn shell_command_line(project: &Project, ctx: &RunContext, classpath: &Classpath) -> Vec<String> {
    let mut argv = vec!["jshell".to_string()];
    if !classpath.is_empty() {
        argv.push("--class-path".to_string());
        argv.push(classpath.as_arg());
    }
    // jshell takes runtime options prefixed for the remote VM.
    for opt in project.runtime_options() {
        argv.push(format!("-R{opt}"));
    }
    for (key, value) in project.properties() {
        argv.push(format!("-R-D{key}={value}"));
    }
    for source in project.source_set().sources() {
        argv.push(source.resource_ref().file.display().to_string());
    }
    argv.extend(ctx.args.iter().cloned());
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{ResolveContext, Resolver, UrlCache};
    use crate::resolver::trust::TrustAll;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    struct NoFetch;
    impl crate::resolver::Fetcher for NoFetch {
        fn fetch(&self, url: &str) -> crate::error::Result<crate::resolver::RemoteContent> {
            Err(crate::error::Error::FetchFailure {
                url: url.to_string(),
                reason: "offline".to_string(),
            })
        }
    }

    fn project_for(dir: &std::path::Path, name: &str) -> Project {
        let mut r = Resolver::new(
            Box::new(TrustAll),
            Box::new(NoFetch),
            UrlCache::new(dir.join("urls")),
            Duration::from_secs(3600),
        );
        let ctx = ResolveContext::Dir(dir.to_path_buf());
        Project::for_resource(&mut r, name, &ctx, None).unwrap()
    }

    #[test]
    fn test_default_is_jar() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Main.java"), "public class Main {}\n").unwrap();
        let project = project_for(temp.path(), "Main.java");
        assert_eq!(select(&project, &RunContext::default()), CmdKind::Jar);
    }

    #[test]
    fn test_shell_extension_selects_shell() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("s.jsh"), "1 + 1\n").unwrap();
        let project = project_for(temp.path(), "s.jsh");
        assert_eq!(
            select(&project, &RunContext::default()),
            CmdKind::InteractiveShell
        );
    }

    #[test]
    fn test_interactive_flag_wins_over_java_source() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Main.java"), "public class Main {}\n").unwrap();
        let project = project_for(temp.path(), "Main.java");
        let ctx = RunContext {
            interactive: true,
            ..Default::default()
        };
        assert_eq!(select(&project, &ctx), CmdKind::InteractiveShell);
    }

    #[test]
    fn test_forced_jar_wins_over_interactive_flag() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Main.java"), "public class Main {}\n").unwrap();
        let project = project_for(temp.path(), "Main.java");
        let ctx = RunContext {
            interactive: true,
            force_type: Some(ForceType::Jar),
            ..Default::default()
        };
        assert_eq!(select(&project, &ctx), CmdKind::Jar);
    }

    #[test]
    fn test_forced_jar_does_not_apply_to_shell_script() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("s.jsh"), "1 + 1\n").unwrap();
        let project = project_for(temp.path(), "s.jsh");
        let ctx = RunContext {
            force_type: Some(ForceType::Jar),
            ..Default::default()
        };
        // A shell script has no jar target to force into, so it stays in
        // the shell and the command line is a complete jshell invocation.
        let kind = select(&project, &ctx);
        assert_eq!(kind, CmdKind::InteractiveShell);

        let argv = command_line(&project, &ctx, kind, &Classpath::default());
        assert_eq!(argv[0], "jshell");
        assert!(argv.iter().any(|a| a.ends_with("s.jsh")));
    }

    #[test]
    fn test_prebuilt_jar_never_goes_to_shell() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("app.jar"), b"PK").unwrap();
        let project = project_for(temp.path(), "app.jar");
        let ctx = RunContext {
            interactive: true,
            force_type: Some(ForceType::Shell),
            ..Default::default()
        };
        assert_eq!(select(&project, &ctx), CmdKind::Jar);
    }

    #[test]
    fn test_jar_command_line_shape() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("Main.java"),
            "//JAVA_OPTIONS -Xmx256m\npublic class Main {}\n",
        )
        .unwrap();
        let project = project_for(temp.path(), "Main.java");
        let ctx = RunContext {
            args: vec!["--verbose".to_string()],
            ..Default::default()
        };
        let argv = command_line(&project, &ctx, CmdKind::Jar, &Classpath::default());

        assert_eq!(argv[0], "java");
        assert_eq!(argv[1], "-Xmx256m");
        assert_eq!(argv[2], "-cp");
        assert!(argv[3].ends_with(".jar"));
        assert_eq!(argv[4], "Main");
        assert_eq!(argv[5], "--verbose");
    }

    #[test]
    fn test_shell_command_line_shape() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("s.jsh"),
            "//JAVA_OPTIONS -Xmx64m\nSystem.out.println(1)\n",
        )
        .unwrap();
        let project = project_for(temp.path(), "s.jsh");
        let cp = Classpath::new(vec!["/m2/a.jar".into()]);
        let argv = command_line(&project, &RunContext::default(), CmdKind::InteractiveShell, &cp);

        assert_eq!(argv[0], "jshell");
        assert_eq!(argv[1], "--class-path");
        assert_eq!(argv[2], "/m2/a.jar");
        assert_eq!(argv[3], "-R-Xmx64m");
        assert!(argv[4].ends_with("s.jsh"));
    }

    #[test]
    fn test_prebuilt_jar_runs_via_manifest() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("app.jar"), b"PK").unwrap();
        let project = project_for(temp.path(), "app.jar");
        let argv = command_line(
            &project,
            &RunContext::default(),
            CmdKind::Jar,
            &Classpath::default(),
        );

        assert_eq!(argv[0], "java");
        assert_eq!(argv[1], "-jar");
        assert!(argv[2].ends_with("app.jar"));
    }
}
