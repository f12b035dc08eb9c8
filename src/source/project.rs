//! Aggregated, runnable view of a resolved source closure.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::deps::{merge_repos, Classpath, DependencyResolver, MavenRepo};
use crate::error::Result;
use crate::resolver::{ResolveContext, Resolver, ResourceRef};
use crate::xdg;

use super::directives::PropertySource;
use super::source::Source;
use super::source_set::SourceSet;

pub const ATTR_AGENT_CLASS: &str = "Agent-Class";
pub const ATTR_PREMAIN_CLASS: &str = "Premain-Class";

/// Everything needed to build and run one unit of code: the source closure,
/// aggregated directives, and lazily-resolved classpath.
#[derive(Debug)]
pub struct Project {
    resource_ref: ResourceRef,
    main_source: Option<Source>,
    main_source_set: SourceSet,
    repositories: Vec<MavenRepo>,
    compile_options: Vec<String>,
    runtime_options: Vec<String>,
    properties: BTreeMap<String, String>,
    manifest_attributes: BTreeMap<String, String>,
    java_version: Option<String>,
    description: Option<String>,
    gav: Option<String>,
    main_class: Option<String>,
    enable_cds: bool,
    native_image: bool,
    prebuilt_jar: Option<PathBuf>,
    extra_dependencies: Vec<String>,
    jars_dir: PathBuf,
    // Cached classpath keyed by a digest of the inputs that produced it.
    classpath: Option<(String, Classpath)>,
}

impl Project {
    /// A project backed by an existing jar: runnable as-is, nothing to
    /// discover or compile.
    pub fn from_jar(resource_ref: ResourceRef) -> Self {
        let jar = resource_ref.file.clone();
        Self {
            resource_ref,
            main_source: None,
            main_source_set: SourceSet::empty(),
            repositories: Vec::new(),
            compile_options: Vec::new(),
            runtime_options: Vec::new(),
            properties: BTreeMap::new(),
            manifest_attributes: BTreeMap::new(),
            java_version: None,
            description: None,
            gav: None,
            main_class: None,
            enable_cds: false,
            native_image: false,
            prebuilt_jar: Some(jar),
            extra_dependencies: Vec::new(),
            jars_dir: xdg::jars_cache_dir(),
            classpath: None,
        }
    }

    /// Resolve `reference` and build the full project around it.
    pub fn for_resource(
        resolver: &mut Resolver,
        reference: &str,
        ctx: &ResolveContext,
        props: Option<&dyn PropertySource>,
    ) -> Result<Project> {
        let rref = resolver.resolve(reference, ctx)?;
        if rref
            .file
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"))
        {
            debug!(reference, "jar-backed project");
            return Ok(Project::from_jar(rref));
        }

        let main = Source::read(rref.clone(), props)?;
        let set = SourceSet::discover(main.clone(), resolver, props)?;
        Ok(Project::from_sources(rref, main, set))
    }

    fn from_sources(resource_ref: ResourceRef, main: Source, set: SourceSet) -> Self {
        let repositories = merge_repos(&[], set.repositories());

        // Scalar directives: first occurrence across the closure wins, and
        // the main source is first in closure order.
        let mut java_version = None;
        let mut gav = None;
        let mut description = None;
        let mut compile_options: Vec<String> = Vec::new();
        let mut runtime_options: Vec<String> = Vec::new();
        let mut enable_cds = false;
        for source in set.sources() {
            if java_version.is_none() {
                java_version = source.java_version().map(str::to_string);
            }
            if gav.is_none() {
                gav = source.gav().map(str::to_string);
            }
            if description.is_none() {
                description = source.description().map(str::to_string);
            }
            for opt in source.compile_options() {
                if !compile_options.contains(opt) {
                    compile_options.push(opt.clone());
                }
            }
            for opt in source.runtime_options() {
                if !runtime_options.contains(opt) {
                    runtime_options.push(opt.clone());
                }
            }
            enable_cds |= source.enable_cds();
        }

        let mut manifest_attributes = BTreeMap::new();
        if let Some(agent) = main.agent_main_class() {
            manifest_attributes.insert(ATTR_AGENT_CLASS.to_string(), agent.to_string());
        }
        if let Some(premain) = main.premain_class() {
            manifest_attributes.insert(ATTR_PREMAIN_CLASS.to_string(), premain.to_string());
        }

        let main_class = main.class_name();

        Self {
            resource_ref,
            main_source: Some(main),
            main_source_set: set,
            repositories,
            compile_options,
            runtime_options,
            properties: BTreeMap::new(),
            manifest_attributes,
            java_version,
            description,
            gav,
            main_class,
            enable_cds,
            native_image: false,
            prebuilt_jar: None,
            extra_dependencies: Vec::new(),
            jars_dir: xdg::jars_cache_dir(),
            classpath: None,
        }
    }

    pub fn resource_ref(&self) -> &ResourceRef {
        &self.resource_ref
    }

    pub fn main_source(&self) -> Option<&Source> {
        self.main_source.as_ref()
    }

    pub fn source_set(&self) -> &SourceSet {
        &self.main_source_set
    }

    pub fn repositories(&self) -> &[MavenRepo] {
        &self.repositories
    }

    /// Declared plus caller-supplied dependency coordinates.
    pub fn dependencies(&self) -> Vec<String> {
        let mut deps = self.main_source_set.dependencies().to_vec();
        for dep in &self.extra_dependencies {
            if !deps.contains(dep) {
                deps.push(dep.clone());
            }
        }
        deps
    }

    pub fn compile_options(&self) -> &[String] {
        &self.compile_options
    }

    pub fn runtime_options(&self) -> &[String] {
        &self.runtime_options
    }

    pub fn java_version(&self) -> Option<&str> {
        self.java_version.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn gav(&self) -> Option<&str> {
        self.gav.as_deref()
    }

    pub fn main_class(&self) -> Option<&str> {
        self.main_class.as_deref()
    }

    pub fn set_main_class(&mut self, class: impl Into<String>) {
        self.main_class = Some(class.into());
    }

    pub fn enable_cds(&self) -> bool {
        self.enable_cds
    }

    /// Whether this project is marked for a native-image toolchain rather
    /// than the regular `java` launcher. Off by default; callers opt in.
    pub fn native_image(&self) -> bool {
        self.native_image
    }

    pub fn set_native_image(&mut self, enabled: bool) {
        self.native_image = enabled;
    }

    pub fn manifest_attributes(&self) -> &BTreeMap<String, String> {
        &self.manifest_attributes
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// True when the main unit runs in an interactive shell rather than
    /// from a jar.
    pub fn is_shell(&self) -> bool {
        self.main_source.as_ref().is_some_and(Source::is_shell)
    }

    /// Where this project's runnable jar lives, if it has one.
    ///
    /// Pre-built projects return their backing jar. Source-backed projects
    /// get a content-addressed slot in the jar cache so that unchanged
    /// inputs rebuild nothing; shell-destined projects have no jar at all.
    pub fn jar_file(&self) -> Option<PathBuf> {
        if let Some(jar) = &self.prebuilt_jar {
            return Some(jar.clone());
        }
        if self.is_shell() || self.main_source.is_none() {
            return None;
        }
        let stem = self
            .resource_ref
            .file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unit".to_string());
        Some(
            self.jars_dir
                .join(format!("{stem}.{}.jar", self.main_source_set.stable_id())),
        )
    }

    /// Redirect where built jars land, for a configured cache location.
    pub fn set_jars_dir(&mut self, dir: PathBuf) {
        self.jars_dir = dir;
    }

    /// Caller-supplied dependencies, resolved alongside declared ones.
    pub fn add_dependencies(&mut self, deps: &[String]) {
        for dep in deps {
            if !self.extra_dependencies.contains(dep) {
                self.extra_dependencies.push(dep.clone());
            }
        }
    }

    /// Caller-supplied repository tokens, merged after declared ones.
    pub fn add_repositories(&mut self, tokens: &[String]) {
        self.repositories = merge_repos(&self.repositories, tokens);
    }

    pub fn add_runtime_options(&mut self, options: &[String]) {
        for opt in options {
            if !self.runtime_options.contains(opt) {
                self.runtime_options.push(opt.clone());
            }
        }
    }

    /// Fall back to `version` when no source declared one.
    pub fn set_default_java_version(&mut self, version: &str) {
        if self.java_version.is_none() {
            self.java_version = Some(version.to_string());
        }
    }

    pub fn prebuilt_jar(&self) -> Option<&Path> {
        self.prebuilt_jar.as_deref()
    }

    /// Resolve the classpath at most once per distinct (repositories,
    /// dependencies) input. A second call with unchanged inputs returns the
    /// cached result without touching the resolver.
    pub fn resolve_classpath(
        &mut self,
        resolver: &dyn DependencyResolver,
    ) -> Result<Classpath> {
        let deps = self.dependencies();
        let key = classpath_key(&self.repositories, &deps);

        if let Some((cached_key, cached)) = &self.classpath {
            if *cached_key == key {
                return Ok(cached.clone());
            }
        }

        debug!(dependencies = deps.len(), "resolving classpath");
        let classpath = resolver.resolve(&self.repositories, &deps)?;
        self.classpath = Some((key, classpath.clone()));
        Ok(classpath)
    }
}

fn classpath_key(repos: &[MavenRepo], deps: &[String]) -> String {
    let mut hasher = Sha256::new();
    for repo in repos {
        hasher.update(repo.id.as_bytes());
        hasher.update([0u8]);
        hasher.update(repo.url.as_bytes());
        hasher.update([0u8]);
    }
    for dep in deps {
        hasher.update(dep.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::trust::TrustAll;
    use crate::resolver::UrlCache;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct NoFetch;
    impl crate::resolver::Fetcher for NoFetch {
        fn fetch(&self, url: &str) -> Result<crate::resolver::RemoteContent> {
            Err(crate::error::Error::FetchFailure {
                url: url.to_string(),
                reason: "offline".to_string(),
            })
        }
    }

    struct CountingResolver {
        calls: Arc<AtomicUsize>,
    }
    impl DependencyResolver for CountingResolver {
        fn resolve(&self, _repos: &[MavenRepo], deps: &[String]) -> Result<Classpath> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Classpath::new(
                deps.iter().map(|d| PathBuf::from(format!("/m2/{d}.jar"))).collect(),
            ))
        }
    }

    fn resolver(root: &Path) -> Resolver {
        Resolver::new(
            Box::new(TrustAll),
            Box::new(NoFetch),
            UrlCache::new(root.join("urls")),
            Duration::from_secs(3600),
        )
    }

    fn project_for(dir: &Path, name: &str) -> Project {
        let mut r = resolver(dir);
        let ctx = ResolveContext::Dir(dir.to_path_buf());
        Project::for_resource(&mut r, name, &ctx, None).unwrap()
    }

    #[test]
    fn test_aggregates_directives_from_main() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("Main.java"),
            "//JAVA 17\n\
             //GAV org.example:demo\n\
             //DEPS info.picocli:picocli:4.6.3\n\
             //REPOS central\n\
             //JAVA_OPTIONS -Xmx256m\n\
             //JAVAC_OPTIONS -g\n\
             //DESCRIPTION a demo\n\
             public class Main {}\n",
        )
        .unwrap();

        let project = project_for(temp.path(), "Main.java");
        assert_eq!(project.java_version(), Some("17"));
        assert_eq!(project.gav(), Some("org.example:demo"));
        assert_eq!(project.description(), Some("a demo"));
        assert_eq!(project.main_class(), Some("Main"));
        assert_eq!(project.runtime_options(), ["-Xmx256m"]);
        assert_eq!(project.compile_options(), ["-g"]);
        assert_eq!(project.repositories()[0].id, "central");
        assert!(!project.is_shell());
    }

    #[test]
    fn test_jar_reference_builds_prebuilt_project() {
        let temp = TempDir::new().unwrap();
        let jar = temp.path().join("app.jar");
        fs::write(&jar, b"PK").unwrap();

        let project = project_for(temp.path(), "app.jar");
        let prebuilt = project.prebuilt_jar().unwrap().to_path_buf();
        assert_eq!(prebuilt.file_name().unwrap(), "app.jar");
        assert_eq!(project.jar_file(), Some(prebuilt));
        assert!(project.source_set().is_empty());
        assert!(project.main_source().is_none());
    }

    #[test]
    fn test_shell_project_has_no_jar() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("script.jsh"), "System.out.println(1)\n").unwrap();

        let project = project_for(temp.path(), "script.jsh");
        assert!(project.is_shell());
        assert_eq!(project.jar_file(), None);
    }

    // Jar paths derive from the XDG cache dir; serialize against the tests
    // that mutate the XDG environment variables.
    #[test]
    #[serial_test::serial(xdg_env)]
    fn test_jar_file_is_content_addressed() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Main.java"), "public class Main {}\n").unwrap();

        let a = project_for(temp.path(), "Main.java").jar_file().unwrap();
        let b = project_for(temp.path(), "Main.java").jar_file().unwrap();
        assert_eq!(a, b);

        fs::write(temp.path().join("Main.java"), "public class Main { int x; }\n").unwrap();
        let c = project_for(temp.path(), "Main.java").jar_file().unwrap();
        assert_ne!(a, c);
        assert!(c.file_name().unwrap().to_string_lossy().starts_with("Main."));
    }

    #[test]
    fn test_native_image_flag_is_off_until_requested() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Main.java"), "public class Main {}\n").unwrap();

        let mut project = project_for(temp.path(), "Main.java");
        assert!(!project.native_image());
        project.set_native_image(true);
        assert!(project.native_image());
    }

    #[test]
    fn test_classpath_resolved_at_most_once_per_inputs() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("Main.java"),
            "//DEPS a:b:1\npublic class Main {}\n",
        )
        .unwrap();

        let mut project = project_for(temp.path(), "Main.java");
        let calls = Arc::new(AtomicUsize::new(0));
        let dep_resolver = CountingResolver {
            calls: Arc::clone(&calls),
        };

        let first = project.resolve_classpath(&dep_resolver).unwrap();
        let second = project.resolve_classpath(&dep_resolver).unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_agent_sources_populate_manifest_attributes() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("Agent.java"),
            "import java.lang.instrument.Instrumentation;\n\
             public class Agent {\n\
               public static void premain(String args, Instrumentation inst) {}\n\
               public static void agentmain(String args, Instrumentation inst) {}\n\
             }\n",
        )
        .unwrap();

        let project = project_for(temp.path(), "Agent.java");
        assert_eq!(
            project.manifest_attributes().get(ATTR_PREMAIN_CLASS),
            Some(&"Agent".to_string())
        );
        assert_eq!(
            project.manifest_attributes().get(ATTR_AGENT_CLASS),
            Some(&"Agent".to_string())
        );
    }

    #[test]
    fn test_directive_union_across_included_sources() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("Main.java"),
            "//SOURCES Other.java\n//JAVAC_OPTIONS -g\npublic class Main {}\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("Other.java"),
            "//JAVA 11\n//JAVAC_OPTIONS -g -verbose\nclass Other {}\n",
        )
        .unwrap();

        let project = project_for(temp.path(), "Main.java");
        // Scalars fall back to the first included source that sets them.
        assert_eq!(project.java_version(), Some("11"));
        assert_eq!(project.compile_options(), ["-g", "-verbose"]);
    }
}
