//! One parsed source file.
//!
//! A `Source` is immutable once constructed; re-parsing produces a new one.
//! Directive extraction is order-preserving relative to first occurrence and
//! a later duplicate tag value appends rather than replaces.

use std::path::Path;

use crate::error::Result;
use crate::resolver::ResourceRef;

use super::directives::{scan, substitute, Directive, PropertySource};

#[derive(Debug, Clone)]
pub struct Source {
    resource_ref: ResourceRef,
    text: String,
    dependencies: Vec<String>,
    repositories: Vec<String>,
    compile_options: Vec<String>,
    runtime_options: Vec<String>,
    java_version: Option<String>,
    gav: Option<String>,
    description: Option<String>,
    agent_main_class: Option<String>,
    premain_class: Option<String>,
    cds: bool,
    sources: Vec<String>,
}

impl Source {
    /// Parse `text` into a Source.
    ///
    /// `props` is the pluggable substitution function for `${…}` placeholders
    /// in dependency coordinates; when absent, placeholders pass through
    /// verbatim.
    pub fn parse(
        resource_ref: ResourceRef,
        text: String,
        props: Option<&dyn PropertySource>,
    ) -> Result<Source> {
        let tags = scan(&text, &resource_ref.original)?;

        let mut source = Source {
            resource_ref,
            text,
            dependencies: Vec::new(),
            repositories: Vec::new(),
            compile_options: Vec::new(),
            runtime_options: Vec::new(),
            java_version: None,
            gav: None,
            description: None,
            agent_main_class: None,
            premain_class: None,
            cds: false,
            sources: Vec::new(),
        };

        for tagged in tags {
            match tagged.directive {
                Directive::Deps(coords) => {
                    for coord in coords {
                        let coord = match props {
                            Some(p) => substitute(&coord, p)?,
                            None => coord,
                        };
                        if !source.dependencies.contains(&coord) {
                            source.dependencies.push(coord);
                        }
                    }
                }
                Directive::Repos(tokens) => source.repositories.extend(tokens),
                Directive::CompileOptions(opts) => source.compile_options.extend(opts),
                Directive::RuntimeOptions(opts) => source.runtime_options.extend(opts),
                Directive::JavaVersion(v) => {
                    source.java_version.get_or_insert(v);
                }
                Directive::Gav(gav) => {
                    source.gav.get_or_insert(gav);
                }
                Directive::Description(text) => match &mut source.description {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(&text);
                    }
                    None => source.description = Some(text),
                },
                Directive::Cds => source.cds = true,
                Directive::Sources(refs) => source.sources.extend(refs),
            }
        }

        // Agent entry points: a premain/agentmain method makes this source's
        // declared class the premain/agent class.
        if let Some(class) = source.class_name() {
            if source.text.contains("premain(") {
                source.premain_class = Some(class.clone());
            }
            if source.text.contains("agentmain(") {
                source.agent_main_class = Some(class);
            }
        }

        Ok(source)
    }

    /// Read and parse a file as a Source.
    pub fn read(resource_ref: ResourceRef, props: Option<&dyn PropertySource>) -> Result<Source> {
        let text = std::fs::read_to_string(&resource_ref.file)?;
        Source::parse(resource_ref, text, props)
    }

    pub fn resource_ref(&self) -> &ResourceRef {
        &self.resource_ref
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn repositories(&self) -> &[String] {
        &self.repositories
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

    pub fn gav(&self) -> Option<&str> {
        self.gav.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn agent_main_class(&self) -> Option<&str> {
        self.agent_main_class.as_deref()
    }

    pub fn premain_class(&self) -> Option<&str> {
        self.premain_class.as_deref()
    }

    pub fn enable_cds(&self) -> bool {
        self.cds
    }

    /// Raw, pre-resolution inclusion references, in file order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Whether this source requests interactive-shell execution by file type.
    pub fn is_shell(&self) -> bool {
        Path::new(&self.resource_ref.file)
            .extension()
            .map(|e| e == "jsh")
            .unwrap_or(false)
    }

    /// The first declared type name in the text, used for main-class
    /// inference and agent class naming.
    pub fn class_name(&self) -> Option<String> {
        for line in self.text.lines() {
            let line = line.trim_start();
            if line.starts_with("//") {
                continue;
            }
            for keyword in ["class ", "interface ", "enum ", "record "] {
                if let Some(idx) = line.find(keyword) {
                    // Keyword must start a word (avoid matching ".class " etc).
                    if idx > 0 {
                        let prev = line.as_bytes()[idx - 1];
                        if !prev.is_ascii_whitespace() {
                            continue;
                        }
                    }
                    let after = &line[idx + keyword.len()..];
                    let name: String = after
                        .chars()
                        .take_while(|c| c.is_alphanumeric() || *c == '_')
                        .collect();
                    if !name.is_empty() {
                        return Some(name);
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const EXAMPLE: &str = "\
//#!/usr/bin/env jrun

//DEPS com.offbytwo:docopt:0.6.0.20150202,log4j:log4j:${log4j.version:1.2.14}

//JAVA_OPTIONS --enable-preview \"-Dvalue='this is space'\"
//JAVAC_OPTIONS --enable-preview
//JAVAC_OPTIONS --verbose
//GAV org.example:classpath
class classpath_example {
}";

    fn parse(text: &str, props: Option<&dyn PropertySource>) -> Source {
        Source::parse(ResourceRef::for_file("example.java"), text.to_string(), props).unwrap()
    }

    #[test]
    fn test_find_dependencies() {
        let props: HashMap<String, String> = HashMap::new();
        let src = parse(EXAMPLE, Some(&props));

        assert_eq!(src.dependencies().len(), 2);
        assert!(src
            .dependencies()
            .contains(&"com.offbytwo:docopt:0.6.0.20150202".to_string()));
        assert!(src.dependencies().contains(&"log4j:log4j:1.2.14".to_string()));
    }

    #[test]
    fn test_find_dependencies_with_property() {
        let mut props = HashMap::new();
        props.insert("log4j.version".to_string(), "1.2.9".to_string());
        let src = parse(EXAMPLE, Some(&props));

        assert_eq!(src.dependencies().len(), 2);
        assert!(src.dependencies().contains(&"log4j:log4j:1.2.9".to_string()));
    }

    #[test]
    fn test_placeholders_pass_through_without_property_source() {
        let src = parse(EXAMPLE, None);
        assert!(src
            .dependencies()
            .contains(&"log4j:log4j:${log4j.version:1.2.14}".to_string()));
    }

    #[test]
    fn test_extract_options_disjoint_and_ordered() {
        let src = parse(EXAMPLE, None);
        assert_eq!(src.compile_options(), ["--enable-preview", "--verbose"]);
        assert_eq!(
            src.runtime_options(),
            ["--enable-preview", "-Dvalue='this is space'"]
        );
    }

    #[test]
    fn test_gav() {
        let src = parse(EXAMPLE, None);
        assert_eq!(src.gav(), Some("org.example:classpath"));
    }

    #[test]
    fn test_comments_do_not_get_picked_up() {
        let text = "//DEPS info.picocli:picocli:4.6.3 // <.>\n\
                    //JAVA 14+ // <.>\n\
                    //JAVAC_OPTIONS commons-codec:commons-codec:1.15 // <.>\n\
                    public class test {}";
        let src = parse(text, None);
        assert_eq!(src.java_version(), Some("14+"));
        assert_eq!(src.dependencies(), ["info.picocli:picocli:4.6.3"]);
    }

    #[test]
    fn test_cds() {
        let with = parse("//CDS\nclass m { }", None);
        let without = parse("class m { }", None);
        assert!(with.enable_cds());
        assert!(!without.enable_cds());
    }

    #[test]
    fn test_duplicate_dependency_collapsed() {
        let src = parse("//DEPS a:b:1, a:b:1, c:d:2\nclass x {}", None);
        assert_eq!(src.dependencies(), ["a:b:1", "c:d:2"]);
    }

    #[test]
    fn test_sources_kept_in_order() {
        let text = "//SOURCES Hi.java\n\
                    //SOURCES https://example.com/bundle#file-gsonhelper-java\n\
                    //SOURCES pkg1/Bye.java\n\
                    class Main {}";
        let src = parse(text, None);
        assert_eq!(
            src.sources(),
            [
                "Hi.java",
                "https://example.com/bundle#file-gsonhelper-java",
                "pkg1/Bye.java"
            ]
        );

        let src = parse("//SOURCES A.java, B.java\nclass Main {}", None);
        assert_eq!(src.sources(), ["A.java", "B.java"]);
    }

    #[test]
    fn test_class_name() {
        let src = parse("public class Main {\n}", None);
        assert_eq!(src.class_name(), Some("Main".to_string()));

        let src = parse("//DEPS a:b:1\npublic interface Api {}", None);
        assert_eq!(src.class_name(), Some("Api".to_string()));
    }

    #[test]
    fn test_agent_detection() {
        let text = "public class MyAgent {\n\
                    \tpublic static void premain(String args) {}\n\
                    }";
        let src = parse(text, None);
        assert_eq!(src.premain_class(), Some("MyAgent"));
        assert_eq!(src.agent_main_class(), None);
    }

    #[test]
    fn test_description_lines_joined() {
        let src = parse("//DESCRIPTION line one\n//DESCRIPTION line two\nclass x {}", None);
        assert_eq!(src.description(), Some("line one\nline two"));
    }

    #[test]
    fn test_shell_by_extension() {
        let src = Source::parse(
            ResourceRef::for_file("script.jsh"),
            "System.out.println(1);".to_string(),
            None,
        )
        .unwrap();
        assert!(src.is_shell());
    }
}
