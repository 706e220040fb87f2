use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{
    Analyzer, BoxedIncludeProviderError, BuiltinDatabase, Config, DiagnosticKind, FileId,
    FsIncludeProvider, GlslError, IncludeGraph, IncludeProvider, IncludeReport, Severity,
};

/// In-memory file system; every file resolves against `include_dirs`, quoted
/// includes also against the includer's directory.
pub(crate) struct MemoryProvider {
    files: HashMap<PathBuf, String>,
    unreadable: HashSet<PathBuf>,
    include_dirs: Vec<PathBuf>,
    reads: AtomicUsize,
}

impl MemoryProvider {
    pub(crate) fn new(include_dirs: &[&str]) -> Self {
        MemoryProvider {
            files: HashMap::new(),
            unreadable: HashSet::new(),
            include_dirs: include_dirs.iter().map(PathBuf::from).collect(),
            reads: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with(mut self, path: &str, source: &str) -> Self {
        self.files.insert(PathBuf::from(path), source.to_string());
        self
    }

    /// A file which exists but fails to read.
    pub(crate) fn with_unreadable(mut self, path: &str) -> Self {
        self.unreadable.insert(PathBuf::from(path));
        self
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl IncludeProvider for MemoryProvider {
    fn search_paths(&self, _file: &FileId) -> Vec<PathBuf> {
        self.include_dirs.clone()
    }

    fn file_exists(&self, dir: &Path, relative: &str) -> bool {
        let path = dir.join(relative);
        self.files.contains_key(&path) || self.unreadable.contains(&path)
    }

    fn read_file(&self, file: &FileId) -> Result<String, BoxedIncludeProviderError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unreadable.contains(file.path()) {
            return Err("permission denied".into());
        }
        self.files
            .get(file.path())
            .cloned()
            .ok_or_else(|| format!("no such file: {}", file).into())
    }
}

fn visited(report: &IncludeReport) -> Vec<String> {
    report.visited.iter().map(ToString::to_string).collect()
}

fn messages(report: &IncludeReport) -> Vec<String> {
    report.diagnostics.iter().map(ToString::to_string).collect()
}

#[test]
fn multi_level_include() {
    let provider = MemoryProvider::new(&["/inc"])
        .with(
            "/src/main.frag",
            "#version 450\n#include \"lighting.glsl\"\nvoid main() {}\n",
        )
        .with("/src/lighting.glsl", "#include <brdf.glsl>\nvec3 shade();\n")
        .with("/inc/brdf.glsl", "#include <math.glsl>\n")
        .with("/inc/math.glsl", "const float PI = 3.14159;\n");

    let graph = IncludeGraph::default();
    let report = graph.resolve_includes(&FileId::from("/src/main.frag"), &provider);

    assert!(report.diagnostics.is_empty(), "{:?}", messages(&report));
    assert_eq!(
        visited(&report),
        vec!["/src/main.frag", "/src/lighting.glsl", "/inc/brdf.glsl", "/inc/math.glsl"]
    );

    let edges = graph.edges(&FileId::from("/src/main.frag"));
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].directive.line, 2);
    assert_eq!(edges[0].directive.raw, "\"lighting.glsl\"");
    assert_eq!(edges[0].target, Some(FileId::from("/src/lighting.glsl")));
}

#[test]
fn recrawl_is_idempotent() {
    let provider = MemoryProvider::new(&["/inc"])
        .with("/src/main.frag", "#include <a.glsl>\n#include <b.glsl>\n#include <nope.glsl>\n")
        .with("/inc/a.glsl", "#include <b.glsl>\n")
        .with("/inc/b.glsl", "");

    let main = FileId::from("/src/main.frag");
    let graph = IncludeGraph::default();

    let first = graph.resolve_includes(&main, &provider);
    let files = graph.files();
    let edges: Vec<_> = files.iter().map(|f| graph.edges(f)).collect();

    let second = graph.resolve_includes(&main, &provider);
    assert_eq!(graph.files(), files);
    assert_eq!(files.iter().map(|f| graph.edges(f)).collect::<Vec<_>>(), edges);
    assert_eq!(graph.edges(&main).len(), 3);
    assert_eq!(messages(&first), messages(&second));
}

#[test]
fn recrawl_drops_stale_edges() {
    let before = MemoryProvider::new(&["/inc"])
        .with("/src/main.frag", "#include <a.glsl>\n#include <b.glsl>\n")
        .with("/inc/a.glsl", "")
        .with("/inc/b.glsl", "");
    let after = MemoryProvider::new(&["/inc"])
        .with("/src/main.frag", "// a.glsl is gone\n#include <b.glsl>\n")
        .with("/inc/a.glsl", "")
        .with("/inc/b.glsl", "");

    let main = FileId::from("/src/main.frag");
    let graph = IncludeGraph::default();

    graph.resolve_includes(&main, &before);
    assert_eq!(graph.edges(&main).len(), 2);
    assert_eq!(graph.includers_of(&FileId::from("/inc/a.glsl")), vec![main.clone()]);

    let report = graph.resolve_includes(&main, &after);
    assert!(report.diagnostics.is_empty());

    let edges = graph.edges(&main);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].target, Some(FileId::from("/inc/b.glsl")));
    assert_eq!(edges[0].directive.line, 2);
    assert!(graph.includers_of(&FileId::from("/inc/a.glsl")).is_empty());
    assert_eq!(graph.includers_of(&FileId::from("/inc/b.glsl")), vec![main.clone()]);
    assert_eq!(graph.transitive_includes(&main), vec![FileId::from("/inc/b.glsl")]);
}

#[test]
fn recursive_include() {
    let provider = MemoryProvider::new(&["/inc"])
        .with("/inc/a.glsl", "// a\n#include <b.glsl>\n")
        .with("/inc/b.glsl", "\n\n#include <a.glsl>\n");

    let graph = IncludeGraph::default();
    let report = graph.resolve_includes(&FileId::from("/inc/a.glsl"), &provider);

    assert_eq!(report.diagnostics.len(), 1);
    let diagnostic = &report.diagnostics[0];
    match &diagnostic.kind {
        DiagnosticKind::IncludeCycle { file, from } => {
            assert_eq!(file, "/inc/a.glsl");
            assert_eq!(from, "/inc/b.glsl");
        }
        kind => panic!("{:?}", kind),
    }
    assert_eq!(diagnostic.file, Some(FileId::from("/inc/b.glsl")));
    assert_eq!(diagnostic.line, 3);
    assert_eq!(diagnostic.severity(), Severity::Warning);
    assert_eq!(provider.reads(), 2);
}

#[test]
fn self_include() {
    let provider = MemoryProvider::new(&["/inc"]).with("/inc/a.glsl", "#include \"a.glsl\"\n");

    let graph = IncludeGraph::default();
    let report = graph.resolve_includes(&FileId::from("/inc/a.glsl"), &provider);

    assert_eq!(
        messages(&report),
        vec![r#"/inc/a.glsl(1): file "/inc/a.glsl" is recursively included; triggered in "/inc/a.glsl""#]
    );
}

#[test]
fn unresolved_and_invalid_includes() {
    let provider = MemoryProvider::new(&["/inc"]).with(
        "/src/main.frag",
        "#include \"nope.glsl\"\n#include nope\n#include <>\n#include\n",
    );

    let graph = IncludeGraph::default();
    let report = graph.resolve_includes(&FileId::from("/src/main.frag"), &provider);

    let kinds: Vec<_> = report.diagnostics.iter().map(|d| &d.kind).collect();
    assert_eq!(kinds.len(), 4);
    assert!(matches!(kinds[0], DiagnosticKind::UnresolvedInclude { path } if path == "nope.glsl"));
    assert!(matches!(kinds[1], DiagnosticKind::InvalidIncludePath { path } if path == "nope"));
    assert!(matches!(kinds[2], DiagnosticKind::InvalidIncludePath { path } if path == "<>"));
    assert!(matches!(kinds[3], DiagnosticKind::InvalidIncludePath { path } if path.is_empty()));

    let lines: Vec<_> = report.diagnostics.iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![1, 2, 3, 4]);

    let edges = graph.edges(&FileId::from("/src/main.frag"));
    assert_eq!(edges.len(), 4);
    assert!(edges.iter().all(|e| e.target.is_none()));
}

#[test]
fn diamond_is_crawled_once() {
    let provider = MemoryProvider::new(&["/inc"])
        .with("/src/main.frag", "#include <left.glsl>\n#include <right.glsl>\n")
        .with("/inc/left.glsl", "#include <common.glsl>\n")
        .with("/inc/right.glsl", "#include <common.glsl>\n")
        .with("/inc/common.glsl", "float shared;\n");

    let graph = IncludeGraph::default();
    let report = graph.resolve_includes(&FileId::from("/src/main.frag"), &provider);

    assert!(report.diagnostics.is_empty());
    assert_eq!(provider.reads(), 4);
    assert_eq!(
        graph.includers_of(&FileId::from("/inc/common.glsl")),
        vec![FileId::from("/inc/left.glsl"), FileId::from("/inc/right.glsl")]
    );
}

#[test]
fn include_depth_limit() {
    let provider = MemoryProvider::new(&["/inc"])
        .with("/inc/d0.glsl", "#include <d1.glsl>\n")
        .with("/inc/d1.glsl", "#include <d2.glsl>\n")
        .with("/inc/d2.glsl", "#include <d3.glsl>\n")
        .with("/inc/d3.glsl", "");

    let graph = IncludeGraph::new(Config::default().with_max_include_depth(2));
    let report = graph.resolve_includes(&FileId::from("/inc/d0.glsl"), &provider);

    assert_eq!(visited(&report), vec!["/inc/d0.glsl", "/inc/d1.glsl", "/inc/d2.glsl"]);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].file, Some(FileId::from("/inc/d2.glsl")));
    assert!(matches!(
        &report.diagnostics[0].kind,
        DiagnosticKind::IncludeDepthExceeded { file, depth: 2 } if file == "/inc/d3.glsl"
    ));

    // The edge is recorded even though the target was not crawled
    assert_eq!(
        graph.edges(&FileId::from("/inc/d2.glsl"))[0].target,
        Some(FileId::from("/inc/d3.glsl"))
    );
}

#[test]
fn include_err() {
    let provider = MemoryProvider::new(&["/inc"])
        .with("/src/main.frag", "int x;\n#include <locked.glsl>\nint y;\n#include <ok.glsl>\n")
        .with("/inc/ok.glsl", "")
        .with_unreadable("/inc/locked.glsl");

    let graph = IncludeGraph::default();
    let report = graph.resolve_includes(&FileId::from("/src/main.frag"), &provider);

    assert_eq!(
        messages(&report),
        vec![
            r#"/src/main.frag(2): include provider error: "permission denied" when trying to include "/inc/locked.glsl""#
        ]
    );
    assert_eq!(visited(&report), vec!["/src/main.frag", "/inc/ok.glsl"]);

    let report = graph.resolve_includes(&FileId::from("/src/missing.frag"), &provider);
    assert!(report.visited.is_empty());
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].file, Some(FileId::from("/src/missing.frag")));
    assert!(matches!(
        report.diagnostics[0].kind,
        DiagnosticKind::IncludeProviderError { .. }
    ));
}

#[test]
fn include_file() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let shaders = root.path().join("shaders");
    let include = root.path().join("include");
    std::fs::create_dir_all(&shaders)?;
    std::fs::create_dir_all(&include)?;

    std::fs::write(
        shaders.join("main.frag"),
        "#include \"local.glsl\"\n#include <lib.glsl>\n#include <local.glsl>\n",
    )?;
    std::fs::write(shaders.join("local.glsl"), "float local;\n")?;
    std::fs::write(include.join("lib.glsl"), "#include \"util.glsl\"\n")?;
    std::fs::write(include.join("util.glsl"), "float util;\n")?;

    let provider = FsIncludeProvider::new(vec![include.clone()]);
    let main = FileId::new(shaders.join("main.frag"));

    let graph = IncludeGraph::default();
    let report = graph.resolve_includes(&main, &provider);

    // Angled includes never look next to the includer
    assert_eq!(report.diagnostics.len(), 1);
    assert!(matches!(
        &report.diagnostics[0].kind,
        DiagnosticKind::UnresolvedInclude { path } if path == "local.glsl"
    ));

    let targets: Vec<_> = graph.edges(&main).into_iter().map(|e| e.target).collect();
    assert_eq!(
        targets,
        vec![
            Some(FileId::new(shaders.join("local.glsl"))),
            Some(FileId::new(include.join("lib.glsl"))),
            None,
        ]
    );
    assert_eq!(
        graph.transitive_includes(&main),
        vec![
            FileId::new(shaders.join("local.glsl")),
            FileId::new(include.join("lib.glsl")),
            FileId::new(include.join("util.glsl")),
        ]
    );

    Ok(())
}

#[test]
fn concurrent_recrawls() {
    let provider = MemoryProvider::new(&["/inc"])
        .with("/src/a.frag", "#include <shared.glsl>\n#include <a.glsl>\n")
        .with("/src/b.frag", "#include <shared.glsl>\n#include <b.glsl>\n")
        .with("/inc/shared.glsl", "#include <math.glsl>\n")
        .with("/inc/math.glsl", "")
        .with("/inc/a.glsl", "")
        .with("/inc/b.glsl", "");

    let graph = Arc::new(IncludeGraph::default());
    std::thread::scope(|s| {
        for i in 0..8 {
            let graph = Arc::clone(&graph);
            let provider = &provider;
            s.spawn(move || {
                let file = if i % 2 == 0 { "/src/a.frag" } else { "/src/b.frag" };
                let report = graph.resolve_includes(&FileId::from(file), provider);
                assert!(report.diagnostics.is_empty());
            });
        }
    });

    assert_eq!(graph.files().len(), 6);
    for file in graph.files() {
        let edges = graph.edges(&file);
        let unique: HashSet<_> = edges.iter().map(|e| e.directive.line).collect();
        assert_eq!(unique.len(), edges.len());
    }
    assert_eq!(
        graph.includers_of(&FileId::from("/inc/shared.glsl")),
        vec![FileId::from("/src/a.frag"), FileId::from("/src/b.frag")]
    );
}

#[test]
fn lossless_for_malformed_input() {
    let inputs = [
        "",
        "#",
        "#include <foo",
        "void main() { if (a { b = ; } }}}",
        "/* unterminated",
        "float x = 1.0e+;\n\"unterminated string\nint y;",
        "layout(location = ) in vec3; struct { ;",
        "#define X \\\n  1 \\\r\n  + 2\n@@@ $$ `",
        "vec3 v = vec3(1.0, (2.0, [3.0));\u{feff}é",
    ];

    for input in inputs.iter() {
        let (tree, _) = crate::parse(input);
        assert_eq!(tree.text(), *input);
    }
}

#[test]
fn analyzer_parse_file() {
    let provider = MemoryProvider::new(&[]).with("/src/bad.frag", "void main() { int x = }\n");
    let analyzer = Analyzer::default();

    let parse = analyzer
        .parse_file(&provider, &FileId::from("/src/bad.frag"))
        .unwrap();
    assert_eq!(parse.diagnostics.len(), 1);
    assert_eq!(parse.diagnostics[0].severity(), Severity::Error);
    assert_eq!(
        parse.diagnostics[0].to_string(),
        "/src/bad.frag(1): expression expected, got '}'"
    );

    match analyzer.parse_file(&provider, &FileId::from("/src/none.frag")) {
        Err(GlslError::IncludeProviderError { file, .. }) => assert_eq!(file, "/src/none.frag"),
        other => panic!("{:?}", other.map(|p| p.diagnostics)),
    }
}

#[test]
fn analyzers_share_builtins() {
    let builtins = Arc::new(BuiltinDatabase::new(Config::default().version));
    let a = Analyzer::with_builtins(Config::default(), Arc::clone(&builtins));
    let b = Analyzer::with_builtins(
        Config::default().with_prefix_narrowing(false),
        Arc::clone(&builtins),
    );
    assert!(Arc::ptr_eq(a.builtins(), b.builtins()));

    let source = "void main() { float v = no }";
    let offset = source.find("no }").unwrap() + 2;

    let narrowed = a.complete_at(source, offset);
    assert!(narrowed.iter().any(|c| c.insert_text == "normalize"));
    assert!(narrowed.iter().all(|c| c.insert_text != "main"));

    let everything = b.complete_at(source, offset);
    assert!(everything.iter().any(|c| c.insert_text == "main"));
}

#[cfg(feature = "serde")]
#[test]
fn diagnostics_serialize() {
    let (_, diagnostics) = crate::parse("int x = ;");
    let json = serde_json::to_value(&diagnostics).unwrap();
    assert_eq!(json[0]["line"], 1);
    assert_eq!(
        json[0]["kind"]["SyntaxError"]["message"],
        "expression expected, got ';'"
    );
}
