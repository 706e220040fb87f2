//! The include graph: which files include which, as last seen by the crawler.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;

use crate::config::Config;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::include::{self, IncludeDirective};
use crate::include_provider::{FileId, IncludeProvider};
use crate::parser::parse_with_config;
use crate::syntax::Span;
use crate::BoxedIncludeProviderError;

/// One `#include` found in a file, with the file it resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncludeEdge {
    pub directive: IncludeDirective,

    /// `None` when the path was invalid or could not be found
    pub target: Option<FileId>,
}

/// Outcome of one crawl.
#[derive(Debug, Default)]
pub struct IncludeReport {
    pub diagnostics: Vec<Diagnostic>,

    /// Files read during the crawl, in the order they were entered
    pub visited: Vec<FileId>,
}

#[derive(Default)]
struct Crawl {
    report: IncludeReport,

    // Files on the current include chain
    stack: HashSet<FileId>,

    // Files already crawled in this pass
    visited: HashSet<FileId>,
}

/// Outgoing include edges per file. Shared between threads; crawling the same
/// file from several threads is serialized, different files proceed in parallel.
#[derive(Default)]
pub struct IncludeGraph {
    edges: DashMap<FileId, Vec<IncludeEdge>>,
    locks: DashMap<FileId, Arc<Mutex<()>>>,
    config: Config,
}

impl IncludeGraph {
    pub fn new(config: Config) -> Self {
        IncludeGraph {
            edges: DashMap::new(),
            locks: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read `file`, record its includes and crawl everything they resolve to.
    ///
    /// Problems are reported as diagnostics; a crawl always runs to completion.
    pub fn resolve_includes(&self, file: &FileId, provider: &dyn IncludeProvider) -> IncludeReport {
        log::debug!("crawling includes of {}", file);

        let mut crawl = Crawl::default();
        if let Err(cause) = self.include_child(file, 0, provider, &mut crawl) {
            crawl.report.diagnostics.push(
                Diagnostic::new(
                    Span::default(),
                    1,
                    DiagnosticKind::IncludeProviderError {
                        file: file.to_string(),
                        cause: cause.to_string(),
                    },
                )
                .in_file(file),
            );
        }

        log::debug!(
            "crawl of {} visited {} files, {} diagnostics",
            file,
            crawl.report.visited.len(),
            crawl.report.diagnostics.len()
        );
        crawl.report
    }

    fn include_child(
        &self,
        file: &FileId,
        depth: usize,
        provider: &dyn IncludeProvider,
        crawl: &mut Crawl,
    ) -> Result<(), BoxedIncludeProviderError> {
        let edges = self.refresh_edges(file, provider, crawl)?;

        crawl.stack.insert(file.clone());
        crawl.visited.insert(file.clone());
        crawl.report.visited.push(file.clone());

        for edge in &edges {
            let target = match &edge.target {
                Some(target) => target,
                None => continue,
            };
            let at = |kind| {
                Diagnostic::new(edge.directive.span, edge.directive.line, kind).in_file(file)
            };

            if crawl.stack.contains(target) {
                log::warn!("{} is recursively included from {}", target, file);
                crawl.report.diagnostics.push(at(DiagnosticKind::IncludeCycle {
                    file: target.to_string(),
                    from: file.to_string(),
                }));
                continue;
            }

            if crawl.visited.contains(target) {
                continue;
            }

            if depth + 1 > self.config.max_include_depth {
                log::warn!("include depth limit reached at {}", target);
                crawl.report.diagnostics.push(at(DiagnosticKind::IncludeDepthExceeded {
                    file: target.to_string(),
                    depth: self.config.max_include_depth,
                }));
                continue;
            }

            if let Err(cause) = self.include_child(target, depth + 1, provider, crawl) {
                log::warn!("failed to read {}: {}", target, cause);
                crawl.report.diagnostics.push(at(DiagnosticKind::IncludeProviderError {
                    file: target.to_string(),
                    cause: cause.to_string(),
                }));
            }
        }

        crawl.stack.remove(file);
        Ok(())
    }

    /// Re-read `file` and atomically replace its outgoing edges.
    fn refresh_edges(
        &self,
        file: &FileId,
        provider: &dyn IncludeProvider,
        crawl: &mut Crawl,
    ) -> Result<Vec<IncludeEdge>, BoxedIncludeProviderError> {
        let lock = self.file_lock(file);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let source = provider.read_file(file)?;
        let tree = parse_with_config(&source, &self.config).tree;

        let mut edges = Vec::new();
        for directive in tree.includes() {
            let target = match directive.path() {
                None => {
                    crawl.report.diagnostics.push(
                        Diagnostic::new(
                            directive.span,
                            directive.line,
                            DiagnosticKind::InvalidIncludePath {
                                path: directive.raw.clone(),
                            },
                        )
                        .in_file(file),
                    );
                    None
                }
                Some(path) => {
                    let search_paths =
                        include::search_order(&directive, file, provider.search_paths(file));
                    let target = include::resolve(&directive, &search_paths, |dir, relative| {
                        provider.file_exists(dir, relative)
                    });
                    if target.is_none() {
                        log::debug!("cannot resolve {:?} in {}", path, file);
                        crawl.report.diagnostics.push(
                            Diagnostic::new(
                                directive.span,
                                directive.line,
                                DiagnosticKind::UnresolvedInclude {
                                    path: path.to_string(),
                                },
                            )
                            .in_file(file),
                        );
                    }
                    target
                }
            };

            log::trace!("{}:{} includes {:?}", file, directive.line, target);
            edges.push(IncludeEdge { directive, target });
        }

        self.edges.insert(file.clone(), edges.clone());
        Ok(edges)
    }

    fn file_lock(&self, file: &FileId) -> Arc<Mutex<()>> {
        self.locks.entry(file.clone()).or_default().value().clone()
    }

    /// Outgoing edges of `file`, in source order.
    pub fn edges(&self, file: &FileId) -> Vec<IncludeEdge> {
        self.edges
            .get(file)
            .map(|edges| edges.value().clone())
            .unwrap_or_default()
    }

    /// Files with an edge resolving to `file`.
    pub fn includers_of(&self, file: &FileId) -> Vec<FileId> {
        let mut includers: Vec<FileId> = self
            .edges
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .iter()
                    .any(|edge| edge.target.as_ref() == Some(file))
            })
            .map(|entry| entry.key().clone())
            .collect();
        includers.sort();
        includers
    }

    /// Every file crawled so far.
    pub fn files(&self) -> Vec<FileId> {
        let mut files: Vec<FileId> = self.edges.iter().map(|entry| entry.key().clone()).collect();
        files.sort();
        files
    }

    /// Forget `file` and its outgoing edges. Edges of other files pointing to it stay.
    pub fn remove_file(&self, file: &FileId) -> Option<Vec<IncludeEdge>> {
        // The lock entry outlives the edges; a crawler may already be waiting on it
        let lock = self.file_lock(file);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.edges.remove(file).map(|(_, edges)| edges)
    }

    /// Everything reachable from `file` through resolved edges, in depth-first order.
    /// `file` itself is only listed if it includes itself, directly or not.
    pub fn transitive_includes(&self, file: &FileId) -> Vec<FileId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut pending: Vec<FileId> = self.targets(file).into_iter().rev().collect();

        while let Some(next) = pending.pop() {
            if !seen.insert(next.clone()) {
                continue;
            }
            pending.extend(self.targets(&next).into_iter().rev());
            out.push(next);
        }

        out
    }

    fn targets(&self, file: &FileId) -> Vec<FileId> {
        self.edges(file)
            .into_iter()
            .filter_map(|edge| edge.target)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::MemoryProvider;

    fn ids(files: &[&str]) -> Vec<FileId> {
        files.iter().map(|f| FileId::from(*f)).collect()
    }

    fn crawled() -> IncludeGraph {
        let provider = MemoryProvider::new(&["/inc"])
            .with("/src/main.frag", "#include \"a.glsl\"\n#include <b.glsl>\n")
            .with("/src/a.glsl", "#include <b.glsl>\n")
            .with("/inc/b.glsl", "#include <c.glsl>\n#include \"missing.glsl\"\n")
            .with("/inc/c.glsl", "float c;\n");

        let graph = IncludeGraph::default();
        graph.resolve_includes(&FileId::from("/src/main.frag"), &provider);
        graph
    }

    #[test]
    fn queries() {
        let graph = crawled();

        assert_eq!(
            graph.files(),
            ids(&["/inc/b.glsl", "/inc/c.glsl", "/src/a.glsl", "/src/main.frag"])
        );
        assert_eq!(
            graph.includers_of(&FileId::from("/inc/b.glsl")),
            ids(&["/src/a.glsl", "/src/main.frag"])
        );

        let b = graph.edges(&FileId::from("/inc/b.glsl"));
        assert_eq!(b.len(), 2);
        assert_eq!(b[0].target, Some(FileId::from("/inc/c.glsl")));
        assert_eq!(b[1].target, None);
        assert_eq!(b[1].directive.line, 2);

        assert_eq!(
            graph.transitive_includes(&FileId::from("/src/main.frag")),
            ids(&["/src/a.glsl", "/inc/b.glsl", "/inc/c.glsl"])
        );
        assert!(graph.edges(&FileId::from("/nowhere.glsl")).is_empty());
    }

    #[test]
    fn remove_keeps_other_edges() {
        let graph = crawled();

        let removed = graph.remove_file(&FileId::from("/src/a.glsl")).unwrap();
        assert_eq!(removed.len(), 1);
        assert!(graph.remove_file(&FileId::from("/src/a.glsl")).is_none());

        assert_eq!(graph.includers_of(&FileId::from("/inc/b.glsl")), ids(&["/src/main.frag"]));
        assert_eq!(
            graph.transitive_includes(&FileId::from("/src/main.frag")),
            ids(&["/src/a.glsl", "/inc/b.glsl", "/inc/c.glsl"])
        );
    }

    #[test]
    fn remove_while_crawling() {
        let provider = MemoryProvider::new(&["/inc"])
            .with("/src/main.frag", "#include <a.glsl>\n#include <b.glsl>\n")
            .with("/inc/a.glsl", "")
            .with("/inc/b.glsl", "");
        let main = FileId::from("/src/main.frag");

        let graph = IncludeGraph::default();
        std::thread::scope(|s| {
            for i in 0..8 {
                let (graph, provider, main) = (&graph, &provider, &main);
                s.spawn(move || {
                    for _ in 0..50 {
                        if i % 2 == 0 {
                            graph.resolve_includes(main, provider);
                        } else {
                            graph.remove_file(main);
                        }
                    }
                });
            }
        });

        // Every crawl and removal went through the same lock
        assert_eq!(graph.locks.len(), 3);
        assert!(graph.edges(&main).len() == 2 || graph.edges(&main).is_empty());

        graph.resolve_includes(&main, &provider);
        assert_eq!(graph.edges(&main).len(), 2);
        assert!(graph.remove_file(&main).is_some());
        assert!(graph.locks.contains_key(&main));
    }

    #[test]
    fn transitive_includes_survive_cycles() {
        let provider = MemoryProvider::new(&["/inc"])
            .with("/inc/a.glsl", "#include <b.glsl>\n")
            .with("/inc/b.glsl", "#include <a.glsl>\n");

        let graph = IncludeGraph::default();
        graph.resolve_includes(&FileId::from("/inc/a.glsl"), &provider);

        assert_eq!(
            graph.transitive_includes(&FileId::from("/inc/a.glsl")),
            ids(&["/inc/b.glsl", "/inc/a.glsl"])
        );
    }
}
