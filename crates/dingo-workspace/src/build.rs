//! Parallel, cache-aware build orchestration. Packages are grouped into
//! dependency levels by [`dingo_cycles::build_order`]; within a level,
//! every file is transpiled concurrently, bounded by a worker-count
//! semaphore. A package whose dependency failed is skipped, not retried.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dingo_cycles::BuildOrder;
use dingo_depgraph::{DependencyGraph, NodeId, PackageNode};
use dingo_foundation::DiagnosticError;
use tokio::sync::{Mutex, Semaphore};
use tracing::{info, warn};

use crate::cache::{dependency_hash, hash_file, BuildCache, CacheEntry};

/// The transpiler callback injected by the caller: given a `.dingo`
/// file's absolute path, writes its `.go` output (same directory,
/// `.go` extension) or returns an error message. The builder never
/// depends on the transpiler crate directly.
pub type Transpile = Arc<dyn Fn(&Path) -> Result<(), String> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    CacheHit,
    Built,
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub source_path: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub files: Vec<FileReport>,
}

impl BuildReport {
    pub fn has_failures(&self) -> bool {
        self.files.iter().any(|f| matches!(f.outcome, FileOutcome::Failed { .. }))
    }

    pub fn built_count(&self) -> usize {
        self.files.iter().filter(|f| f.outcome == FileOutcome::Built).count()
    }

    pub fn cache_hit_count(&self) -> usize {
        self.files.iter().filter(|f| f.outcome == FileOutcome::CacheHit).count()
    }
}

pub struct BuildOptions {
    pub cache_path: PathBuf,
    pub max_parallel: usize,
}

impl BuildOptions {
    pub fn new(cache_path: PathBuf) -> Self {
        Self { cache_path, max_parallel: available_parallelism() }
    }
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

fn package_source_hash(package: &PackageNode) -> Result<String, DiagnosticError> {
    let mut files = package.files.clone();
    files.sort();
    let mut combined = String::new();
    for file in &files {
        combined.push_str(&hash_file(file)?);
        combined.push('\n');
    }
    Ok(crate::cache::hash_bytes(combined.as_bytes()))
}

/// Runs the full level-by-level parallel build, loading and saving the
/// cache at `options.cache_path`. Returns an aggregate report even when
/// some files failed — only a dependency cycle is fatal at this layer.
pub async fn build_workspace(
    graph: &DependencyGraph,
    order: &BuildOrder,
    transpile: Transpile,
    options: BuildOptions,
) -> Result<BuildReport, DiagnosticError> {
    let mut source_hashes: HashMap<NodeId, String> = HashMap::new();
    for node in graph.graph.node_indices() {
        source_hashes.insert(node, package_source_hash(graph.package(node))?);
    }

    let cache = Arc::new(Mutex::new(BuildCache::load(&options.cache_path)?));
    let semaphore = Arc::new(Semaphore::new(options.max_parallel.max(1)));

    let mut report = BuildReport::default();
    let mut failed_packages: HashSet<NodeId> = HashSet::new();

    for (level_index, level) in order.levels.iter().enumerate() {
        info!(level = level_index, packages = level.len(), "building dependency level");
        let mut handles = Vec::new();

        for &node in level {
            let package = graph.package(node).clone();
            let deps_failed = graph.direct_dependencies(node).any(|d| failed_packages.contains(&d));

            let mut transitive: Vec<String> =
                graph.transitive_dependencies(node).into_iter().map(|d| source_hashes[&d].clone()).collect();
            transitive.sort();
            let dep_hash = dependency_hash(&transitive);

            for file in package.files.clone() {
                let source_hash = hash_file(&file)?;
                let cache = Arc::clone(&cache);
                let semaphore = Arc::clone(&semaphore);
                let transpile = Arc::clone(&transpile);
                let dep_hash = dep_hash.clone();
                let deps_failed = deps_failed;

                handles.push((
                    node,
                    tokio::spawn(async move {
                        if deps_failed {
                            return FileReport {
                                source_path: file,
                                outcome: FileOutcome::Skipped {
                                    reason: "a dependency failed to build".to_string(),
                                },
                            };
                        }
                        let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                        build_one_file(file, source_hash, dep_hash, cache, transpile).await
                    }),
                ));
            }
        }

        for (node, handle) in handles {
            let result = handle.await.map_err(|e| DiagnosticError::Internal {
                message: format!("build task panicked: {e}"),
                context: "parallel build".to_string(),
            })?;
            if let FileOutcome::Failed { error } = &result.outcome {
                warn!(file = %result.source_path.display(), error, "package failed to build");
                failed_packages.insert(node);
            }
            report.files.push(result);
        }
    }

    cache.lock().await.save(&options.cache_path)?;
    Ok(report)
}

async fn build_one_file(
    source_path: PathBuf,
    source_hash: String,
    dependency_hash: String,
    cache: Arc<Mutex<BuildCache>>,
    transpile: Transpile,
) -> FileReport {
    {
        let guard = cache.lock().await;
        if guard.is_valid(&source_path, &source_hash, &dependency_hash) {
            return FileReport { source_path, outcome: FileOutcome::CacheHit };
        }
    }

    let blocking_path = source_path.clone();
    let blocking_transpile = Arc::clone(&transpile);
    let result = tokio::task::spawn_blocking(move || blocking_transpile(&blocking_path)).await;

    match result {
        Ok(Ok(())) => {
            let output_path = source_path.with_extension("go");
            match hash_file(&output_path) {
                Ok(output_hash) => {
                    let mut guard = cache.lock().await;
                    guard.record(
                        source_path.clone(),
                        CacheEntry { source_hash, output_path, output_hash, dependency_hash },
                    );
                    FileReport { source_path, outcome: FileOutcome::Built }
                }
                Err(e) => FileReport { source_path, outcome: FileOutcome::Failed { error: e.to_string() } },
            }
        }
        Ok(Err(message)) => FileReport { source_path, outcome: FileOutcome::Failed { error: message } },
        Err(join_err) => FileReport {
            source_path,
            outcome: FileOutcome::Failed { error: format!("transpile task panicked: {join_err}") },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn write_package(dir: &Path, name: &str, body: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(format!("{name}.dingo"));
        fs::write(&path, body).unwrap();
        path
    }

    fn ok_transpile() -> Transpile {
        Arc::new(|path: &Path| {
            let output = path.with_extension("go");
            fs::write(output, b"package p\n").map_err(|e| e.to_string())
        })
    }

    #[tokio::test]
    async fn builds_every_file_on_a_cold_cache() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_package(root, "main", "package main\n");

        let mut graph = DependencyGraph::new();
        graph.add_package(PackageNode {
            import_path: "example.com/widgets".to_string(),
            dir: root.to_path_buf(),
            files: vec![root.join("main.dingo")],
        });
        let order = dingo_cycles::build_order(&graph).unwrap();

        let options = BuildOptions::new(root.join("cache.json"));
        let report = build_workspace(&graph, &order, ok_transpile(), options).await.unwrap();

        assert_eq!(report.built_count(), 1);
        assert!(!report.has_failures());
        assert!(root.join("main.go").is_file());
    }

    #[tokio::test]
    async fn a_warm_cache_skips_the_transpiler() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_package(root, "main", "package main\n");

        let mut graph = DependencyGraph::new();
        graph.add_package(PackageNode {
            import_path: "example.com/widgets".to_string(),
            dir: root.to_path_buf(),
            files: vec![root.join("main.dingo")],
        });
        let order = dingo_cycles::build_order(&graph).unwrap();
        let cache_path = root.join("cache.json");

        build_workspace(&graph, &order, ok_transpile(), BuildOptions::new(cache_path.clone())).await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counted_calls = Arc::clone(&calls);
        let counting_transpile: Transpile = Arc::new(move |path: &Path| {
            counted_calls.fetch_add(1, Ordering::SeqCst);
            fs::write(path.with_extension("go"), b"package p\n").map_err(|e| e.to_string())
        });

        let report =
            build_workspace(&graph, &order, counting_transpile, BuildOptions::new(cache_path)).await.unwrap();
        assert_eq!(report.cache_hit_count(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn a_failed_package_skips_its_dependents_but_not_independent_levels() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_package(&root.join("pkg/auth"), "auth", "package auth\n");
        write_package(&root.join("pkg/user"), "user", "package user\n");
        write_package(&root.join("pkg/billing"), "billing", "package billing\n");

        let mut graph = DependencyGraph::new();
        graph.add_package(PackageNode {
            import_path: "pkg/user".to_string(),
            dir: root.join("pkg/user"),
            files: vec![root.join("pkg/user/user.dingo")],
        });
        graph.add_package(PackageNode {
            import_path: "pkg/billing".to_string(),
            dir: root.join("pkg/billing"),
            files: vec![root.join("pkg/billing/billing.dingo")],
        });
        graph.add_import("pkg/auth", "pkg/user");
        if let Some(auth_id) = graph.find_by_import_path("pkg/auth") {
            let node = &mut graph.graph[auth_id];
            node.dir = root.join("pkg/auth");
            node.files = vec![root.join("pkg/auth/auth.dingo")];
        }

        let order = dingo_cycles::build_order(&graph).unwrap();

        let failing_transpile: Transpile = Arc::new(|path: &Path| {
            if path.to_string_lossy().contains("user") {
                return Err("boom".to_string());
            }
            fs::write(path.with_extension("go"), b"package p\n").map_err(|e| e.to_string())
        });

        let options = BuildOptions::new(root.join("cache.json"));
        let report = build_workspace(&graph, &order, failing_transpile, options).await.unwrap();

        assert!(report.has_failures());
        let auth_outcome = &report.files.iter().find(|f| f.source_path.ends_with("auth.dingo")).unwrap().outcome;
        assert!(matches!(auth_outcome, FileOutcome::Skipped { .. }));
        let billing_outcome =
            &report.files.iter().find(|f| f.source_path.ends_with("billing.dingo")).unwrap().outcome;
        assert_eq!(*billing_outcome, FileOutcome::Built);
    }
}
