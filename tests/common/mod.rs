// tests/common/mod.rs

//! Shared fixture pool for integration tests.

use resolvent::{Package, PackageId, PackageSpec, Pool, SYSTEM_REPO_NAME};

/// Build the standard test universe.
///
/// The `@System` repo holds the installed state; `main` and `updates`
/// hold available packages, including a copy of installed `penny` (for
/// reinstall no-ops) and both a higher and a lower `baby` than the
/// installed one.
pub fn sample_pool() -> Pool {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();

    let mut pool = Pool::with_arch("x86_64");
    let system = pool.add_repo(SYSTEM_REPO_NAME);
    let main = pool.add_repo("main");
    let updates = pool.add_repo("updates");

    pool.add_package(system, PackageSpec::new("penny", "4-1", "noarch"))
        .unwrap();
    pool.add_package(
        system,
        PackageSpec::new("penny-lib", "4-1", "x86_64").provides(["libpenny.so.4"]),
    )
    .unwrap();
    pool.add_package(
        system,
        PackageSpec::new("flying", "2-9", "noarch").requires(["penny-lib"]),
    )
    .unwrap();
    pool.add_package(system, PackageSpec::new("fool", "1-3", "noarch"))
        .unwrap();
    pool.add_package(system, PackageSpec::new("baby", "5.0-0", "x86_64"))
        .unwrap();
    pool.add_package(system, PackageSpec::new("dog", "1-1", "x86_64"))
        .unwrap();
    pool.add_package(system, PackageSpec::new("jay", "5.0-0", "x86_64"))
        .unwrap();

    pool.add_package(main, PackageSpec::new("walrus", "2-5", "noarch").requires(["semolina = 2"]))
        .unwrap();
    pool.add_package(main, PackageSpec::new("walrus", "2-6", "noarch").requires(["semolina = 2"]))
        .unwrap();
    pool.add_package(main, PackageSpec::new("semolina", "2-0", "x86_64"))
        .unwrap();
    pool.add_package(main, PackageSpec::new("semolina", "2-0", "i686"))
        .unwrap();
    pool.add_package(main, PackageSpec::new("penny", "4-1", "noarch"))
        .unwrap();
    pool.add_package(main, PackageSpec::new("hello", "1-0", "noarch").requires(["goodbye"]))
        .unwrap();
    pool.add_package(main, PackageSpec::new("pilchard", "1.2.3-1", "x86_64"))
        .unwrap();
    pool.add_package(main, PackageSpec::new("pilchard", "1.2.4-1", "x86_64"))
        .unwrap();
    pool.add_package(main, PackageSpec::new("pilchard", "1.2.4-1", "i686"))
        .unwrap();

    pool.add_package(
        updates,
        PackageSpec::new("fool", "1-5", "noarch").obsoletes(["penny < 5-0"]),
    )
    .unwrap();
    pool.add_package(
        updates,
        PackageSpec::new("flying", "3-0", "noarch").requires(["penny-lib"]),
    )
    .unwrap();
    pool.add_package(updates, PackageSpec::new("dog", "1-2", "x86_64"))
        .unwrap();
    pool.add_package(updates, PackageSpec::new("baby", "4.9-0", "x86_64"))
        .unwrap();

    pool
}

/// The installed package with the given name.
pub fn installed(pool: &Pool, name: &str) -> PackageId {
    pool.by_name(name)
        .iter()
        .copied()
        .find(|&id| pool.is_installed(id))
        .unwrap_or_else(|| panic!("{} is not installed in the fixture", name))
}

/// The available (non-installed) package with the given NEVRA.
pub fn available(pool: &Pool, nevra: &str) -> PackageId {
    pool.package_ids()
        .find(|&id| !pool.is_installed(id) && pool.get(id).nevra() == nevra)
        .unwrap_or_else(|| panic!("{} is not available in the fixture", nevra))
}

/// Sorted NEVRA strings for a package list.
pub fn nevras(packages: &[&Package]) -> Vec<String> {
    let mut out: Vec<String> = packages.iter().map(|p| p.nevra()).collect();
    out.sort();
    out
}
