use std::{fs, io::Read, sync::Arc};

use multifs::{
    BackendRef, EmbeddedFs, MemoryFs, MultiFs, MultiFsConfig, NativeFs, Priority, SubFs,
    WalkControl,
};
use tempfile::{tempdir, TempDir};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

static EMBEDDED: &[(&str, &[u8])] = &[
    ("embed_dir/w", b"embedded w"),
    ("embed_dir/z", b"embedded z"),
    ("elsewhere/q", b"not visible"),
];

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test_log::test]
fn test_multifs_layered_directories() -> anyhow::Result<()> {
    let temp = tempdir()?;
    let dir_a = helper::native_dir(&temp, "dir_a", &[("A", "from a"), ("only_a", "a")])?;
    let dir_b = helper::native_dir(&temp, "dir_b", &[("A", "from b"), ("only_b", "b")])?;
    let dir_c = helper::native_dir(&temp, "dir_c", &[("A", "from c")])?;

    let mut fs = MultiFs::new();
    fs.insert(dir_a, Priority::First);
    fs.insert(dir_b.clone(), Priority::Last);

    let mut content = String::new();
    fs.open("A")?.read_to_string(&mut content)?;
    assert_eq!(content, "from a");

    fs.insert(dir_c.clone(), Priority::First);
    assert_eq!(fs.read_file("A")?, b"from c");
    assert_eq!(fs.read_file("only_b")?, b"b");

    assert!(fs.remove(&dir_c));
    assert!(fs.remove(&dir_b));
    assert_eq!(fs.read_file("A")?, b"from a");
    assert!(fs.read_file("only_b").unwrap_err().is_not_found());

    fs.clear();
    assert!(fs.open("A").err().is_some_and(|e| e.is_not_found()));

    Ok(())
}

#[test_log::test]
fn test_multifs_cannot_escape_source_root() -> anyhow::Result<()> {
    let temp = tempdir()?;
    fs::write(temp.path().join("secret"), "do not read")?;
    let root = helper::native_dir(&temp, "root", &[("inside.txt", "inside")])?;

    let mut multifs = MultiFs::new();
    multifs.add(root);

    for path in ["../secret", "../../secret", "/../secret", "..\\secret"] {
        let error = multifs.read_file(path).unwrap_err();
        assert!(error.is_not_found(), "{path} escaped the root");
    }

    assert_eq!(multifs.read_file("../../inside.txt")?, b"inside");
    assert_eq!(multifs.read_file("\\inside.txt")?, b"inside");
    assert!(multifs.stat("..")?.is_dir());

    Ok(())
}

#[test_log::test]
fn test_multifs_walk_merges_native_and_embedded() -> anyhow::Result<()> {
    let temp = tempdir()?;
    let dir_a = helper::native_dir(&temp, "dir_a", &[("x", "A"), ("y", "A")])?;
    let dir_b = helper::native_dir(&temp, "dir_b", &[("y", "BB"), ("z", "BB")])?;
    let embedded: BackendRef = Arc::new(EmbeddedFs::new(EMBEDDED));

    let mut fs = MultiFs::new();
    fs.insert(dir_a, Priority::Last);
    fs.insert(dir_b, Priority::Last);
    fs.insert(Arc::new(SubFs::new(embedded, "embed_dir")), Priority::Last);

    let mut seen = Vec::new();
    fs.walk(".", |path, metadata, error| {
        assert!(error.is_none(), "{path}: {error:?}");
        let size = metadata.filter(|m| m.is_file()).map(|m| m.get_size());
        seen.push((path.to_string(), size));
        WalkControl::Continue
    })?;

    assert_eq!(
        seen,
        vec![
            (String::new(), None),
            ("w".to_string(), Some(10)),
            ("x".to_string(), Some(1)),
            ("y".to_string(), Some(1)),
            ("z".to_string(), Some(2)),
        ]
    );

    assert_eq!(fs.read_file("w")?, b"embedded w");
    assert!(!fs.exists("q"));

    Ok(())
}

#[test_log::test]
fn test_multifs_walk_subtree_with_skip() -> anyhow::Result<()> {
    let temp = tempdir()?;
    let native = helper::native_dir(
        &temp,
        "native",
        &[("src/lib.rs", ""), ("src/bin/main.rs", ""), ("src-old/x", "")],
    )?;
    let memory = Arc::new(
        MemoryFs::new()
            .with_file("src/generated.rs", "")?
            .with_file("src/bin/extra.rs", "")?,
    );

    let mut fs = MultiFs::new();
    fs.insert(native, Priority::First);
    fs.insert(memory, Priority::Last);

    let mut seen = Vec::new();
    fs.walk("/src", |path, metadata, _| {
        seen.push(path.to_string());
        if metadata.is_some_and(|m| m.is_dir()) && path == "src/bin" {
            return WalkControl::SkipDir;
        }
        WalkControl::Continue
    })?;

    assert_eq!(seen, vec!["src", "src/bin", "src/generated.rs", "src/lib.rs"]);

    Ok(())
}

#[test_log::test]
fn test_multifs_glob_across_sources() -> anyhow::Result<()> {
    let temp = tempdir()?;
    let native = helper::native_dir(
        &temp,
        "native",
        &[("assets/a.png", ""), ("assets/b.png", ""), ("assets/notes.txt", "")],
    )?;
    let memory = Arc::new(
        MemoryFs::new()
            .with_file("assets/b.png", "")?
            .with_file("assets/c.png", "")?,
    );

    let mut fs = MultiFs::new();
    fs.insert(native, Priority::Last);
    fs.insert(memory, Priority::Last);

    let matches = fs.glob("assets/*.png")?;
    assert_eq!(matches, vec!["assets/a.png", "assets/b.png", "assets/c.png"]);

    let matches = fs.glob("/assets/[!a-b]*")?;
    assert_eq!(matches, vec!["assets/notes.txt", "assets/c.png"]);

    assert!(fs.glob("assets/*.gif").unwrap_err().is_not_found());

    Ok(())
}

#[test_log::test]
fn test_multifs_read_dir_is_not_merged() -> anyhow::Result<()> {
    let temp = tempdir()?;
    let first = helper::native_dir(&temp, "first", &[("d/b", ""), ("d/a", "")])?;
    let second = helper::native_dir(&temp, "second", &[("d/c", ""), ("e/f", "")])?;

    let mut fs = MultiFs::new();
    fs.insert(first, Priority::Last);
    fs.insert(second, Priority::Last);

    let names: Vec<_> = fs
        .read_dir("d")?
        .iter()
        .map(|entry| entry.get_name().to_string())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(fs.read_dir("e")?.len(), 1);

    Ok(())
}

#[test_log::test]
fn test_multifs_from_config_file() -> anyhow::Result<()> {
    let temp = tempdir()?;
    helper::native_dir(&temp, "defaults", &[("app.toml", "defaults")])?;
    helper::native_dir(&temp, "overrides", &[("app.toml", "overrides")])?;

    let config_path = temp.path().join("multifs.toml");
    fs::write(
        &config_path,
        r#"
        [[sources]]
        path = "defaults"

        [[sources]]
        path = "overrides"
        priority = 0
        "#,
    )?;

    let fs = MultiFsConfig::load(&config_path)?.build()?;
    assert_eq!(fs.len(), 2);
    assert_eq!(fs.read_file("app.toml")?, b"overrides");

    Ok(())
}

#[cfg(unix)]
#[test_log::test]
fn test_multifs_walk_terminates_on_cyclic_symlinks() -> anyhow::Result<()> {
    let temp = tempdir()?;
    let native = helper::native_dir(&temp, "root", &[("a/f", "f")])?;
    std::os::unix::fs::symlink("..", temp.path().join("root/a/loop"))?;
    std::os::unix::fs::symlink("..", temp.path().join("root/a/loop2"))?;

    let mut fs = MultiFs::new();
    fs.add(native);

    let mut seen = Vec::new();
    fs.walk("", |path, metadata, error| {
        assert!(error.is_none(), "{path}: {error:?}");
        seen.push((path.to_string(), metadata.is_some_and(|m| m.is_symlink())));
        WalkControl::Continue
    })?;

    assert_eq!(
        seen,
        vec![
            (String::new(), false),
            ("a".to_string(), false),
            ("a/f".to_string(), false),
            ("a/loop".to_string(), true),
            ("a/loop2".to_string(), true),
        ]
    );

    // The link still resolves for direct reads
    assert_eq!(fs.read_file("a/loop/a/f")?, b"f");

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Helpers
//--------------------------------------------------------------------------------------------------

mod helper {
    use super::*;

    /// Creates `name` under `temp` holding `files` and returns it as a registered-ready source.
    pub(super) fn native_dir(
        temp: &TempDir,
        name: &str,
        files: &[(&str, &str)],
    ) -> anyhow::Result<BackendRef> {
        let root = temp.path().join(name);
        fs::create_dir_all(&root)?;
        for (path, content) in files {
            let file = root.join(path);
            if let Some(parent) = file.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(file, content)?;
        }

        Ok(Arc::new(NativeFs::new(root)))
    }
}
