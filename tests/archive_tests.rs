//! Tests for zip archive reading and rewriting

mod common;

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::common::{build_zip, read_zip, zip_entry};
    use deployconf::config::DeploymentConfig;
    use deployconf::error::DeployError;
    use deployconf::group::MemoryConfigGroupManager;
    use deployconf::operations::archive::{read_entry, rewrite_archive};
    use deployconf::task::{ConfigItem, FilterTask, FilterToken, PropertiesTask, Property, Task};
    use regex::Regex;
    use std::io::{Cursor, Write as _};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipArchive, ZipWriter};

    const TEMPLATE_ENTRY: &str = "META-INF/deployment-template.xml";

    fn item(name: &str, value: &str) -> ConfigItem {
        let mut item = ConfigItem::new(name);
        item.value = Some(value.to_owned());
        item
    }

    fn properties_task(path: Option<&str>, name: &str, value: &str) -> Task {
        let mut task = PropertiesTask::new(path.map(str::to_owned));
        task.add_property(Property::new(item(name, value)));
        Task::Properties(task)
    }

    fn filter_task(path: &str, pattern: &str, value: &str) -> Task {
        let mut task = FilterTask::new(path);
        task.add_token(FilterToken::new(
            item("token", value),
            Regex::new(pattern).unwrap(),
        ));
        Task::Filter(task)
    }

    fn rewrite(source: Vec<u8>, tasks: &[Task]) -> Vec<u8> {
        let mut groups = MemoryConfigGroupManager::new();
        rewrite_archive(
            Cursor::new(source),
            Cursor::new(Vec::new()),
            TEMPLATE_ENTRY,
            tasks,
            &mut groups,
        )
        .unwrap()
        .into_inner()
    }

    #[test]
    fn test_read_entry() {
        let zip = build_zip(&[("a.txt", b"alpha"), ("dir/b.txt", b"beta")]);

        assert_eq!(
            read_entry(Cursor::new(zip.clone()), "dir/b.txt").unwrap(),
            Some(b"beta".to_vec())
        );
        assert_eq!(read_entry(Cursor::new(zip), "missing.txt").unwrap(), None);
    }

    #[test]
    fn test_read_entry_rejects_non_zip() {
        let err = read_entry(Cursor::new(b"plain text".to_vec()), "a").unwrap_err();
        assert_eq!(err.downcast_ref::<DeployError>().unwrap().exit_code(), 4);
    }

    #[test]
    fn test_rewrite_copies_untouched_entries_and_drops_template() {
        let source = build_zip(&[
            ("index.html", b"<html/>"),
            (TEMPLATE_ENTRY, b"<deployconf/>"),
            ("lib/app.jar", &[0_u8, 1, 2, 3]),
        ]);

        let rewritten = rewrite(source, &[]);

        assert_eq!(
            read_zip(&rewritten),
            vec![
                ("index.html".to_owned(), b"<html/>".to_vec()),
                ("lib/app.jar".to_owned(), vec![0, 1, 2, 3]),
            ]
        );
    }

    #[test]
    fn test_rewrite_applies_tasks_in_place() {
        let source = build_zip(&[
            ("first.txt", b"x"),
            ("conf/app.properties", b"old=content\n"),
            ("web.xml", b"<ctx>@CTX@</ctx>\r\n"),
            ("last.txt", b"y"),
        ]);
        let tasks = vec![
            properties_task(Some("conf/app.properties"), "mode", "prod"),
            filter_task("web.xml", "@CTX@", "/shop"),
        ];

        let rewritten = rewrite(source, &tasks);
        let names: Vec<String> = read_zip(&rewritten).into_iter().map(|(name, _)| name).collect();

        assert_eq!(
            names,
            vec!["first.txt", "conf/app.properties", "web.xml", "last.txt"]
        );
        assert_eq!(
            zip_entry(&rewritten, "conf/app.properties").unwrap(),
            b"\nmode=prod\n"
        );
        assert_eq!(zip_entry(&rewritten, "web.xml").unwrap(), b"<ctx>/shop</ctx>\n");
    }

    #[test]
    fn test_rewrite_ignores_tasks_without_entry() {
        let source = build_zip(&[("a.txt", b"a")]);
        let tasks = vec![
            properties_task(Some("not/in/archive.properties"), "k", "v"),
            properties_task(None, "k", "v"),
        ];

        let rewritten = rewrite(source, &tasks);
        assert_eq!(read_zip(&rewritten), vec![("a.txt".to_owned(), b"a".to_vec())]);
    }

    #[test]
    fn test_rewrite_keeps_entry_metadata() {
        const EXTRA: [u8; 7] = [0x66, 0x66, 3, 0, 1, 2, 3];

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut filtered = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(0o640)
            .into_full_options()
            .with_file_comment("filtered entry");
        filtered.add_extra_data(0x6666, [1_u8, 2, 3], false).unwrap();
        writer.start_file("stored.txt", filtered).unwrap();
        writer.write_all(b"@V@").unwrap();

        let mut untouched = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .into_full_options()
            .with_file_comment("untouched entry");
        untouched.add_extra_data(0x6666, [1_u8, 2, 3], false).unwrap();
        writer.start_file("copied.bin", untouched).unwrap();
        writer.write_all(&[7_u8; 64]).unwrap();

        let mut directory = SimpleFileOptions::default().into_full_options();
        directory.add_extra_data(0x6666, [1_u8, 2, 3], false).unwrap();
        writer.add_directory("conf/", directory).unwrap();

        writer
            .start_file(
                "plain.txt",
                SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
            )
            .unwrap();
        writer.write_all(b"plain").unwrap();
        let source = writer.finish().unwrap().into_inner();

        let rewritten = rewrite(source, &[filter_task("stored.txt", "@V@", "value")]);

        let mut archive = ZipArchive::new(Cursor::new(rewritten.clone())).unwrap();
        let stored = archive.by_name("stored.txt").unwrap();
        assert_eq!(stored.compression(), CompressionMethod::Stored);
        assert_eq!(stored.unix_mode().map(|mode| mode & 0o777), Some(0o640));
        assert_eq!(stored.comment(), "filtered entry");
        assert_eq!(stored.extra_data(), Some(&EXTRA[..]));
        drop(stored);

        let copied = archive.by_name("copied.bin").unwrap();
        assert_eq!(copied.compression(), CompressionMethod::Deflated);
        assert_eq!(copied.comment(), "untouched entry");
        assert_eq!(copied.extra_data(), Some(&EXTRA[..]));
        drop(copied);

        let directory = archive.by_name("conf/").unwrap();
        assert!(directory.is_dir());
        assert_eq!(directory.extra_data(), Some(&EXTRA[..]));
        drop(directory);

        let plain = archive.by_name("plain.txt").unwrap();
        assert_eq!(plain.compression(), CompressionMethod::Stored);
        drop(plain);

        assert_eq!(zip_entry(&rewritten, "stored.txt").unwrap(), b"value\n");
        assert_eq!(zip_entry(&rewritten, "copied.bin").unwrap(), vec![7_u8; 64]);
    }

    #[test]
    fn test_config_apply_delegates_to_rewrite() {
        let mut config = DeploymentConfig::default();
        config.add_task(properties_task(Some("p.properties"), "k", "v"));
        let source = build_zip(&[("p.properties", b""), (TEMPLATE_ENTRY, b"")]);

        let mut groups = MemoryConfigGroupManager::new();
        let rewritten = config
            .apply(
                Cursor::new(source),
                Cursor::new(Vec::new()),
                TEMPLATE_ENTRY,
                &mut groups,
            )
            .unwrap()
            .into_inner();

        assert_eq!(
            read_zip(&rewritten),
            vec![("p.properties".to_owned(), b"\nk=v\n".to_vec())]
        );
    }

    #[test]
    fn test_rewrite_rejects_non_zip_source() {
        let mut groups = MemoryConfigGroupManager::new();
        let err = rewrite_archive(
            Cursor::new(b"not a zip".to_vec()),
            Cursor::new(Vec::new()),
            TEMPLATE_ENTRY,
            &[],
            &mut groups,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeployError>(),
            Some(DeployError::Archive { .. })
        ));
    }
}
