//! Helpers shared by the integration tests

#![allow(dead_code, clippy::unwrap_used)]

use anyhow::Result;
use deployconf::interactive::InteractiveConfigurer;
use std::collections::VecDeque;
use std::io::{Cursor, Read as _, Write as _};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Template with one properties task for `deploy.properties` and one property `x`
pub const SIMPLE_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<deployconf>
    <properties path="deploy.properties">
        <property>
            <name>x</name>
            <description>The x value</description>
            <default></default>
        </property>
    </properties>
</deployconf>
"#;

/// Persisted config answering `x` of `SIMPLE_TEMPLATE`
pub fn simple_config(value: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<deployconf>
    <properties path="deploy.properties">
        <property>
            <name>x</name>
            <description>The x value</description>
            <default></default>
            <condition></condition>
            <value>{value}</value>
        </property>
    </properties>
</deployconf>
"#
    )
}

/// Build a deflated zip archive in memory
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// All entries of an in-memory zip archive, in archive order
pub fn read_zip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entries = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).unwrap();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        entries.push((entry.name().to_owned(), content));
    }
    entries
}

/// Content of a named entry of an in-memory zip archive
pub fn zip_entry(bytes: &[u8], name: &str) -> Option<Vec<u8>> {
    read_zip(bytes)
        .into_iter()
        .find(|(entry, _)| entry == name)
        .map(|(_, content)| content)
}

/// Configurer answering from a script and recording every question
#[derive(Debug, Default)]
pub struct ScriptedConfigurer {
    answers: VecDeque<Option<String>>,
    pub asked: Vec<(String, Option<String>)>,
    pub preambles: usize,
}

impl ScriptedConfigurer {
    pub fn new(answers: &[Option<&str>]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|answer| answer.map(str::to_owned))
                .collect(),
            ..Self::default()
        }
    }

    pub fn asked_names(&self) -> Vec<&str> {
        self.asked.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl InteractiveConfigurer for ScriptedConfigurer {
    fn preamble(&mut self) -> Result<()> {
        self.preambles += 1;
        Ok(())
    }

    fn configure(
        &mut self,
        name: &str,
        _description: Option<&str>,
        default: Option<&str>,
    ) -> Result<Option<String>> {
        self.asked
            .push((name.to_owned(), default.map(str::to_owned)));
        Ok(self.answers.pop_front().flatten())
    }
}
