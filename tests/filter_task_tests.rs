//! Tests for filter tasks

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use deployconf::config::xml::Element;
    use deployconf::group::{ConfigGroup as _, ConfigGroupManager as _, MemoryConfigGroupManager};
    use deployconf::task::filter::DEFAULT_ENCODING;
    use deployconf::task::{ConfigItem, FilterTask, FilterToken};
    use regex::Regex;

    fn token(name: &str, pattern: &str, value: Option<&str>) -> FilterToken {
        let mut item = ConfigItem::new(name);
        item.description = Some(format!("The {name} token"));
        item.value = value.map(str::to_owned);
        FilterToken::new(item, Regex::new(pattern).unwrap())
    }

    fn task_with(tokens: Vec<FilterToken>) -> FilterTask {
        let mut task = FilterTask::new("WEB-INF/web.xml");
        for token in tokens {
            assert!(task.add_token(token));
        }
        task
    }

    fn apply_bytes(task: &FilterTask, source: &[u8], groups: &mut MemoryConfigGroupManager) -> Vec<u8> {
        let mut out = Vec::new();
        task.apply(&mut &source[..], &mut out, groups).unwrap();
        out
    }

    fn apply(task: &FilterTask, source: &str, groups: &mut MemoryConfigGroupManager) -> String {
        String::from_utf8(apply_bytes(task, source.as_bytes(), groups)).unwrap()
    }

    #[test]
    fn test_apply_regex_token() {
        let task = task_with(vec![token("test-name", "d..a", Some("value"))]);
        let mut groups = MemoryConfigGroupManager::new();

        assert_eq!(apply(&task, "test-data", &mut groups), "test-value\n");
    }

    #[test]
    fn test_apply_replaces_every_match_on_every_line() {
        let task = task_with(vec![token("host", "@HOST@", Some("db.local"))]);
        let mut groups = MemoryConfigGroupManager::new();

        assert_eq!(
            apply(&task, "a=@HOST@ b=@HOST@\nnone\nc=@HOST@", &mut groups),
            "a=db.local b=db.local\nnone\nc=db.local\n"
        );
    }

    #[test]
    fn test_apply_normalizes_line_endings() {
        let task = task_with(vec![token("t", "X", Some("y"))]);
        let mut groups = MemoryConfigGroupManager::new();

        assert_eq!(
            apply(&task, "one X\r\ntwo\rthree X\n", &mut groups),
            "one y\ntwo\nthree y\n"
        );
        assert_eq!(apply(&task, "", &mut groups), "");
        assert_eq!(apply(&task, "\n\n", &mut groups), "\n\n");
    }

    #[test]
    fn test_apply_tokens_in_order() {
        let task = task_with(vec![
            token("first", "A", Some("B")),
            token("second", "B", Some("C")),
        ]);
        let mut groups = MemoryConfigGroupManager::new();

        assert_eq!(apply(&task, "A B", &mut groups), "C C\n");
    }

    #[test]
    fn test_apply_inserts_values_literally() {
        let task = task_with(vec![token("price", "(PRICE)", Some("$1 and ${x}"))]);
        let mut groups = MemoryConfigGroupManager::new();

        assert_eq!(apply(&task, "cost: PRICE", &mut groups), "cost: $1 and ${x}\n");
    }

    #[test]
    fn test_apply_skips_inactive_tokens() {
        let mut inactive = token("t", "X", Some("y"));
        inactive.item.condition = Some("false".to_owned());
        let task = task_with(vec![inactive]);
        let mut groups = MemoryConfigGroupManager::new();

        assert_eq!(apply(&task, "X", &mut groups), "X\n");
    }

    #[test]
    fn test_apply_uses_group_value() {
        let mut grouped = token("port", "@PORT@", Some("80"));
        grouped.item.group = Some("net".to_owned());
        let task = task_with(vec![grouped]);

        let mut groups = MemoryConfigGroupManager::new();
        groups
            .lookup_group("net")
            .unwrap()
            .set_property("port", Some("8080"))
            .unwrap();

        assert_eq!(apply(&task, "port=@PORT@", &mut groups), "port=8080\n");
    }

    #[test]
    fn test_apply_with_latin1_encoding() {
        let task = task_with(vec![token("city", "@CITY@", Some("M\u{e4}lm\u{f6}"))])
            .with_encoding("ISO-8859-1")
            .unwrap();
        let mut groups = MemoryConfigGroupManager::new();

        let out = apply_bytes(&task, b"caf\xe9 @CITY@", &mut groups);
        assert_eq!(out, b"caf\xe9 M\xe4lm\xf6\n");
    }

    #[test]
    fn test_apply_keeps_utf16_encoding() {
        fn utf16le(text: &str) -> Vec<u8> {
            text.encode_utf16().flat_map(u16::to_le_bytes).collect()
        }
        fn utf16be(text: &str) -> Vec<u8> {
            text.encode_utf16().flat_map(u16::to_be_bytes).collect()
        }
        let mut groups = MemoryConfigGroupManager::new();

        let little = task_with(vec![token("t", "d..a", Some("value"))])
            .with_encoding("UTF-16LE")
            .unwrap();
        let out = apply_bytes(&little, &utf16le("test-data"), &mut groups);
        assert_eq!(out, utf16le("test-value\n"));

        let big = task_with(vec![token("t", "d..a", Some("v\u{e4}lue"))])
            .with_encoding("UTF-16BE")
            .unwrap();
        let out = apply_bytes(&big, &utf16be("test-data\r\nend"), &mut groups);
        assert_eq!(out, utf16be("test-v\u{e4}lue\nend\n"));
    }

    #[test]
    fn test_replacement_encoding_is_rejected() {
        let err = FilterTask::new("a.txt").with_encoding("ISO-2022-KR").unwrap_err();
        assert!(err.to_string().contains("Unsupported encoding"));
    }

    #[test]
    fn test_unknown_encoding_is_rejected() {
        let err = FilterTask::new("a.txt").with_encoding("NOT-A-CHARSET").unwrap_err();
        assert!(err.to_string().contains("Unknown encoding"));
    }

    #[test]
    fn test_is_configured() {
        let mut groups = MemoryConfigGroupManager::new();
        let task = task_with(vec![token("a", "A", Some("1")), token("b", "B", None)]);
        assert!(!task.is_configured(&mut groups).unwrap());

        let task = task_with(vec![token("a", "A", Some("1"))]);
        assert!(task.is_configured(&mut groups).unwrap());
    }

    #[test]
    fn test_merge_takes_regex_and_encoding() {
        let mut persisted = task_with(vec![
            token("kept", "OLD", Some("entered")),
            token("dropped", "D", Some("x")),
        ]);
        let template = task_with(vec![token("kept", "NEW", None), token("added", "N", None)])
            .with_encoding("ISO-8859-1")
            .unwrap();

        persisted.merge(template);

        let names: Vec<&str> = persisted.tokens().map(FilterToken::name).collect();
        assert_eq!(names, vec!["kept", "added"]);
        let kept = persisted.token("kept").unwrap();
        assert_eq!(kept.regex.as_str(), "NEW");
        assert_eq!(kept.item.value.as_deref(), Some("entered"));
        assert_eq!(persisted.encoding(), "ISO-8859-1");
    }

    #[test]
    fn test_deserialize_and_serialize() {
        let document = r#"<filter path="WEB-INF/web.xml" encoding="ISO-8859-1">
            <token>
                <name>context</name>
                <regex>@CONTEXT@</regex>
                <description>Context path</description>
                <value>/app</value>
            </token>
        </filter>"#;
        let task = FilterTask::deserialize(&Element::parse(document).unwrap()).unwrap();

        assert_eq!(task.path(), "WEB-INF/web.xml");
        assert_eq!(task.encoding(), "ISO-8859-1");
        let context = task.token("context").unwrap();
        assert_eq!(context.regex.as_str(), "@CONTEXT@");
        assert_eq!(context.item.value.as_deref(), Some("/app"));

        let serialized = task.serialize();
        assert_eq!(serialized.attribute("encoding"), Some("ISO-8859-1"));
        let names: Vec<&str> = serialized.children[0]
            .children
            .iter()
            .map(|child| child.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["name", "regex", "description", "default", "condition", "value"]
        );
    }

    #[test]
    fn test_deserialize_defaults_encoding() {
        let element = Element::parse("<filter path=\"a.txt\"/>").unwrap();
        let task = FilterTask::deserialize(&element).unwrap();
        assert_eq!(task.encoding(), DEFAULT_ENCODING);
        assert_eq!(task.tokens().count(), 0);
    }

    #[test]
    fn test_deserialize_errors() {
        let no_path = Element::parse("<filter/>").unwrap();
        assert!(FilterTask::deserialize(&no_path).is_err());

        let bad_regex = Element::parse(
            "<filter path=\"a\"><token><name>t</name><regex>(</regex><description>d</description></token></filter>",
        )
        .unwrap();
        let err = FilterTask::deserialize(&bad_regex).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid regex"));

        let no_regex = Element::parse(
            "<filter path=\"a\"><token><name>t</name><description>d</description></token></filter>",
        )
        .unwrap();
        assert!(FilterTask::deserialize(&no_regex).is_err());
    }
}
