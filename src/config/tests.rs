use super::*;

#[test]
fn defaults_resolve_without_any_source() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::WARN);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.storage.backend, StorageBackend::File);
    assert_eq!(settings.storage.directory, PathBuf::from(".mosaico"));
    assert_eq!(settings.fixtures.location, "mock-api");
    assert!(settings.remote.enabled);
    assert_eq!(
        settings.remote.base_url.as_str(),
        "https://jsonplaceholder.typicode.com/"
    );
    assert_eq!(settings.remote.post_limit, 10);
    assert_eq!(settings.remote.comment_limit, 5);
    assert!(settings.remote.timeout.is_none());
    assert!(settings.query.enabled);
    assert_eq!(settings.query.stale_after_seconds, 30);
    assert_eq!(settings.query.capacity, 64);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.remote.enabled = Some(true);

    let overrides = GlobalOverrides {
        log_level: Some("debug".to_string()),
        remote_enabled: Some(false),
        storage_backend: Some("memory".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(!settings.remote.enabled);
    assert_eq!(settings.storage.backend, StorageBackend::Memory);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.apply_overrides(&GlobalOverrides {
        log_json: Some(true),
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn unknown_storage_backend_is_rejected() {
    let mut raw = RawSettings::default();
    raw.storage.backend = Some("sqlite".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid backend");
    assert!(matches!(err, LoadError::Invalid { key: "storage.backend", .. }));
}

#[test]
fn remote_base_url_must_be_http() {
    let mut raw = RawSettings::default();
    raw.remote.base_url = Some("ftp://example.com".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid scheme");
    assert!(matches!(err, LoadError::Invalid { key: "remote.base_url", .. }));
}

#[test]
fn zero_timeout_and_capacity_are_rejected() {
    let mut raw = RawSettings::default();
    raw.remote.timeout_seconds = Some(0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = RawSettings::default();
    raw.query.capacity = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn remote_timeout_is_optional() {
    let mut raw = RawSettings::default();
    raw.apply_overrides(&GlobalOverrides {
        remote_timeout_seconds: Some(5),
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.remote.timeout, Some(Duration::from_secs(5)));
}

#[test]
fn parse_posts_list_arguments() {
    let args = CliArgs::parse_from([
        "mosaico",
        "posts",
        "list",
        "--category",
        "Technology",
        "--search",
        "rust",
    ]);

    match args.command {
        Command::Posts(PostsArgs {
            command: PostsCommand::List(list),
        }) => {
            assert_eq!(list.category.as_deref(), Some("Technology"));
            assert_eq!(list.search.as_deref(), Some("rust"));
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
}

#[test]
fn parse_global_overrides_after_subcommand() {
    let args = CliArgs::parse_from([
        "mosaico",
        "categories",
        "--remote-enabled",
        "false",
        "--storage-directory",
        "/tmp/mosaico",
    ]);

    assert!(matches!(args.command, Command::Categories));
    assert_eq!(args.overrides.remote_enabled, Some(false));
    assert_eq!(
        args.overrides.storage_directory.as_deref(),
        Some(std::path::Path::new("/tmp/mosaico"))
    );
}

#[test]
fn parse_post_create_arguments() {
    let args = CliArgs::parse_from([
        "mosaico",
        "posts",
        "create",
        "--title",
        "Hello",
        "--content",
        "World",
        "--tag",
        "rust",
        "--tag",
        "cli",
        "--status",
        "draft",
    ]);

    match args.command {
        Command::Posts(PostsArgs {
            command: PostsCommand::Create(create),
        }) => {
            assert_eq!(create.title, "Hello");
            assert_eq!(create.content.as_deref(), Some("World"));
            assert_eq!(create.tags, vec!["rust", "cli"]);
            assert_eq!(create.status, StatusArg::Draft);
            assert_eq!(create.category, "General");
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
}

#[test]
fn post_create_requires_a_body() {
    let result = CliArgs::try_parse_from(["mosaico", "posts", "create", "--title", "Hello"]);
    assert!(result.is_err());
}

#[test]
fn parse_bookmark_toggle() {
    let args = CliArgs::parse_from(["mosaico", "bookmarks", "toggle", "json-1"]);
    match args.command {
        Command::Bookmarks(MarkArgs {
            command: MarkCommand::Toggle(target),
        }) => assert_eq!(target.id, "json-1"),
        other => panic!("wrong command parsed: {other:?}"),
    }
}
