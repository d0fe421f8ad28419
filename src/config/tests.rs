use clap::Parser;

use super::*;

fn raw_with_backend(url: &str, api_key: Option<&str>) -> RawSettings {
    let mut raw = RawSettings::default();
    raw.backend.url = Some(url.to_string());
    raw.backend.api_key = api_key.map(str::to_string);
    raw
}

#[test]
fn defaults_select_local_store_with_demo_content() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    assert!(settings.backend.is_none());
    assert!(settings.local.seed_demo_content);
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = raw_with_backend("https://old.example.com", Some("old-key"));
    raw.logging.level = Some("info".to_string());

    let overrides = Overrides {
        log_level: Some("debug".to_string()),
        backend_url: Some("https://project.supabase.co".to_string()),
        backend_api_key: Some("anon".to_string()),
        ..Default::default()
    };
    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    match settings.backend {
        Some(BackendSettings::Rest(rest)) => {
            assert_eq!(rest.url.host_str(), Some("project.supabase.co"));
            assert_eq!(rest.api_key, "anon");
            assert_eq!(rest.access_token, None);
        }
        other => panic!("expected REST backend, got {other:?}"),
    }
}

#[test]
fn rest_backend_without_key_falls_back_to_local() {
    let raw = raw_with_backend("https://project.supabase.co", Some("  "));
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.backend.is_none());
}

#[test]
fn postgres_url_needs_no_key() {
    let mut raw = raw_with_backend("postgres://kaizen@localhost/content", None);
    raw.backend.max_connections = Some(2);
    let settings = Settings::from_raw(raw).expect("valid settings");

    match settings.backend {
        Some(BackendSettings::Postgres(pg)) => {
            assert_eq!(pg.url, "postgres://kaizen@localhost/content");
            assert_eq!(pg.max_connections.get(), 2);
        }
        other => panic!("expected postgres backend, got {other:?}"),
    }
}

#[test]
fn zero_pool_size_is_rejected() {
    let mut raw = raw_with_backend("postgresql://localhost/content", None);
    raw.backend.max_connections = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero connections rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "backend.max_connections",
            ..
        }
    ));
}

#[test]
fn unsupported_scheme_is_rejected() {
    let raw = raw_with_backend("ftp://files.example.com", Some("key"));
    let err = Settings::from_raw(raw).expect_err("ftp rejected");
    assert!(matches!(err, LoadError::Invalid { key: "backend.url", .. }));
}

#[test]
fn local_only_ignores_configured_backend() {
    let mut raw = raw_with_backend("https://project.supabase.co", Some("anon"));
    raw.apply_overrides(&Overrides {
        local_only: true,
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.backend.is_none());
}

#[test]
fn invalid_log_level_is_reported() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());
    let err = Settings::from_raw(raw).expect_err("unknown level");
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.apply_overrides(&Overrides {
        log_json: Some(true),
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn parse_list_arguments_with_global_flags() {
    let args = CliArgs::parse_from(["kaizen", "list", "course-videos", "--degraded", "--local-only"]);
    assert!(args.overrides.local_only);
    match args.command {
        Command::List(list) => {
            assert_eq!(list.entity, EntityArg::CourseVideos);
            assert!(list.degraded);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn parse_update_arguments() {
    let args = CliArgs::parse_from([
        "kaizen",
        "--backend-url",
        "https://project.supabase.co",
        "update",
        "blog-posts",
        "42",
        "--file",
        "patch.json",
    ]);
    assert_eq!(
        args.overrides.backend_url.as_deref(),
        Some("https://project.supabase.co")
    );
    match args.command {
        Command::Update(update) => {
            assert_eq!(update.entity, EntityArg::BlogPosts);
            assert_eq!(update.id, "42");
            assert_eq!(update.file, std::path::PathBuf::from("patch.json"));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn parse_set_active_arguments() {
    let args = CliArgs::parse_from(["kaizen", "set-active", "3", "yes"]);
    match args.command {
        Command::SetActive(set) => {
            assert_eq!(set.id, "3");
            assert!(set.active);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn entity_arguments_map_to_kinds() {
    use crate::domain::entities::EntityKind;

    assert_eq!(EntityKind::from(EntityArg::BookingForms), EntityKind::BookingForm);
    assert_eq!(EntityKind::from(EntityArg::Videos).table(), "videos");
}
