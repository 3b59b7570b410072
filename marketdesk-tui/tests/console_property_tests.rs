use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use marketdesk_core::{PageRequest, RemoteCollectionController, SortDirection};
use marketdesk_tui::config::{ConfigError, ConsoleConfig};
use marketdesk_tui::keys::{map_key, Action};
use marketdesk_tui::nav::ScreenKind;
use marketdesk_tui::notifications::{Notification, NotificationAction, NotificationLevel};
use marketdesk_tui::persistence::{self, PersistedState};
use marketdesk_tui::theme::{level_color, status_color, ConsoleTheme};
use marketdesk_tui::views::resource::status_options;
use proptest::prelude::*;

fn base_config() -> ConsoleConfig {
    ConsoleConfig {
        api_base_url: "http://localhost:5000/api".to_string(),
        request_timeout_ms: 5_000,
        default_page_size: 10,
        token_path: "tmp/marketdesk/token".into(),
        persistence_path: "tmp/marketdesk/state.json".into(),
        log_path: "tmp/marketdesk/console.log".into(),
        log_filter: None,
    }
}

#[test]
fn base_config_is_valid() {
    assert!(base_config().validate().is_ok());
}

#[test]
fn config_requires_http_base_url() {
    let mut config = base_config();
    config.api_base_url = "localhost:5000".to_string();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            field: "api_base_url",
            ..
        })
    ));
}

#[test]
fn config_requires_timeout() {
    let mut config = base_config();
    config.request_timeout_ms = 0;
    assert!(config.validate().is_err());
}

#[test]
fn config_rejects_blank_log_filter() {
    let mut config = base_config();
    config.log_filter = Some("  ".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn config_file_rejects_unknown_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("console.toml");
    std::fs::write(
        &path,
        r#"
api_base_url = "http://localhost:5000/api"
request_timeout_ms = 5000
default_page_size = 10
token_path = "token"
persistence_path = "state.json"
log_path = "console.log"
theme = "dark"
"#,
    )
    .expect("write config");
    assert!(matches!(
        ConsoleConfig::from_path(&path),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn config_file_round_trips_into_client_settings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("console.toml");
    std::fs::write(
        &path,
        r#"
api_base_url = "https://admin.example.com/api"
request_timeout_ms = 2500
default_page_size = 20
token_path = "token"
persistence_path = "state.json"
log_path = "console.log"
log_filter = "marketdesk_tui=debug"
"#,
    )
    .expect("write config");
    let config = ConsoleConfig::from_path(&path).expect("parse");
    assert!(config.validate().is_ok());
    let settings = config.client_settings();
    assert_eq!(settings.api_base_url, "https://admin.example.com/api");
    assert_eq!(settings.request_timeout.as_millis(), 2500);
}

#[test]
fn missing_persisted_state_is_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loaded = persistence::load(&dir.path().join("absent.json")).expect("load");
    assert!(loaded.is_none());
}

#[test]
fn persisted_state_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("state.json");
    let state = PersistedState {
        active_screen: ScreenKind::Bookings,
        page_size: 50,
    };
    persistence::save(&path, &state).expect("save");
    assert_eq!(persistence::load(&path).expect("load"), Some(state));
}

#[test]
fn corrupt_persisted_state_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{ not json").expect("write");
    assert!(persistence::load(&path).is_err());
}

#[test]
fn tab_switches_screens() {
    let event = KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE);
    assert_eq!(map_key(event), Some(Action::NextScreen));
    let event = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
    assert_eq!(map_key(event), Some(Action::PrevScreen));
}

#[test]
fn ctrl_c_quits() {
    let event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert_eq!(map_key(event), Some(Action::Quit));
}

#[test]
fn fresh_collection_status_line() {
    let controller: RemoteCollectionController<String> =
        RemoteCollectionController::new(PageRequest::new(10, "createdAt", SortDirection::Desc));
    let labels: Vec<String> = status_options(&controller)
        .into_iter()
        .map(|o| o.label)
        .collect();
    assert_eq!(labels[0], "page 1 / 1");
    assert!(labels.contains(&"status: all".to_string()));
    assert!(labels.contains(&"sort createdAt desc".to_string()));
    assert!(!labels.iter().any(|l| l.starts_with("search")));
}

#[test]
fn status_line_shows_active_filters() {
    let mut controller: RemoteCollectionController<String> =
        RemoteCollectionController::new(PageRequest::new(20, "price", SortDirection::Asc));
    let _ = controller.set_filter("status", "pending");
    let _ = controller.set_filter("search", "plumbing");
    let options = status_options(&controller);
    assert!(options
        .iter()
        .any(|o| o.active && o.label == "status: pending"));
    assert!(options
        .iter()
        .any(|o| o.active && o.label == "search: plumbing"));
    assert!(options.iter().any(|o| o.label == "20 per page"));
}

#[test]
fn unauthorized_failure_asks_for_sign_in() {
    let err = marketdesk_core::ConsoleError::application(Some(401), Some("Token expired".into()));
    let note = Notification::failure("Loading Users", &err);
    assert_eq!(note.level, NotificationLevel::Error);
    assert_eq!(note.action, Some(NotificationAction::SignIn));
    assert_eq!(note.message, "Loading Users: Token expired");
}

#[test]
fn transport_failure_uses_generic_text() {
    let err = marketdesk_core::ConsoleError::transport("connection refused");
    let note = Notification::failure("Loading Users", &err);
    assert!(note.action.is_none());
    assert!(!note.message.contains("connection refused"));
}

proptest! {
    #[test]
    fn keybinding_digit_switches_screen(digit in 1u8..=9u8) {
        let key = (b'0' + digit) as char;
        let event = KeyEvent {
            code: KeyCode::Char(key),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::empty(),
        };
        prop_assert_eq!(map_key(event), Some(Action::SwitchScreen((digit - 1) as usize)));
    }

    #[test]
    fn navigation_keys_consistent(use_vim in prop::bool::ANY) {
        let down = if use_vim {
            KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE)
        } else {
            KeyEvent::new(KeyCode::Down, KeyModifiers::NONE)
        };
        let next = if use_vim {
            KeyEvent::new(KeyCode::Char('l'), KeyModifiers::NONE)
        } else {
            KeyEvent::new(KeyCode::Right, KeyModifiers::NONE)
        };
        prop_assert_eq!(map_key(down), Some(Action::MoveDown));
        prop_assert_eq!(map_key(next), Some(Action::NextPage));
    }

    #[test]
    fn screen_keys_are_mapped(key in prop::sample::select(vec!['q', 's', 'f', 'c', '/', 'r', 'a', 'd', 'y', 'L', '+', '-'])) {
        let event = KeyEvent::new(KeyCode::Char(key), KeyModifiers::NONE);
        prop_assert!(map_key(event).is_some());
    }

    #[test]
    fn screen_cycle_returns_home(start in 0usize..7) {
        let kind = ScreenKind::from_index(start).expect("index in range");
        let mut next = kind;
        for _ in 0..ScreenKind::all().len() {
            next = next.next();
        }
        prop_assert_eq!(next, kind);
        prop_assert_eq!(kind.next().previous(), kind);
        prop_assert_eq!(kind.index(), start);
    }

    #[test]
    fn page_size_outside_range_rejected(size in prop_oneof![Just(0u32), 101u32..10_000]) {
        let mut config = base_config();
        config.default_page_size = size;
        prop_assert!(config.validate().is_err());
    }

    #[test]
    fn page_size_inside_range_accepted(size in 1u32..=100) {
        let mut config = base_config();
        config.default_page_size = size;
        prop_assert!(config.validate().is_ok());
    }

    #[test]
    fn status_colors_follow_state(status in prop::sample::select(vec!["active", "pending", "cancelled", "mystery"])) {
        let theme = ConsoleTheme::standard();
        let expected = match status {
            "active" => theme.success,
            "pending" => theme.warning,
            "cancelled" => theme.error,
            _ => theme.text_dim,
        };
        prop_assert_eq!(status_color(status, &theme), expected);
        prop_assert_eq!(status_color(&status.to_ascii_uppercase(), &theme), expected);
    }
}

#[test]
fn level_colors_are_distinct() {
    let theme = ConsoleTheme::standard();
    assert_ne!(
        level_color(NotificationLevel::Error, &theme),
        level_color(NotificationLevel::Success, &theme)
    );
}
