//! Integration Tests for the Lookup Flow
//!
//! These tests drive the whole action (extract, fetch, present) against
//! scripted processes and in-memory surfaces.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use manlook::presenter::BufferSurfaceFactory;
use manlook::{LookupOutcome, Session, StaticContext};
use std::sync::Arc;
use std::time::Duration;
use test_utils::{lookup_action, MockSpawner, Script, OPEN_PAGE};

fn factory() -> Arc<BufferSurfaceFactory> {
    Arc::new(BufferSurfaceFactory::new())
}

#[tokio::test]
async fn test_lookup_presents_cleaned_page() {
    let spawner = MockSpawner::always(Script::exit(0, OPEN_PAGE, ""));
    let surfaces = factory();
    let action = lookup_action(spawner.clone(), surfaces.clone(), 1000);

    let session = Session::new("project");
    let ctx = StaticContext::new(session, "int fd = Open(path, O_RDONLY);", 10);

    let outcome = action.trigger(&ctx).await;
    assert_eq!(
        outcome,
        LookupOutcome::Presented {
            term: "open".to_string()
        }
    );

    let spawned = spawner.spawned();
    assert_eq!(spawned.len(), 1);
    assert_eq!(spawned[0].program, "man");
    assert_eq!(spawned[0].args, vec!["-S", "2:3", "open"]);

    let view = surfaces.latest().expect("surface created");
    assert_eq!(
        view.content(),
        "NAME\n       open - open and possibly create a file"
    );
    assert_eq!(view.title(), "man open");
    assert_eq!(view.scroll_line(), 0);
    assert_eq!(view.activations(), 1);
    assert!(!view.is_focused());
}

#[tokio::test]
async fn test_selection_wins_over_caret() {
    let spawner = MockSpawner::always(Script::exit(0, "FOPEN(3)", ""));
    let surfaces = factory();
    let action = lookup_action(spawner.clone(), surfaces.clone(), 1000);

    let ctx = StaticContext::new(Session::new("project"), "read(fd, buf, n);", 2)
        .with_selection("FOpen");

    let outcome = action.trigger(&ctx).await;
    assert_eq!(
        outcome,
        LookupOutcome::Presented {
            term: "fopen".to_string()
        }
    );
    assert_eq!(spawner.spawned()[0].args.last().map(String::as_str), Some("fopen"));
    assert_eq!(surfaces.latest().unwrap().title(), "man fopen");
}

#[tokio::test]
async fn test_nothing_under_caret_is_skipped() {
    let spawner = MockSpawner::always(Script::exit(0, "unused", ""));
    let surfaces = factory();
    let action = lookup_action(spawner.clone(), surfaces.clone(), 1000);

    let ctx = StaticContext::new(Session::new("project"), "a  +  b", 3);

    assert_eq!(action.trigger(&ctx).await, LookupOutcome::Skipped);
    assert_eq!(spawner.spawn_count(), 0);
    assert!(surfaces.created().is_empty());
}

#[tokio::test]
async fn test_repeated_lookups_reuse_one_surface() {
    let spawner = MockSpawner::sequence(
        vec![
            Script::exit(0, "first\npage\nwith\nlines", ""),
            Script::exit(0, "second page", ""),
        ],
        Script::hang(),
    );
    let surfaces = factory();
    let action = lookup_action(spawner, surfaces.clone(), 1000);
    let session = Session::new("project");

    let first = StaticContext::new(session.clone(), "read", 0);
    let second = StaticContext::new(session.clone(), "write", 0);

    action.trigger(&first).await;
    action.trigger(&second).await;

    let created = surfaces.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].content(), "second page");
    assert_eq!(created[0].title(), "man write");
    assert_eq!(created[0].scroll_line(), 0);
    assert_eq!(created[0].activations(), 2);
}

#[tokio::test]
async fn test_close_button_then_lookup_recreates_surface() {
    let spawner = MockSpawner::always(Script::exit(0, "page", ""));
    let surfaces = factory();
    let action = lookup_action(spawner, surfaces.clone(), 1000);
    let ctx = StaticContext::new(Session::new("project"), "close", 0);

    action.trigger(&ctx).await;
    let first = surfaces.latest().unwrap();
    assert!(first.click_close());
    assert!(first.is_released());

    action.trigger(&ctx).await;
    let created = surfaces.created();
    assert_eq!(created.len(), 2);
    assert_ne!(created[0].id(), created[1].id());
    assert!(!created[1].is_released());
    assert_eq!(created[1].content(), "page");
}

#[tokio::test]
async fn test_sessions_get_their_own_surfaces() {
    let spawner = MockSpawner::always(Script::exit(0, "page", ""));
    let surfaces = factory();
    let action = lookup_action(spawner, surfaces.clone(), 1000);

    let a = StaticContext::new(Session::new("a"), "open", 0);
    let b = StaticContext::new(Session::new("b"), "open", 0);

    action.trigger(&a).await;
    action.trigger(&b).await;
    action.trigger(&a).await;

    assert_eq!(surfaces.created().len(), 2);
}

#[tokio::test]
async fn test_session_close_releases_surface() {
    let spawner = MockSpawner::always(Script::exit(0, "page", ""));
    let surfaces = factory();
    let action = lookup_action(spawner, surfaces.clone(), 1000);
    let session = Session::new("project");
    let ctx = StaticContext::new(session.clone(), "open", 0);

    action.trigger(&ctx).await;
    session.close();

    assert!(surfaces.latest().unwrap().is_released());
}

#[tokio::test]
async fn test_slow_lookup_is_superseded_by_newer_one() {
    let spawner = MockSpawner::sequence(
        vec![
            Script::exit(0, "old page", "").after(Duration::from_millis(300)),
            Script::exit(0, "new page", ""),
        ],
        Script::hang(),
    );
    let surfaces = factory();
    let action = lookup_action(spawner, surfaces.clone(), 2000);
    let session = Session::new("project");

    let older = StaticContext::new(session.clone(), "read", 0);
    let newer = StaticContext::new(session.clone(), "write", 0);

    let (older_outcome, newer_outcome) =
        tokio::join!(action.trigger(&older), action.trigger(&newer));

    assert_eq!(
        older_outcome,
        LookupOutcome::Superseded {
            term: "read".to_string()
        }
    );
    assert_eq!(
        newer_outcome,
        LookupOutcome::Presented {
            term: "write".to_string()
        }
    );

    let view = surfaces.latest().unwrap();
    assert_eq!(surfaces.created().len(), 1);
    assert_eq!(view.content(), "new page");
    assert_eq!(view.title(), "man write");
}

#[tokio::test]
async fn test_spawned_lookup_runs_in_background() {
    let spawner = MockSpawner::always(Script::exit(0, "page", ""));
    let surfaces = factory();
    let action = Arc::new(lookup_action(spawner, surfaces.clone(), 1000));

    let ctx = Arc::new(StaticContext::new(Session::new("project"), "stat", 0));
    let outcome = action.spawn(ctx).await.expect("lookup task panicked");

    assert_eq!(
        outcome,
        LookupOutcome::Presented {
            term: "stat".to_string()
        }
    );
    assert_eq!(surfaces.latest().unwrap().title(), "man stat");
}
