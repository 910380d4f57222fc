//! Session behavior against the simulated TodoMVC page.
//!
//! Every test runs on a paused clock, so render latency costs no wall time.

use std::time::Duration;

use test_case::test_case;
use tickmark_common::{FilterKind, ObservedTask};
use tickmark_e2e::page::keys;
use tickmark_e2e::{
    selectors, settle, E2eError, EditGesture, Page, Probe, Session, SessionState, SettleConfig,
    SimulatedConfig, SimulatedPage, Step,
};

const URL: &str = "sim://todomvc/";

fn settle_config() -> SettleConfig {
    SettleConfig {
        timeout_ms: 2000,
        poll_interval_ms: 50,
    }
}

fn latent(latency_ms: u64) -> SimulatedPage {
    SimulatedPage::new(SimulatedConfig {
        latency_ms,
        ..Default::default()
    })
}

fn seeded(titles: &[&str], config: SimulatedConfig) -> SimulatedPage {
    SimulatedPage::new(SimulatedConfig {
        seed: titles.iter().map(|t| ObservedTask::new(*t, false)).collect(),
        ..config
    })
}

fn titles(tasks: &[ObservedTask]) -> Vec<&str> {
    tasks.iter().map(|t| t.title.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn immediate_read_misses_latent_update_but_settle_waits() {
    let mut page = latent(300);
    page.navigate(URL).await.unwrap();
    page.type_text(selectors::NEW_TODO, "milk").await.unwrap();
    page.press_key(keys::ENTER).await.unwrap();

    assert_eq!(page.count(selectors::ITEMS).await.unwrap(), 0);

    let waited = settle(&mut page, &Probe::count(selectors::ITEMS, 1), &settle_config())
        .await
        .unwrap();
    assert!(waited >= Duration::from_millis(300));
    assert_eq!(page.count(selectors::ITEMS).await.unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn settle_timeout_reports_expected_and_observed() {
    let mut page = latent(0);
    page.navigate(URL).await.unwrap();

    let config = SettleConfig {
        timeout_ms: 400,
        poll_interval_ms: 50,
    };
    let err = settle(&mut page, &Probe::count(selectors::ITEMS, 3), &config)
        .await
        .unwrap_err();

    match err {
        E2eError::SettleTimeout {
            expected,
            observed,
            elapsed_ms,
            ..
        } => {
            assert_eq!(expected, "3");
            assert_eq!(observed, "0");
            assert!(elapsed_ms >= 400);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn create_increases_visible_count_by_exactly_one() {
    let mut page = latent(250);
    let handle = page.handle();
    let mut session = Session::new(&mut page, URL, settle_config());
    session.navigate(None).await.unwrap();

    session.create("first").await.unwrap();
    let before = session.oracle().len();
    session.create("TaskCreateNewTaskCheck").await.unwrap();

    assert_eq!(session.oracle().len(), before + 1);
    session.expect_count(before + 1).await.unwrap();
    session
        .expect_presence("TaskCreateNewTaskCheck", true)
        .await
        .unwrap();
    assert_eq!(handle.stored().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn create_rejects_blank_title_without_touching_page() {
    let mut page = latent(0);
    let handle = page.handle();
    let mut session = Session::new(&mut page, URL, settle_config());
    session.navigate(None).await.unwrap();

    let err = session.create("   ").await.unwrap_err();
    assert!(matches!(err, E2eError::Model(_)));
    assert!(handle.stored().is_empty());
}

#[tokio::test(start_paused = true)]
async fn toggle_is_self_inverse_including_marker() {
    let mut page = latent(200);
    {
        let mut session = Session::new(&mut page, URL, settle_config());
        session.navigate(None).await.unwrap();
        session.create("TaskToToggle").await.unwrap();
        session.expect_completed("TaskToToggle", false).await.unwrap();

        assert!(session.toggle("TaskToToggle").await.unwrap());
        session.expect_completed("TaskToToggle", true).await.unwrap();

        assert!(!session.toggle("TaskToToggle").await.unwrap());
        session.expect_completed("TaskToToggle", false).await.unwrap();
    }

    let class = page
        .attribute_of(&selectors::item(0), "class")
        .await
        .unwrap()
        .unwrap_or_default();
    assert!(!class.split_whitespace().any(|c| c == "completed"));
}

#[test_case(EditGesture::Enter ; "enter")]
#[test_case(EditGesture::Tab ; "tab")]
#[test_case(EditGesture::ClickOutside ; "click outside")]
#[tokio::test(start_paused = true)]
async fn edit_commit_gestures_rename_exactly_once(gesture: EditGesture) {
    let mut page = latent(150);
    let handle = page.handle();
    let mut session = Session::new(&mut page, URL, settle_config());
    session.navigate(None).await.unwrap();

    // The second title contains the first; addressing must not confuse them
    session.create("Task to Edit").await.unwrap();
    session.create("Task to Edit by Tab").await.unwrap();

    session
        .edit("Task to Edit", "Edited Task", gesture)
        .await
        .unwrap();

    session
        .expect_titles(&["Edited Task".to_string(), "Task to Edit by Tab".to_string()])
        .await
        .unwrap();
    session.expect_presence("Task to Edit", false).await.unwrap();

    let stored = handle.stored();
    assert_eq!(stored.iter().filter(|t| t.title == "Edited Task").count(), 1);
    assert_eq!(session.state(), SessionState::Ready);
}

#[tokio::test(start_paused = true)]
async fn cancel_edit_is_a_no_op() {
    let mut page = latent(150);
    let handle = page.handle();
    let mut session = Session::new(&mut page, URL, settle_config());
    session.navigate(None).await.unwrap();
    session.create("Task to Cancel Edit by Esc").await.unwrap();
    let before = handle.stored();

    session
        .cancel_edit("Task to Cancel Edit by Esc", "Edited Task by Esc")
        .await
        .unwrap();

    assert_eq!(handle.stored(), before);
    session
        .expect_presence("Edited Task by Esc", false)
        .await
        .unwrap();
    assert!(session.oracle().open_edit().is_none());
}

#[tokio::test(start_paused = true)]
async fn committing_an_empty_edit_deletes_the_task() {
    let mut page = latent(100);
    let mut session = Session::new(&mut page, URL, settle_config());
    session.navigate(None).await.unwrap();
    session.create("short lived").await.unwrap();
    session.create("keeper").await.unwrap();

    session
        .edit("short lived", "   ", EditGesture::Enter)
        .await
        .unwrap();
    session
        .expect_titles(&["keeper".to_string()])
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn ignored_edit_is_reported_as_assertion_failure() {
    let mut page = SimulatedPage::new(SimulatedConfig {
        latency_ms: 100,
        ignore_edits: true,
        ..Default::default()
    });
    let mut session = Session::new(&mut page, URL, settle_config());
    session.navigate(None).await.unwrap();
    session.create("Task to Edit").await.unwrap();

    let err = session
        .edit("Task to Edit", "Edited Task", EditGesture::Enter)
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::AssertionFailed { .. }), "{}", err);
    assert_eq!(session.state(), SessionState::Failed);
}

#[test_case(0 ; "empty")]
#[test_case(1 ; "one")]
#[test_case(7 ; "seven")]
#[tokio::test(start_paused = true)]
async fn delete_all_reaches_zero(n: usize) {
    let owned: Vec<String> = (0..n).map(|i| format!("task {}", i)).collect();
    let seed: Vec<&str> = owned.iter().map(String::as_str).collect();
    let mut page = seeded(
        &seed,
        SimulatedConfig {
            latency_ms: 120,
            ..Default::default()
        },
    );
    let handle = page.handle();
    let mut session = Session::new(&mut page, URL, settle_config());
    session.navigate(None).await.unwrap();
    assert_eq!(session.oracle().len(), n);

    session.delete_all().await.unwrap();
    session.expect_count(0).await.unwrap();
    assert!(handle.stored().is_empty());
    assert!(session.oracle().is_empty());
}

#[tokio::test(start_paused = true)]
async fn delete_all_terminates_when_deletes_are_ignored() {
    let mut page = seeded(
        &["a", "b", "c"],
        SimulatedConfig {
            ignore_deletes: true,
            ..Default::default()
        },
    );
    let handle = page.handle();
    let config = SettleConfig {
        timeout_ms: 500,
        poll_interval_ms: 50,
    };
    let mut session = Session::new(&mut page, URL, config);
    session.navigate(None).await.unwrap();

    let err = session.delete_all().await.unwrap_err();
    assert!(err.is_settle_timeout(), "{}", err);
    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(handle.stored().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn best_effort_delete_records_soft_failure_and_recovers() {
    let mut page = SimulatedPage::new(SimulatedConfig {
        ignore_deletes: true,
        ..Default::default()
    });
    let config = SettleConfig {
        timeout_ms: 300,
        poll_interval_ms: 50,
    };
    let mut session = Session::new(&mut page, URL, config);
    session.navigate(None).await.unwrap();
    session.create("TaskCreateNewTaskCheck").await.unwrap();

    session
        .execute(&Step::Delete {
            title: "TaskCreateNewTaskCheck".into(),
            best_effort: true,
        })
        .await
        .unwrap();
    assert_eq!(session.soft_failures().len(), 1);
    assert_eq!(session.state(), SessionState::Ready);
    session
        .expect_presence("TaskCreateNewTaskCheck", true)
        .await
        .unwrap();

    let err = session
        .execute(&Step::Delete {
            title: "TaskCreateNewTaskCheck".into(),
            best_effort: false,
        })
        .await
        .unwrap_err();
    assert!(err.is_settle_timeout());
    assert_eq!(session.soft_failures().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn completion_status_is_reflected_by_filters() {
    let mut page = latent(180);
    let mut session = Session::new(&mut page, URL, settle_config());
    session.navigate(None).await.unwrap();

    session.create("apple").await.unwrap();
    session.create("banana and strawberry").await.unwrap();
    session.toggle("apple").await.unwrap();

    session.filter_view(FilterKind::Completed).await.unwrap();
    session
        .expect_titles(&["apple".to_string()])
        .await
        .unwrap();

    session.filter_view(FilterKind::Active).await.unwrap();
    session
        .expect_titles(&["banana and strawberry".to_string()])
        .await
        .unwrap();

    session.filter_view(FilterKind::All).await.unwrap();
    session.expect_count(2).await.unwrap();
    assert_eq!(session.state(), SessionState::Ready);
}

#[tokio::test(start_paused = true)]
async fn filter_round_trip_reproduces_visible_set() {
    let mut page = latent(120);
    let mut session = Session::new(&mut page, URL, settle_config());
    session.navigate(None).await.unwrap();
    for title in ["Task 1", "Task 2", "Task 3"] {
        session.create(title).await.unwrap();
    }
    session.toggle("Task 2").await.unwrap();
    session.filter_view(FilterKind::Active).await.unwrap();

    for via in FilterKind::ALL {
        session.filter_round_trip(via).await.unwrap();
        assert_eq!(session.filter(), FilterKind::Active);
    }
    session.expect_count(2).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn toggling_out_of_a_filtered_view_hides_the_task() {
    let mut page = latent(120);
    let mut session = Session::new(&mut page, URL, settle_config());
    session.navigate(None).await.unwrap();
    session.create("a").await.unwrap();
    session.create("b").await.unwrap();
    session.filter_view(FilterKind::Active).await.unwrap();

    session.toggle("a").await.unwrap();
    session.expect_titles(&["b".to_string()]).await.unwrap();

    let err = session.toggle("a").await.unwrap_err();
    assert!(matches!(err, E2eError::ElementNotFound(_)));
}

#[tokio::test(start_paused = true)]
async fn reload_keeps_tasks() {
    let mut page = latent(100);
    let mut session = Session::new(&mut page, URL, settle_config());
    session.navigate(None).await.unwrap();
    session.create("apple").await.unwrap();
    session.create("banana and strawberry").await.unwrap();

    session.reload().await.unwrap();
    session.expect_count(2).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn navigate_adopts_persisted_tasks() {
    let mut page = SimulatedPage::new(SimulatedConfig {
        seed: vec![
            ObservedTask::new("done", true),
            ObservedTask::new("open", false),
        ],
        ..Default::default()
    });
    let mut session = Session::new(&mut page, URL, settle_config());
    session.navigate(None).await.unwrap();

    let snapshot = session.oracle().snapshot(FilterKind::All);
    assert_eq!(titles(&snapshot), vec!["done", "open"]);
    assert!(snapshot[0].completed);
    assert_eq!(session.inspect().await.unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn unreachable_entry_view_is_fatal() {
    let mut page = SimulatedPage::new(SimulatedConfig {
        fail_navigation: true,
        ..Default::default()
    });
    let mut session = Session::new(&mut page, URL, settle_config());

    let err = session.navigate(None).await.unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(session.state(), SessionState::Failed);
}

#[tokio::test(start_paused = true)]
async fn intentional_failure_step_fails() {
    let mut page = latent(0);
    let mut session = Session::new(&mut page, URL, settle_config());
    session.navigate(None).await.unwrap();

    let err = session
        .execute(&Step::Fail {
            reason: "Unknown test encountered.".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::IntentionalFailure(_)));
    assert!(!err.is_fatal());
}

#[tokio::test(start_paused = true)]
async fn recovery_after_soft_failure_keeps_active_filter() {
    let mut page = SimulatedPage::new(SimulatedConfig {
        ignore_deletes: true,
        seed: vec![ObservedTask::new("a", false), ObservedTask::new("b", true)],
        ..Default::default()
    });
    let config = SettleConfig {
        timeout_ms: 300,
        poll_interval_ms: 50,
    };
    let mut session = Session::new(&mut page, URL, config);
    session.navigate(None).await.unwrap();
    session.filter_view(FilterKind::Active).await.unwrap();

    session
        .execute(&Step::Delete {
            title: "a".into(),
            best_effort: true,
        })
        .await
        .unwrap();

    assert_eq!(session.soft_failures().len(), 1);
    assert_eq!(session.filter(), FilterKind::Active);
    assert_eq!(session.state(), SessionState::Filtered(FilterKind::Active));
    session.expect_count(1).await.unwrap();
    session.expect_titles(&["a".to_string()]).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn divergence_from_model_is_kept_as_soft_failure() {
    let mut page = latent(0);
    let handle = page.handle();
    let config = SettleConfig {
        timeout_ms: 300,
        poll_interval_ms: 50,
    };
    let mut session = Session::new(&mut page, URL, config);
    session.navigate(None).await.unwrap();
    session.create("a").await.unwrap();

    handle.insert_external("written elsewhere");
    session.expect_count(2).await.unwrap();

    assert_eq!(session.soft_failures().len(), 1);
    assert!(session.soft_failures()[0].contains("diverged"));
}
