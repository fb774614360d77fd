//! End-to-end runs of the built-in scenarios against the mock browser
//!
//! Each test builds a small in-memory copy of the app's screens, runs a
//! scenario through the real runner and checks the outcome, the screenshots
//! on disk and what the session did.

use std::path::{Path, PathBuf};

use smoke::browser::mock::{MockElement, MockEvent, MockFault, MockLauncher, MockPage, MockSite};
use smoke::browser::Locator;
use smoke::scenario::builtin;
use smoke::{Config, Outcome, Runner, RunnerOptions, Scenario, Step};

const BASE: &str = "http://localhost:8081";
const HOME: &str = "http://localhost:8081/home";
const STORE: &str = "http://localhost:8081/store/1";
const RESERVE: &str = "http://localhost:8081/reserve/1";
const DONE: &str = "http://localhost:8081/reserve/1/done";

/// Test context with a private screenshot directory
struct TestContext {
    _temp: tempfile::TempDir,
    screenshot_dir: PathBuf,
    config: Config,
}

impl TestContext {
    fn new() -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let screenshot_dir = temp.path().join("tests").join("screenshots");

        let mut config = Config::default();
        config.artifacts.screenshot_dir = screenshot_dir.clone();
        config.timeouts.classify_secs = 0;
        config.timeouts.poll_interval_ms = 10;

        Self {
            _temp: temp,
            screenshot_dir,
            config,
        }
    }

    fn runner(&self, launcher: MockLauncher) -> Runner<MockLauncher> {
        Runner::new(launcher, RunnerOptions::from_config(&self.config, false))
    }

    fn shot(&self, name: &str) -> PathBuf {
        self.screenshot_dir.join(name)
    }
}

fn login_page(login_leads_to: Option<&str>) -> MockPage {
    let button = MockElement::button("로그인");
    let button = match login_leads_to {
        Some(url) => button.navigates_to(url),
        None => button,
    };
    MockPage::new("Save It")
        .element(MockElement::input("이메일"))
        .element(MockElement::input("비밀번호"))
        .element(button)
}

fn home_page(with_store: bool) -> MockPage {
    let page = MockPage::new("Save It").text("💚 Save It").text("추천순");
    if with_store {
        page.element(
            MockElement::button("동네빵집 ⭐ 4.8 리뷰 12")
                .test_id("store-card")
                .navigates_to(STORE),
        )
    } else {
        page.text("조건에 맞는 업체가 없습니다.")
    }
}

fn full_site() -> MockSite {
    MockSite::new()
        .page(BASE, login_page(Some(HOME)))
        .page(HOME, home_page(true))
        .page(
            STORE,
            MockPage::new("동네빵집")
                .text("할인 상품 (1)")
                .element(MockElement::button("예약하기 →").navigates_to(RESERVE)),
        )
        .page(
            RESERVE,
            MockPage::new("예약하기")
                .text("수량")
                .element(MockElement::button("예약하기").test_id("reserve-button").navigates_to(DONE)),
        )
        .page(DONE, MockPage::new("예약하기").text("예약 완료!\n예약번호: R-0001"))
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("screenshot dir should exist")
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test(start_paused = true)]
async fn test_login_success() {
    let ctx = TestContext::new();
    let launcher = MockLauncher::new(full_site());
    let journal = launcher.journal();

    let scenario = builtin::login(&ctx.config).unwrap();
    let report = ctx.runner(launcher).run(&scenario).await;

    assert_eq!(report.outcome, Outcome::Success);
    assert_eq!(report.error, None);
    assert_eq!(report.steps_run, report.steps_total);
    assert_eq!(
        file_names(&ctx.screenshot_dir),
        vec!["01_homepage.png", "02_form_filled.png", "03_after_login.png"]
    );
    assert_eq!(journal.filled(), vec!["test@test.com", "test1234"]);
    assert!(journal.was_closed());
}

#[tokio::test(start_paused = true)]
async fn test_login_rejected_with_error_text() {
    let ctx = TestContext::new();
    let rejected = "http://localhost:8081/?error=1";
    let site = MockSite::new()
        .page(BASE, login_page(Some(rejected)))
        .page(
            rejected,
            login_page(None).text("로그인 실패\n이메일 또는 비밀번호가 올바르지 않습니다."),
        );
    let launcher = MockLauncher::new(site);
    let journal = launcher.journal();

    let scenario = builtin::login(&ctx.config).unwrap();
    let report = ctx.runner(launcher).run(&scenario).await;

    assert_eq!(report.outcome, Outcome::Failure);
    assert_eq!(report.error, None);
    assert!(ctx.shot("03_after_login.png").exists());
    assert!(journal.was_closed());
}

#[tokio::test(start_paused = true)]
async fn test_login_rejected_silently_is_not_success() {
    let ctx = TestContext::new();
    // The login button does nothing; the form just stays on screen
    let site = MockSite::new().page(BASE, login_page(None));
    let launcher = MockLauncher::new(site);

    let scenario = builtin::login(&ctx.config).unwrap();
    let report = ctx.runner(launcher).run(&scenario).await;

    assert_ne!(report.outcome, Outcome::Success);
    assert_eq!(report.outcome, Outcome::Failure);
    assert!(!report.screenshots.is_empty());
    for path in &report.screenshots {
        assert!(path.exists(), "missing {}", path.display());
    }
}

#[tokio::test]
async fn test_refused_session_still_reports() {
    let ctx = TestContext::new();

    let scenario = builtin::login(&ctx.config).unwrap();
    let report = ctx.runner(MockLauncher::refusing()).run(&scenario).await;

    assert_eq!(report.outcome, Outcome::Failure);
    assert_eq!(report.steps_run, 0);
    assert!(report.error.unwrap().contains("connection refused"));
    assert!(ctx.screenshot_dir.is_dir());
}

#[tokio::test(start_paused = true)]
async fn test_step_error_captures_diagnostic_and_closes() {
    let ctx = TestContext::new();
    let site = full_site().fault(MockFault::ClickError("로그인".to_string()));
    let launcher = MockLauncher::new(site);
    let journal = launcher.journal();

    let scenario = builtin::login(&ctx.config).unwrap();
    let report = ctx.runner(launcher).run(&scenario).await;

    assert_eq!(report.outcome, Outcome::Failure);
    assert!(report.error.unwrap().contains("not interactable"));
    assert!(ctx.shot("error.png").exists());
    assert!(ctx.shot("02_form_filled.png").exists());
    assert!(!ctx.shot("03_after_login.png").exists());
    assert!(report.steps_run < report.steps_total);
    assert!(journal.was_closed());
}

#[tokio::test(start_paused = true)]
async fn test_panic_inside_step_is_contained() {
    let ctx = TestContext::new();
    let site = full_site().fault(MockFault::ClickPanic("로그인".to_string()));
    let launcher = MockLauncher::new(site);
    let journal = launcher.journal();

    let scenario = builtin::login(&ctx.config).unwrap();
    let report = ctx.runner(launcher).run(&scenario).await;

    assert_eq!(report.outcome, Outcome::Failure);
    assert!(report.error.unwrap().starts_with("panicked"));
    assert!(ctx.shot("error.png").exists());
    assert!(journal.was_closed());
}

#[tokio::test]
async fn test_unreachable_app_is_failure_with_directory() {
    let ctx = TestContext::new();
    let mut config = ctx.config.clone();
    config.target.base_url = "http://localhost:9999".to_string();
    let launcher = MockLauncher::new(full_site());
    let journal = launcher.journal();

    let scenario = builtin::login(&config).unwrap();
    let report = ctx.runner(launcher).run(&scenario).await;

    assert_eq!(report.outcome, Outcome::Failure);
    assert!(report.error.unwrap().contains("http://localhost:9999"));
    assert!(ctx.screenshot_dir.is_dir());
    assert!(journal.was_closed());
}

#[tokio::test(start_paused = true)]
async fn test_reservation_success() {
    let ctx = TestContext::new();
    let launcher = MockLauncher::new(full_site());
    let journal = launcher.journal();

    let scenario = builtin::reservation(&ctx.config).unwrap();
    let report = ctx.runner(launcher).run(&scenario).await;

    assert_eq!(report.outcome, Outcome::Success, "warnings: {:?}", report.warnings);
    assert_eq!(report.steps_run, report.steps_total);
    assert_eq!(
        file_names(&ctx.screenshot_dir),
        vec![
            "reservation_01_list.png",
            "reservation_02_detail.png",
            "reservation_03_confirm.png",
            "reservation_04_result.png",
        ]
    );

    let clicks: Vec<Locator> = journal
        .events()
        .into_iter()
        .filter_map(|e| match e {
            MockEvent::Click(locator) => Some(locator),
            _ => None,
        })
        .collect();
    assert_eq!(
        clicks,
        vec![
            Locator::Text("로그인".into()),
            Locator::TestId("store-card".into()),
            Locator::TextContains("예약하기".into()),
            Locator::TestId("reserve-button".into()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_reservation_with_no_stores_is_indeterminate() {
    let ctx = TestContext::new();
    let site = MockSite::new()
        .page(BASE, login_page(Some(HOME)))
        .page(HOME, home_page(false));
    let launcher = MockLauncher::new(site);
    let journal = launcher.journal();

    let scenario = builtin::reservation(&ctx.config).unwrap();
    let report = ctx.runner(launcher).run(&scenario).await;

    assert_eq!(report.outcome, Outcome::Indeterminate);
    assert_eq!(report.error, None);
    assert_eq!(report.steps_run, report.steps_total);
    assert!(report.warnings.iter().any(|w| w.contains("store-card")));
    assert!(ctx.shot("reservation_04_result.png").exists());
    assert!(journal.was_closed());
}

#[tokio::test(start_paused = true)]
async fn test_reservation_stops_after_failed_login() {
    let ctx = TestContext::new();
    let site = MockSite::new().page(BASE, login_page(None)).page(HOME, home_page(true));
    let launcher = MockLauncher::new(site);
    let journal = launcher.journal();

    let scenario = builtin::reservation(&ctx.config).unwrap();
    let login_steps = builtin::login(&ctx.config)
        .unwrap()
        .steps
        .iter()
        .filter(|s| !matches!(s, Step::Screenshot { .. }))
        .count();
    let report = ctx.runner(launcher).run(&scenario).await;

    assert_eq!(report.outcome, Outcome::Failure);
    assert_eq!(report.steps_run, login_steps);
    assert!(report.screenshots.is_empty());
    assert!(!journal
        .events()
        .contains(&MockEvent::Click(Locator::TestId("store-card".into()))));
    assert!(!ctx.shot("reservation_01_list.png").exists());
}

#[tokio::test(start_paused = true)]
async fn test_reservation_rejected_by_server() {
    let ctx = TestContext::new();
    let site = full_site().page(
        DONE,
        MockPage::new("예약하기").text("예약 실패\n재고가 부족합니다. (재고: 0개)"),
    );
    let launcher = MockLauncher::new(site);

    let scenario = builtin::reservation(&ctx.config).unwrap();
    let report = ctx.runner(launcher).run(&scenario).await;

    assert_eq!(report.outcome, Outcome::Failure);
    assert_eq!(report.error, None);
}

const CUSTOM: &str = r#"
name: custom
url: "{{base_url}}/home"
artifact_prefix: custom_
steps:
  - action: click
    locate:
      - test_id: does-not-exist
      - text: 없는 버튼
  - action: fill
    locate:
      - placeholder: 검색
    value: 빵
  - action: screenshot
    label: still_running
"#;

#[tokio::test]
async fn test_missing_elements_do_not_abort() {
    let ctx = TestContext::new();
    let launcher = MockLauncher::new(full_site());

    let mut scenario = Scenario::from_yaml("custom", CUSTOM).unwrap();
    scenario.render(&builtin::vars(&ctx.config));
    let report = ctx.runner(launcher).run(&scenario).await;

    // No classify step: nothing to decide on
    assert_eq!(report.outcome, Outcome::Indeterminate);
    assert_eq!(report.error, None);
    assert_eq!(report.steps_run, 3);
    assert_eq!(report.warnings.len(), 2);
    assert!(ctx.shot("custom_01_still_running.png").exists());
}

#[tokio::test]
async fn test_both_markers_visible_is_failure() {
    let ctx = TestContext::new();
    let site = MockSite::new().page(
        HOME,
        MockPage::new("Save It").text("추천순").text("오류: 네트워크 연결을 확인해주세요"),
    );
    let launcher = MockLauncher::new(site);

    let yaml = r#"
name: markers
url: "http://localhost:8081/home"
steps:
  - action: classify
    success:
      text: [추천순]
    failure:
      text: [오류]
"#;
    let scenario = Scenario::from_yaml("markers", yaml).unwrap();
    let report = ctx.runner(launcher).run(&scenario).await;

    assert_eq!(report.outcome, Outcome::Failure);
}

#[tokio::test(start_paused = true)]
async fn test_lingering_form_beats_success_marker_over_full_window() {
    let mut ctx = TestContext::new();
    ctx.config.timeouts.classify_secs = 5;
    let site = MockSite::new().page(
        HOME,
        MockPage::new("Save It")
            .text("💚 Save It")
            .element(MockElement::input("비밀번호")),
    );
    let launcher = MockLauncher::new(site);

    let yaml = r#"
name: lingering
url: "http://localhost:8081/home"
steps:
  - action: classify
    success:
      text: [Save It]
    failure:
      elements:
        - placeholder: 비밀번호
"#;
    let scenario = Scenario::from_yaml("lingering", yaml).unwrap();
    let report = ctx.runner(launcher).run(&scenario).await;

    assert_eq!(report.outcome, Outcome::Failure);
}

#[tokio::test(start_paused = true)]
async fn test_login_success_with_default_window() {
    let mut ctx = TestContext::new();
    ctx.config.timeouts.classify_secs = 5;
    let launcher = MockLauncher::new(full_site());

    let scenario = builtin::login(&ctx.config).unwrap();
    let report = ctx.runner(launcher).run(&scenario).await;

    assert_eq!(report.outcome, Outcome::Success);
}

#[tokio::test]
async fn test_busy_network_is_a_warning() {
    let ctx = TestContext::new();
    let site = MockSite::new().page(HOME, home_page(false).busy());
    let launcher = MockLauncher::new(site);

    let yaml = r#"
name: busy
url: "http://localhost:8081/home"
steps:
  - action: classify
    success:
      text: [추천순]
"#;
    let scenario = Scenario::from_yaml("busy", yaml).unwrap();
    let report = ctx.runner(launcher).run(&scenario).await;

    assert_eq!(report.outcome, Outcome::Success);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("network"));
}

#[tokio::test]
async fn test_scenario_file_round_trip_through_load() {
    let ctx = TestContext::new();
    let path = ctx.screenshot_dir.parent().unwrap().join("custom.yaml");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, CUSTOM).unwrap();

    let scenario = Scenario::load(&path, &builtin::vars(&ctx.config)).unwrap();
    assert_eq!(scenario.url.as_deref(), Some(HOME));

    let report = ctx.runner(MockLauncher::new(full_site())).run(&scenario).await;
    assert_eq!(report.name, "custom");
    assert_eq!(report.error, None);
}
