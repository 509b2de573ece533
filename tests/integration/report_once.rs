use predicates::prelude::*;
use serde_json::{json, Value};
use test_support::{cmd_bin, read_fixture_json, StubServer};

const ISSUES_URL: &str = "https://team.coding.net/p/demo/bug-tracking";
const NOW: &str = "2024-01-08T09:30:00";

// Members and the first issue page come from fixtures; later pages are empty.
fn tracker_stub(webhook_status: u16) -> StubServer {
  let members: Value = read_fixture_json("team_members.json");
  let page: Value = read_fixture_json("issue_list_page.json");

  StubServer::start(move |req| {
    if req.target.contains("action=DescribeTeamMembers") {
      return (200, members.to_string());
    }
    if req.target.contains("action=DescribeIssueList") {
      if req.json()["Offset"] == "0" {
        return (200, page.to_string());
      }
      return (200, json!({ "Response": { "IssueList": [] } }).to_string());
    }
    if req.target.starts_with("/webhook") {
      return (webhook_status, r#"{"errcode":0,"errmsg":"ok"}"#.to_string());
    }
    (404, "{}".to_string())
  })
}

fn base_args(server: &StubServer) -> Vec<String> {
  vec![
    "--once".into(),
    "--api-url".into(),
    server.url("/open-api"),
    "--token".into(),
    "test-token".into(),
    "--project".into(),
    "demo".into(),
    "--issues-url".into(),
    ISSUES_URL.into(),
    "--now-override".into(),
    NOW.into(),
  ]
}

fn conditions(req: &test_support::RecordedRequest) -> Vec<(String, String)> {
  req.json()["Conditions"]
    .as_array()
    .unwrap()
    .iter()
    .map(|c| {
      (
        c["Key"].as_str().unwrap().to_string(),
        c["Value"].as_str().unwrap().to_string(),
      )
    })
    .collect()
}

#[test]
fn once_posts_previous_week_digest() {
  let server = tracker_stub(200);
  let mut args = base_args(&server);
  args.extend(["--webhook-url".into(), server.url("/webhook/send?key=secret-key")]);

  cmd_bin("coding-defect-report").args(&args).assert().success();

  assert_eq!(server.requests_to("action=DescribeTeamMembers").len(), 1);

  let pages = server.requests_to("action=DescribeIssueList");
  assert_eq!(pages.len(), 2, "second page is empty and ends the listing");
  assert_eq!(pages[0].method, "POST");
  assert_eq!(pages[0].header("Authorization"), Some("Bearer test-token"));

  let first = pages[0].json();
  assert_eq!(first["ProjectName"], "demo");
  assert_eq!(first["IssueType"], "DEFECT");
  assert_eq!(first["Limit"], "10");
  assert_eq!(first["SortKey"], "CODE");
  assert_eq!(first["SortValue"], "DESC");
  assert_eq!(
    conditions(&pages[0]),
    vec![
      ("ASSIGNEE".to_string(), "9238399,9238388".to_string()),
      ("CREATED_AT".to_string(), "2024-01-01_2024-01-07".to_string()),
    ]
  );
  assert_eq!(pages[1].json()["Offset"], "10");

  let hooks = server.requests_to("/webhook");
  assert_eq!(hooks.len(), 1);
  let body = hooks[0].json();
  assert_eq!(body["msgtype"], "markdown");

  let content = body["markdown"]["content"].as_str().unwrap();
  assert!(content.starts_with("**🚨 每周缺陷战报 | 2024-01-08**"));
  assert!(content.contains("`🔥紧急` [BUG-1 Login fails](https://team.coding.net/p/demo/bug-tracking/issues/BUG-1)"));
  assert!(content.contains("@Alice"));
  assert!(content.contains("`⚠️高` [57 Export button misaligned]"));
  assert!(content.contains("@未分配"));
  assert!(content.contains("未知状态"));
}

#[test]
fn dry_run_prints_instead_of_posting() {
  let server = tracker_stub(200);

  cmd_bin("coding-defect-report")
    .args(base_args(&server))
    .arg("--dry-run")
    .assert()
    .success()
    .stdout(predicate::str::contains("每周缺陷战报 | 2024-01-08").and(predicate::str::contains("[BUG-1 Login fails]")));

  assert!(server.requests_to("/webhook").is_empty());
}

#[test]
fn member_option_narrows_assignee_condition() {
  let server = tracker_stub(200);

  cmd_bin("coding-defect-report")
    .args(base_args(&server))
    .args(["--dry-run", "--member", "Bob"])
    .assert()
    .success();

  let pages = server.requests_to("action=DescribeIssueList");
  assert_eq!(conditions(&pages[0])[0].1, "9238388");
}

#[test]
fn non_integer_weeks_ago_reports_last_week() {
  let server = tracker_stub(200);

  cmd_bin("coding-defect-report")
    .env("RUST_LOG", "info")
    .args(base_args(&server))
    .args(["--dry-run", "--weeks-ago", "soon"])
    .assert()
    .success()
    .stderr(predicate::str::contains("not an integer"));

  let pages = server.requests_to("action=DescribeIssueList");
  assert_eq!(conditions(&pages[0])[1].1, "2024-01-01_2024-01-07");
}

#[test]
fn tracker_error_envelope_fails_the_run() {
  let server = StubServer::start(|req| {
    if req.target.contains("action=DescribeTeamMembers") {
      return (
        200,
        json!({ "Response": { "Data": { "TeamMembers": [{ "Id": 1, "Name": "Alice" }] } } }).to_string(),
      );
    }
    (
      200,
      json!({ "Response": { "Error": { "Code": "AuthFailure", "Message": "invalid token" } } }).to_string(),
    )
  });

  cmd_bin("coding-defect-report")
    .args(base_args(&server))
    .arg("--dry-run")
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid token"));
}

#[test]
fn webhook_failure_does_not_leak_key() {
  let server = tracker_stub(500);
  let mut args = base_args(&server);
  args.extend(["--webhook-url".into(), server.url("/webhook/send?key=secret-key")]);

  cmd_bin("coding-defect-report")
    .args(&args)
    .assert()
    .failure()
    .stderr(predicate::str::contains("HTTP 500").and(predicate::str::contains("secret-key").not()));

  assert_eq!(server.requests_to("/webhook").len(), 1);
}

#[test]
fn truncated_team_roster_is_warned_about() {
  let server = StubServer::start(|req| {
    if req.target.contains("action=DescribeTeamMembers") {
      return (
        200,
        json!({ "Response": { "Data": { "TotalCount": 3, "TeamMembers": [
          { "Id": 1, "Name": "Alice" },
          { "Id": 2, "Name": "Bob" }
        ] } } })
        .to_string(),
      );
    }
    (200, json!({ "Response": { "Error": null, "IssueList": [] } }).to_string())
  });

  cmd_bin("coding-defect-report")
    .env("RUST_LOG", "info")
    .args(base_args(&server))
    .args(["--dry-run", "--member-page-size", "2"])
    .assert()
    .success()
    .stderr(predicate::str::contains("raise --member-page-size"));

  let pages = server.requests_to("action=DescribeIssueList");
  assert_eq!(conditions(&pages[0])[0].1, "1,2");
}
