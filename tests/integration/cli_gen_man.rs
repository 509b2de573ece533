#[test]
fn gen_man_emits_troff() {
  let mut cmd = test_support::cmd_bin("coding-defect-report");
  let out = cmd.arg("--gen-man").output().unwrap();
  assert!(out.status.success());
  let page = String::from_utf8_lossy(&out.stdout);
  assert!(page.contains(".TH"));
  assert!(page.contains("coding\\-defect\\-report") || page.contains("coding-defect-report"));
}
