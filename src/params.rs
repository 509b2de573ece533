use crate::cli::EffectiveConfig;
use crate::pipeline::ReportParams;

pub fn build_report_params(cfg: &EffectiveConfig) -> ReportParams {
  ReportParams {
    project: cfg.project.clone(),
    issue_type: cfg.issue_type,
    issues_url: cfg.issues_url.clone(),
    members: cfg.members.clone(),
    member_page_size: cfg.member_page_size,
  }
}
